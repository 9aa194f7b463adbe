// tests/model_cache.rs
//
// Single-flight model loading: concurrent first callers share one fetch,
// failures are retried on the next call, a disabled cache means rules only.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use terms_guardian::classify::{ModelCache, ModelSource};

const JSON: &str = r#"{"vocab":{"arbitration":0},"idf":[1.0],"classes":{"ARBITRATION":{"coef":[5.0],"intercept":-1.0}}}"#;

struct CountingSource {
    fetches: AtomicUsize,
    /// Fetches that fail before the source starts answering.
    failures: usize,
}

impl CountingSource {
    fn new(failures: usize) -> Self {
        Self {
            fetches: AtomicUsize::new(0),
            failures,
        }
    }
}

#[async_trait]
impl ModelSource for CountingSource {
    async fn fetch(&self) -> anyhow::Result<String> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        if n < self.failures {
            anyhow::bail!("transient failure #{n}");
        }
        Ok(JSON.to_string())
    }

    fn describe(&self) -> String {
        "counting".into()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_calls_fetch_once() {
    let source = Arc::new(CountingSource::new(0));
    let cache = Arc::new(ModelCache::new(source.clone()));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get().await.expect("model loads") })
        })
        .collect();

    let mut models = Vec::new();
    for h in handles {
        models.push(h.await.expect("task joins"));
    }

    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    assert!(models.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert!(cache.is_loaded());
}

#[tokio::test]
async fn failed_load_is_retried() {
    let source = Arc::new(CountingSource::new(1));
    let cache = ModelCache::new(source.clone());

    assert!(cache.get_or_fallback().await.is_none());
    assert!(!cache.is_loaded());

    assert!(cache.get_or_fallback().await.is_some());
    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);

    // cached from here on
    assert!(cache.get().await.is_ok());
    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn disabled_cache_never_fetches() {
    let cache = ModelCache::disabled();
    assert!(!cache.is_enabled());
    assert!(cache.get_or_fallback().await.is_none());
}
