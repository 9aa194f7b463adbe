// src/config/reload.rs
//! Shared analyzer handle + dev-only hot reload of `config/analysis.toml`.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

use super::{is_dev_env, AnalysisConfig};
use crate::engine::Analyzer;

pub const ENV_ANALYSIS_HOT_RELOAD: &str = "ANALYSIS_HOT_RELOAD";

/// A threadsafe handle over the current analyzer.
/// Readers clone the inner `Arc` and release the lock before analyzing, so a
/// reload never waits on an in-flight request.
#[derive(Clone)]
pub struct AnalyzerHandle {
    inner: Arc<RwLock<Arc<Analyzer>>>,
}

impl AnalyzerHandle {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(analyzer))),
        }
    }

    pub fn current(&self) -> Arc<Analyzer> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Swap in a new scoring policy. The model cache is carried over.
    pub fn replace_config(&self, cfg: AnalysisConfig) {
        let next = self.current().with_config(cfg);
        match self.inner.write() {
            Ok(mut guard) => *guard = Arc::new(next),
            Err(poisoned) => *poisoned.into_inner() = Arc::new(next),
        }
    }

    /// Parse + validate TOML and swap it in; the old config stays on error.
    pub fn reload_from_str(&self, toml_str: &str) -> anyhow::Result<()> {
        let cfg = AnalysisConfig::from_toml_str(toml_str)?;
        self.replace_config(cfg);
        Ok(())
    }
}

/// ANALYSIS_HOT_RELOAD=1 and a dev environment.
fn hot_reload_enabled() -> bool {
    let want = std::env::var(ENV_ANALYSIS_HOT_RELOAD)
        .ok()
        .is_some_and(|v| v == "1");
    want && is_dev_env()
}

/// Poll `path` mtime every 2s and reload into `handle` on change.
pub fn start_hot_reload_thread(handle: AnalyzerHandle, path: PathBuf) {
    if !hot_reload_enabled() {
        return;
    }
    info!(target: "config", path = %path.display(), "hot reload enabled");

    thread::spawn(move || {
        let poll = Duration::from_secs(2);
        let mut last_mtime: Option<SystemTime> = None;

        loop {
            if let Ok(mtime) = fs::metadata(&path).and_then(|m| m.modified()) {
                let changed = match last_mtime {
                    None => false,
                    Some(prev) => mtime > prev,
                };
                last_mtime = Some(mtime);
                if changed {
                    let result = fs::read_to_string(&path)
                        .map_err(anyhow::Error::from)
                        .and_then(|content| handle.reload_from_str(&content));
                    match result {
                        Ok(()) => info!(target: "config", "analysis config reloaded"),
                        Err(e) => warn!(target: "config", error = %e, "reload rejected; keeping previous config"),
                    }
                }
            }
            thread::sleep(poll);
        }
    });
}
