//! Model sources + the load-once model cache.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::model::ClauseModel;
use crate::config::{ModelConfig, ModelSourceKind};

/// Fetches the raw model JSON.
#[async_trait]
pub trait ModelSource: Send + Sync {
    async fn fetch(&self) -> anyhow::Result<String>;
    /// Short label for logs.
    fn describe(&self) -> String;
}

pub type DynModelSource = Arc<dyn ModelSource>;

pub struct FileModelSource {
    path: PathBuf,
}

impl FileModelSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ModelSource for FileModelSource {
    async fn fetch(&self) -> anyhow::Result<String> {
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            anyhow::anyhow!("Failed to read clause model at {}: {}", self.path.display(), e)
        })
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

pub struct HttpModelSource {
    http: reqwest::Client,
    url: String,
}

impl HttpModelSource {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ModelSource for HttpModelSource {
    async fn fetch(&self) -> anyhow::Result<String> {
        let resp = self.http.get(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Model fetch failed: {status}");
        }
        Ok(resp.text().await?)
    }

    fn describe(&self) -> String {
        format!("http:{}", self.url)
    }
}

/// In-memory asset (tests, embedded models).
pub struct StaticModelSource {
    json: String,
}

impl StaticModelSource {
    pub fn new(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }
}

#[async_trait]
impl ModelSource for StaticModelSource {
    async fn fetch(&self) -> anyhow::Result<String> {
        Ok(self.json.clone())
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}

/// Build the configured source; `None` when the model is disabled.
pub fn source_from_config(cfg: &ModelConfig) -> anyhow::Result<Option<DynModelSource>> {
    if !cfg.enabled {
        return Ok(None);
    }
    let src: DynModelSource = match cfg.source {
        ModelSourceKind::File => Arc::new(FileModelSource::new(&cfg.location)),
        ModelSourceKind::Http => Arc::new(HttpModelSource::new(&cfg.location)?),
    };
    Ok(Some(src))
}

/// Load-once memoized model. Concurrent first callers wait on one in-flight
/// fetch; a failed load is not cached, so the next call retries.
pub struct ModelCache {
    source: Option<DynModelSource>,
    cell: OnceCell<Arc<ClauseModel>>,
}

impl ModelCache {
    pub fn new(source: DynModelSource) -> Self {
        Self {
            source: Some(source),
            cell: OnceCell::new(),
        }
    }

    /// No model configured: every lookup yields rules-only scoring.
    pub fn disabled() -> Self {
        Self {
            source: None,
            cell: OnceCell::new(),
        }
    }

    /// Already holding a parsed model (no fetch).
    pub fn preloaded(model: ClauseModel) -> Self {
        Self {
            source: None,
            cell: OnceCell::new_with(Some(Arc::new(model))),
        }
    }

    pub fn from_config(cfg: &ModelConfig) -> anyhow::Result<Self> {
        Ok(match source_from_config(cfg)? {
            Some(src) => Self::new(src),
            None => Self::disabled(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.source.is_some() || self.cell.initialized()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn get(&self) -> anyhow::Result<Arc<ClauseModel>> {
        let cached = self
            .cell
            .get_or_try_init(|| async {
                let Some(src) = self.source.as_ref() else {
                    anyhow::bail!("clause model is disabled");
                };
                let raw = src.fetch().await?;
                let model = ClauseModel::from_json_str(&raw)?;
                info!(
                    target: "classify",
                    source = %src.describe(),
                    vocab = model.vocab.len(),
                    classes = model.classes.len(),
                    "clause model loaded"
                );
                Ok::<_, anyhow::Error>(Arc::new(model))
            })
            .await?;
        Ok(cached.clone())
    }

    /// Like `get`, but failures are logged and mapped to `None` (rules-only).
    pub async fn get_or_fallback(&self) -> Option<Arc<ClauseModel>> {
        if !self.is_enabled() {
            return None;
        }
        match self.get().await {
            Ok(m) => Some(m),
            Err(e) => {
                warn!(target: "classify", error = %e, "clause model unavailable; using rules only");
                metrics::counter!("analysis_model_fallback_total").increment(1);
                None
            }
        }
    }
}
