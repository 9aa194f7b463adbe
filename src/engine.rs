//! # Analysis pipeline
//! Extraction → (readability ∥ rights ∥ summary ∥ detection) → per-section
//! rights → User Rights Index → combined grade.
//!
//! Stages are pure functions of the text. The only shared state is the
//! memoized clause model, so one `Analyzer` serves any number of concurrent
//! requests.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::classify::{ClauseClassifier, ModelCache};
use crate::config::{is_dev_env, AnalysisConfig, ModelConfig};
use crate::grade::Grade;
use crate::legal::LegalTextDetector;
use crate::readability::ReadabilityGrader;
use crate::report::{document_id, Report, ReportMetadata};
use crate::rights::{RightsAssessor, SectionRights};
use crate::summarize::Summarizer;
use crate::text::{BasicExtractor, InputKind, TextExtractor};
use crate::uri::{UriInput, UserRightsIndex};

pub const ENV_ANALYSIS_DEV_LOG: &str = "ANALYSIS_DEV_LOG";

/// Inputs above this size are rejected rather than analyzed.
pub const MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;

// Dev logging gate: ANALYSIS_DEV_LOG=1 AND dev env
pub(crate) fn dev_logging_enabled() -> bool {
    std::env::var(ENV_ANALYSIS_DEV_LOG).ok().as_deref() == Some("1") && is_dev_env()
}

pub struct Analyzer {
    config: AnalysisConfig,
    model_cfg: ModelConfig,
    model_cache: Arc<ModelCache>,
    extractor: Arc<dyn TextExtractor>,
    readability: ReadabilityGrader,
    rights: RightsAssessor,
    uri: UserRightsIndex,
    summarizer: Summarizer,
    legal: LegalTextDetector,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("config", &self.config)
            .field("model_cfg", &self.model_cfg)
            .field("model_loaded", &self.model_cache.is_loaded())
            .finish_non_exhaustive()
    }
}

impl Default for Analyzer {
    /// Built-in policy, rules only.
    fn default() -> Self {
        Self::with_model_cache(
            AnalysisConfig::default(),
            ModelConfig::default(),
            Arc::new(ModelCache::disabled()),
        )
    }
}

impl Analyzer {
    pub fn new(config: AnalysisConfig, model_cfg: ModelConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let cache = ModelCache::from_config(&model_cfg)?;
        Ok(Self::with_model_cache(config, model_cfg, Arc::new(cache)))
    }

    /// Config from `ANALYSIS_CONFIG_PATH` / `MODEL_CONFIG_PATH` (or their defaults).
    /// A missing model config means rules only; a broken analysis config is fatal.
    pub fn from_files() -> anyhow::Result<Self> {
        let config = AnalysisConfig::from_toml()?;
        let model_path = ModelConfig::resolve_path();
        let model_cfg = if model_path.exists() {
            ModelConfig::load_from_file(&model_path)?
        } else {
            ModelConfig::default()
        };
        Self::new(config, model_cfg)
    }

    pub fn with_model_cache(
        config: AnalysisConfig,
        model_cfg: ModelConfig,
        model_cache: Arc<ModelCache>,
    ) -> Self {
        Self {
            readability: ReadabilityGrader::new(config.readability.clone()),
            rights: RightsAssessor::new(config.rights.clone()),
            uri: UserRightsIndex::new(config.uri.clone()),
            legal: LegalTextDetector::new(config.detection),
            summarizer: Summarizer::new(),
            extractor: Arc::new(BasicExtractor::new()),
            config,
            model_cfg,
            model_cache,
        }
    }

    /// Swap the text extractor (e.g. a DOM-aware one).
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Same model cache and extractor under a new scoring policy.
    pub fn with_config(&self, config: AnalysisConfig) -> Self {
        Self::with_model_cache(config, self.model_cfg.clone(), self.model_cache.clone())
            .with_extractor(self.extractor.clone())
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn model_cache(&self) -> &Arc<ModelCache> {
        &self.model_cache
    }

    pub fn uri(&self) -> &UserRightsIndex {
        &self.uri
    }

    async fn classifier(&self) -> Option<ClauseClassifier> {
        let model = self.model_cache.get_or_fallback().await?;
        Some(ClauseClassifier::new(model, &self.model_cfg))
    }

    /// Analyze plain text.
    pub async fn analyze(&self, text: &str) -> anyhow::Result<Report> {
        self.analyze_input(text, InputKind::Text).await
    }

    pub async fn analyze_input(&self, input: &str, kind: InputKind) -> anyhow::Result<Report> {
        anyhow::ensure!(
            input.len() <= MAX_INPUT_BYTES,
            "input too large: {} bytes (max {})",
            input.len(),
            MAX_INPUT_BYTES
        );
        let started = Instant::now();

        let extracted = self.extractor.extract(input, kind);
        let text = extracted.text.as_str();

        let (readability, (rights, model_loaded), mut summary, detection) = tokio::join!(
            async { self.readability.grade(text) },
            async {
                let classifier = self.classifier().await;
                (self.rights.analyze(text, classifier.as_ref()), classifier.is_some())
            },
            async { self.summarizer.summarize(text) },
            async { self.legal.analyze(text) },
        );

        // Sections are scored by rules only; the model runs once per document.
        for section in summary.sections.iter_mut() {
            let assessed = self.rights.analyze(&section.original_text, None);
            section.rights = Some(SectionRights::from(&assessed));
        }

        let uri_input = UriInput::from_stages(
            &readability,
            &rights,
            summary.sections.iter().filter_map(|s| s.rights.as_ref()),
        );
        let user_rights_index = self.uri.compute_input(&uri_input);

        let readability_score = (readability.average_grade != Grade::NotApplicable)
            .then_some(readability.normalized_score);
        let uri_score = (!user_rights_index.is_degraded()).then_some(user_rights_index.weighted_score);
        let combined_grade = self.uri.combined_grade(uri_score, readability_score);

        let metadata = ReportMetadata {
            document_id: document_id(text),
            analyzed_at: Utc::now(),
            model_loaded,
            word_count: extracted.word_count,
            legal_term_count: extracted.legal_term_count,
        };

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        metrics::counter!("analysis_runs_total").increment(1);
        metrics::histogram!("analysis_duration_ms").record(elapsed_ms);

        // Never log raw text. Only hashed id + counts.
        if dev_logging_enabled() {
            info!(
                target: "engine",
                id = %metadata.document_id,
                words = metadata.word_count,
                sections = summary.sections.len(),
                uri = user_rights_index.weighted_score,
                grade = %user_rights_index.grade,
                model_loaded,
                elapsed_ms,
                "analyzed"
            );
        } else {
            debug!(target: "engine", id = %metadata.document_id, elapsed_ms, "analyzed");
        }

        Ok(Report {
            readability,
            rights,
            user_rights_index,
            summary,
            detection,
            combined_grade,
            metadata,
        })
    }
}
