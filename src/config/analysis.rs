//! Scoring policy: every tunable number the graders and the URI engine use.
//! Loaded from TOML; `Default` mirrors `config/analysis.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::classify::rules::ClauseType;
use crate::grade::{Grade, GradeScale};
use crate::uri::Category;

// --- env defaults & names ---
pub const DEFAULT_ANALYSIS_CONFIG_PATH: &str = "config/analysis.toml";
pub const ENV_ANALYSIS_CONFIG_PATH: &str = "ANALYSIS_CONFIG_PATH";
pub const ENV_ANALYSIS_GUARDRAIL: &str = "ANALYSIS_GUARDRAIL";

/// Weights must sum to 1.0 within this tolerance.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

// parse optional "0"/"1"/"true"/"false" env flag
fn parse_flag_env(raw: Option<String>) -> Option<bool> {
    match raw?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub readability: ReadabilityConfig,
    pub rights: RightsConfig,
    pub uri: UriConfig,
    pub detection: DetectionThresholds,
}

/* ----------------------------
Readability
---------------------------- */

/// `kincaid < below` earns `grade`; bands are checked in order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeBand {
    pub below: f64,
    pub grade: Grade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadabilityConfig {
    pub confidence_saturation_words: f64,
    pub bands: Vec<GradeBand>,
    /// Grade for anything at or above the last band.
    pub fallback: Grade,
}

impl Default for ReadabilityConfig {
    fn default() -> Self {
        let bands = [(6.0, Grade::A), (9.0, Grade::B), (13.0, Grade::C), (16.0, Grade::D)]
            .into_iter()
            .map(|(below, grade)| GradeBand { below, grade })
            .collect();
        Self {
            confidence_saturation_words: 600.0,
            bands,
            fallback: Grade::F,
        }
    }
}

impl ReadabilityConfig {
    pub fn grade_for(&self, kincaid: f64) -> Grade {
        self.bands
            .iter()
            .find(|b| kincaid < b.below)
            .map(|b| b.grade)
            .unwrap_or(self.fallback)
    }
}

/* ----------------------------
Rights rubric
---------------------------- */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RightsConfig {
    pub chunk_size: usize,
    pub normalization_per_words: f64,
    pub no_signal_score: f64,
    pub max_negative: f64,
    pub max_positive: f64,
    pub category_floor: f64,
    pub category_ceiling: f64,
    pub grades: GradeScale,
    /// Clause name → weight. Clauses not listed use their built-in weight.
    pub weights: BTreeMap<String, f64>,
}

impl Default for RightsConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            normalization_per_words: 1000.0,
            no_signal_score: 80.0,
            max_negative: -60.0,
            max_positive: 20.0,
            category_floor: -30.0,
            category_ceiling: 10.0,
            grades: GradeScale::RIGHTS,
            weights: BTreeMap::new(),
        }
    }
}

impl RightsConfig {
    pub fn weight(&self, clause: ClauseType) -> f64 {
        self.weights
            .get(clause.name())
            .copied()
            .unwrap_or_else(|| clause.default_weight())
    }
}

/* ----------------------------
User Rights Index
---------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub clarity_transparency: f64,
    pub data_collection_use: f64,
    pub user_privacy: f64,
    pub content_rights: f64,
    pub dispute_resolution: f64,
    pub terms_changes: f64,
    pub account_management: f64,
    pub algorithmic_decisions: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            clarity_transparency: 0.10,
            data_collection_use: 0.20,
            user_privacy: 0.15,
            content_rights: 0.10,
            dispute_resolution: 0.15,
            terms_changes: 0.10,
            account_management: 0.10,
            algorithmic_decisions: 0.10,
        }
    }
}

impl CategoryWeights {
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::ClarityTransparency => self.clarity_transparency,
            Category::DataCollectionUse => self.data_collection_use,
            Category::UserPrivacy => self.user_privacy,
            Category::ContentRights => self.content_rights,
            Category::DisputeResolution => self.dispute_resolution,
            Category::TermsChanges => self.terms_changes,
            Category::AccountManagement => self.account_management,
            Category::AlgorithmicDecisions => self.algorithmic_decisions,
        }
    }

    pub fn sum(&self) -> f64 {
        Category::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

/// Soft cap on the overall score when critical categories score poorly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardrailConfig {
    pub enabled: bool,
    pub critical_floor: f64,
    pub shortfall_base: f64,
    pub penalty_factor: f64,
    pub avg_margin: f64,
    pub min_margin: f64,
    pub hard_cap: f64,
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            critical_floor: 75.0,
            shortfall_base: 70.0,
            penalty_factor: 0.65,
            avg_margin: 20.0,
            min_margin: 25.0,
            hard_cap: 82.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UriConfig {
    pub neutral_score: f64,
    /// Share kept by the running clarity score when readability is blended in.
    pub clarity_prior: f64,
    /// Share kept by the running score per section contribution.
    pub section_prior: f64,
    /// Share kept by the running score when a model category score is fused in.
    pub ml_prior: f64,
    pub ml_fusion: bool,
    pub ml_min_observations: u32,
    pub sentiment_negative_max: f64,
    pub sentiment_positive_min: f64,
    /// URI share of the combined grade; readability gets the rest.
    pub combined_uri_share: f64,
    pub grades: GradeScale,
    pub weights: CategoryWeights,
    pub guardrail: GuardrailConfig,
}

impl Default for UriConfig {
    fn default() -> Self {
        Self {
            neutral_score: 50.0,
            clarity_prior: 0.7,
            section_prior: 0.8,
            ml_prior: 0.65,
            ml_fusion: true,
            ml_min_observations: 1,
            sentiment_negative_max: 40.0,
            sentiment_positive_min: 85.0,
            combined_uri_share: 0.7,
            grades: GradeScale::URI,
            weights: CategoryWeights::default(),
            guardrail: GuardrailConfig::default(),
        }
    }
}

/* ----------------------------
Detection thresholds
---------------------------- */

/// Legal-term counts that decide how a consumer reacts to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionThresholds {
    pub auto_grade: usize,
    pub notify: usize,
    pub section: usize,
    /// Max word distance between legal terms for the proximity bonus.
    pub proximity: usize,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            auto_grade: 20,
            notify: 10,
            section: 10,
            proximity: 5,
        }
    }
}

/* ----------------------------
Loading + validation
---------------------------- */

fn unit_interval(name: &str, v: f64) -> anyhow::Result<()> {
    if !(0.0..=1.0).contains(&v) {
        anyhow::bail!("{name} must be within 0..=1 (got {v})");
    }
    Ok(())
}

impl AnalysisConfig {
    /// Load from a TOML file. Uses ANALYSIS_CONFIG_PATH or defaults to "config/analysis.toml".
    pub fn from_toml() -> anyhow::Result<Self> {
        let path = Self::resolve_path();
        let content = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!(
                "Failed to read analysis config at {}: {}",
                path.display(),
                e
            )
        })?;

        let mut cfg = Self::from_toml_str(&content)?;

        // optional: toggle the guardrail from env
        if let Some(on) = parse_flag_env(std::env::var(ENV_ANALYSIS_GUARDRAIL).ok()) {
            cfg.uri.guardrail.enabled = on;
        }

        Ok(cfg)
    }

    /// Load from a TOML string and validate.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let cfg: AnalysisConfig = toml::from_str(toml_str)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn resolve_path() -> PathBuf {
        std::env::var(ENV_ANALYSIS_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_ANALYSIS_CONFIG_PATH))
    }

    /// Startup check; a failure here is fatal for the service.
    pub fn validate(&self) -> anyhow::Result<()> {
        // readability
        let r = &self.readability;
        if !(r.confidence_saturation_words > 0.0) {
            anyhow::bail!("readability.confidence_saturation_words must be > 0");
        }
        if r.bands.windows(2).any(|w| !(w[0].below < w[1].below)) {
            anyhow::bail!("readability.bands must be strictly ascending");
        }

        // rights
        let rt = &self.rights;
        if rt.chunk_size == 0 || !(rt.normalization_per_words > 0.0) {
            anyhow::bail!("rights.chunk_size and rights.normalization_per_words must be > 0");
        }
        if rt.max_negative > 0.0 || rt.max_positive < 0.0 {
            anyhow::bail!("rights caps must satisfy max_negative <= 0 <= max_positive");
        }
        if rt.category_floor > rt.category_ceiling {
            anyhow::bail!("rights.category_floor must not exceed rights.category_ceiling");
        }
        if let Some(unknown) = rt.weights.keys().find(|k| ClauseType::from_name(k).is_none()) {
            anyhow::bail!("rights.weights: unknown clause `{unknown}`");
        }
        if rt.weights.values().any(|w| !w.is_finite()) {
            anyhow::bail!("rights.weights must be finite");
        }
        rt.grades.validate("rights")?;

        // uri
        let u = &self.uri;
        let sum = u.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            anyhow::bail!("uri.weights must sum to 1.0 (got {sum})");
        }
        if Category::ALL.iter().any(|c| u.weights.get(*c) < 0.0) {
            anyhow::bail!("uri.weights must be non-negative");
        }
        unit_interval("uri.clarity_prior", u.clarity_prior)?;
        unit_interval("uri.section_prior", u.section_prior)?;
        unit_interval("uri.ml_prior", u.ml_prior)?;
        unit_interval("uri.combined_uri_share", u.combined_uri_share)?;
        unit_interval("uri.guardrail.penalty_factor", u.guardrail.penalty_factor)?;
        if !(0.0..=100.0).contains(&u.neutral_score) {
            anyhow::bail!("uri.neutral_score must be within 0..=100");
        }
        if u.sentiment_negative_max >= u.sentiment_positive_min {
            anyhow::bail!("uri sentiment thresholds overlap");
        }
        u.grades.validate("uri")?;

        // detection
        let d = &self.detection;
        if d.notify > d.auto_grade || d.proximity == 0 {
            anyhow::bail!("detection: notify must not exceed auto_grade and proximity must be > 0");
        }

        Ok(())
    }
}
