//! Clause classification: deterministic rule detectors plus an optional
//! TF-IDF/logistic model whose probabilities are fused with rule evidence.

pub mod loader;
pub mod model;
pub mod rules;

use std::collections::BTreeMap;
use std::sync::Arc;

pub use loader::{
    FileModelSource, HttpModelSource, ModelCache, ModelSource, StaticModelSource,
};
pub use model::{ClauseModel, SentencePrediction};
pub use rules::{count_clauses, ClauseCounts, ClauseType, RiskTier};

use crate::config::ModelConfig;

/// Per-class evidence aggregated over a group of sentences.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClassEvidence {
    /// Highest sentence probability.
    pub max_probability: f64,
    /// Sentences at or above the class threshold.
    pub observations: u32,
}

/// A loaded model plus the fusion policy applied to it.
#[derive(Debug, Clone)]
pub struct ClauseClassifier {
    model: Arc<ClauseModel>,
    fuse_alpha: f64,
    thresholds: BTreeMap<String, f64>,
    default_threshold: f64,
}

impl ClauseClassifier {
    pub fn new(model: Arc<ClauseModel>, cfg: &ModelConfig) -> Self {
        Self {
            model,
            fuse_alpha: cfg.fuse_alpha,
            thresholds: cfg.thresholds.clone(),
            default_threshold: cfg.default_threshold,
        }
    }

    pub fn model(&self) -> &ClauseModel {
        &self.model
    }

    pub fn fuse_alpha(&self) -> f64 {
        self.fuse_alpha
    }

    pub fn threshold_for(&self, class: &str) -> f64 {
        self.thresholds
            .get(class)
            .copied()
            .unwrap_or(self.default_threshold)
    }

    /// `alpha * rule + (1 - alpha) * model`, rule evidence being presence (0/1).
    pub fn fuse(&self, rule_present: bool, model_probability: f64) -> f64 {
        let rule = if rule_present { 1.0 } else { 0.0 };
        self.fuse_alpha * rule + (1.0 - self.fuse_alpha) * model_probability
    }

    /// Classify each sentence and fold the results per class.
    pub fn evidence<S: AsRef<str>>(&self, sentences: &[S]) -> BTreeMap<String, ClassEvidence> {
        let mut out: BTreeMap<String, ClassEvidence> = BTreeMap::new();
        for pred in self.model.classify_sentences(sentences) {
            for (class, p) in pred.proba {
                let threshold = self.threshold_for(&class);
                let e = out.entry(class).or_default();
                e.max_probability = e.max_probability.max(p);
                if p >= threshold {
                    e.observations += 1;
                }
            }
        }
        out
    }
}
