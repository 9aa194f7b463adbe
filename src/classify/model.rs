//! TF-IDF features + independent per-class logistic regression (one-vs-rest).
//!
//! Asset schema (stable):
//! `{ "vocab": {token: index}, "idf": [f64], "classes": {name: {"coef": [f64], "intercept": f64}} }`

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Linear scores are clamped to this magnitude before `exp`.
pub const LOGIT_CLAMP: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassWeights {
    #[serde(default)]
    pub coef: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseModel {
    pub vocab: HashMap<String, usize>,
    pub idf: Vec<f64>,
    pub classes: BTreeMap<String, ClassWeights>,
}

/// Probabilities for one sentence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentencePrediction {
    pub text: String,
    pub proba: BTreeMap<String, f64>,
}

/// Model tokenization: lowercase, split on anything outside `[a-z0-9]`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn sigmoid(z: f64) -> f64 {
    let z = z.clamp(-LOGIT_CLAMP, LOGIT_CLAMP);
    1.0 / (1.0 + (-z).exp())
}

impl ClauseModel {
    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let model: ClauseModel = serde_json::from_str(raw)
            .map_err(|e| anyhow::anyhow!("clause model JSON is invalid: {e}"))?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.vocab.is_empty() {
            anyhow::bail!("clause model has an empty vocabulary");
        }
        if self.classes.is_empty() {
            anyhow::bail!("clause model defines no classes");
        }
        if let Some(bad) = self.idf.iter().position(|v| !v.is_finite()) {
            anyhow::bail!("clause model idf[{bad}] is not finite");
        }
        for (name, w) in &self.classes {
            if !w.intercept.is_finite() || w.coef.iter().any(|c| !c.is_finite()) {
                anyhow::bail!("clause model class `{name}` has non-finite weights");
            }
        }
        Ok(())
    }

    /// Sparse TF-IDF vector `(index, value)`, sorted by index. OOV tokens are ignored;
    /// a missing idf entry counts as 1.
    pub fn featurize(&self, tokens: &[String]) -> Vec<(usize, f64)> {
        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for t in tokens {
            if let Some(&idx) = self.vocab.get(t) {
                *counts.entry(idx).or_insert(0) += 1;
            }
        }
        let total = tokens.len().max(1) as f64;
        counts
            .into_iter()
            .map(|(idx, c)| {
                let idf = self.idf.get(idx).copied().unwrap_or(1.0);
                (idx, (c as f64 / total) * idf)
            })
            .collect()
    }

    /// Independent probability per class. Missing coefficients count as 0.
    pub fn predict_proba(&self, tokens: &[String]) -> BTreeMap<String, f64> {
        let x = self.featurize(tokens);
        self.classes
            .iter()
            .map(|(name, w)| {
                let z = x.iter().fold(w.intercept, |acc, (i, v)| {
                    acc + w.coef.get(*i).copied().unwrap_or(0.0) * v
                });
                (name.clone(), sigmoid(z))
            })
            .collect()
    }

    pub fn classify_sentences<S: AsRef<str>>(&self, sentences: &[S]) -> Vec<SentencePrediction> {
        sentences
            .iter()
            .map(|s| SentencePrediction {
                text: s.as_ref().to_string(),
                proba: self.predict_proba(&tokenize(s.as_ref())),
            })
            .collect()
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }
}
