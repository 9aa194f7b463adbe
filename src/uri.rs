//! User Rights Index: eight canonical rights categories scored 0..=100 and
//! folded into one weighted score and grade.
//!
//! Sources are applied in a fixed order. Rights-assessor category scores
//! overwrite, model category scores, readability and per-section scores blend
//! into the running value. `compute` never fails: a malformed analysis yields
//! a degraded result with `error` set.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::config::UriConfig;
use crate::grade::{round2, Grade};
use crate::readability::ReadabilityResult;
use crate::rights::{InternalCategory, InternalCategoryScore, RightsAssessment, SectionRights};

pub const SOURCE_RIGHTS: &str = "rightsAssessor";
pub const SOURCE_ML: &str = "ml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    ClarityTransparency,
    DataCollectionUse,
    UserPrivacy,
    ContentRights,
    DisputeResolution,
    TermsChanges,
    AccountManagement,
    AlgorithmicDecisions,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::ClarityTransparency,
        Category::DataCollectionUse,
        Category::UserPrivacy,
        Category::ContentRights,
        Category::DisputeResolution,
        Category::TermsChanges,
        Category::AccountManagement,
        Category::AlgorithmicDecisions,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::ClarityTransparency => "CLARITY_TRANSPARENCY",
            Category::DataCollectionUse => "DATA_COLLECTION_USE",
            Category::UserPrivacy => "USER_PRIVACY",
            Category::ContentRights => "CONTENT_RIGHTS",
            Category::DisputeResolution => "DISPUTE_RESOLUTION",
            Category::TermsChanges => "TERMS_CHANGES",
            Category::AccountManagement => "ACCOUNT_MANAGEMENT",
            Category::AlgorithmicDecisions => "ALGORITHMIC_DECISIONS",
        }
    }

    /// Categories watched by the high-risk guardrail.
    pub fn is_critical(self) -> bool {
        matches!(
            self,
            Category::DataCollectionUse
                | Category::UserPrivacy
                | Category::DisputeResolution
                | Category::TermsChanges
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub score: f64,
    pub grade: Grade,
    /// -1 concerning, 0 neutral, 1 favourable.
    pub sentiment: i8,
    pub sources: Vec<String>,
    pub signals: BTreeMap<String, f64>,
}

impl CategoryScore {
    fn seed(score: f64, grade: Grade) -> Self {
        Self {
            score,
            grade,
            sentiment: 0,
            sources: Vec::new(),
            signals: BTreeMap::new(),
        }
    }

    fn add_source(&mut self, source: &str) {
        if !self.sources.iter().any(|s| s == source) {
            self.sources.push(source.to_string());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardrailReport {
    pub applied: bool,
    pub penalty: f64,
    pub cap: f64,
    pub base_score: f64,
    pub min_critical_score: f64,
    pub avg_critical_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UriResult {
    pub categories: BTreeMap<Category, CategoryScore>,
    pub weighted_score: f64,
    pub grade: Grade,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardrail: Option<GuardrailReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UriResult {
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedBreakdown {
    pub uri_score: f64,
    pub readability_score: f64,
    pub uri_weight: f64,
    pub readability_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedGrade {
    pub combined_score: f64,
    pub grade: Grade,
    pub breakdown: CombinedBreakdown,
}

/* ----------------------------
Input shapes (JSON boundary)
---------------------------- */

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreInput {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub raw: Option<f64>,
    #[serde(default)]
    pub adjusted: Option<f64>,
}

/// A model category entry: either a bare probability or the detailed form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MlEntry {
    Probability(f64),
    Detailed {
        #[serde(default)]
        probability: Option<f64>,
        #[serde(default)]
        score: Option<f64>,
        #[serde(default)]
        observations: Option<f64>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadabilityInput {
    #[serde(default)]
    pub normalized_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsInput {
    #[serde(default)]
    pub category_scores: BTreeMap<String, ScoreInput>,
    #[serde(default)]
    pub ml_category_scores: BTreeMap<String, MlEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RightsDetailsInput {
    #[serde(default)]
    pub details: Option<DetailsInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRightsInput {
    #[serde(default)]
    pub category_scores: BTreeMap<String, ScoreInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionInput {
    #[serde(default)]
    pub rights: Option<SectionRightsInput>,
}

/// Upstream analysis consumed by the index. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UriInput {
    #[serde(default)]
    pub readability: Option<ReadabilityInput>,
    #[serde(default)]
    pub rights_details: Option<RightsDetailsInput>,
    #[serde(default)]
    pub sections: Option<Vec<SectionInput>>,
}

fn category_inputs(
    scores: &BTreeMap<InternalCategory, InternalCategoryScore>,
) -> BTreeMap<String, ScoreInput> {
    scores
        .iter()
        .map(|(k, v)| {
            (
                k.name().to_string(),
                ScoreInput {
                    score: Some(v.score),
                    raw: Some(v.raw),
                    adjusted: Some(v.adjusted),
                },
            )
        })
        .collect()
}

impl UriInput {
    /// Typed construction from the pipeline's own stage outputs.
    pub fn from_stages<'a>(
        readability: &ReadabilityResult,
        rights: &RightsAssessment,
        sections: impl IntoIterator<Item = &'a SectionRights>,
    ) -> Self {
        let ml_category_scores = rights
            .details
            .ml_category_scores
            .iter()
            .map(|(k, v)| {
                (
                    k.name().to_string(),
                    MlEntry::Detailed {
                        probability: Some(v.probability),
                        score: Some(v.score),
                        observations: Some(v.observations as f64),
                    },
                )
            })
            .collect();

        Self {
            readability: Some(ReadabilityInput {
                normalized_score: Some(readability.normalized_score),
            }),
            rights_details: Some(RightsDetailsInput {
                details: Some(DetailsInput {
                    category_scores: category_inputs(&rights.details.category_scores),
                    ml_category_scores,
                }),
            }),
            sections: Some(
                sections
                    .into_iter()
                    .map(|s| SectionInput {
                        rights: Some(SectionRightsInput {
                            category_scores: category_inputs(&s.category_scores),
                        }),
                    })
                    .collect(),
            ),
        }
    }
}

/* ----------------------------
Engine
---------------------------- */

fn finite_score(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite()).map(|x| x.clamp(0.0, 100.0))
}

fn mapped(key: &str) -> Option<Category> {
    InternalCategory::from_name(key).and_then(InternalCategory::canonical)
}

#[derive(Debug, Clone, Default)]
pub struct UserRightsIndex {
    cfg: UriConfig,
}

impl UserRightsIndex {
    pub fn new(cfg: UriConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &UriConfig {
        &self.cfg
    }

    /// JSON boundary: accepts any value, always returns a usable result.
    pub fn compute(&self, analysis: &Value) -> UriResult {
        let parsed = Self::parse(analysis).and_then(|input| self.try_compute(&input));
        parsed.unwrap_or_else(|e| self.degraded(e))
    }

    pub fn compute_input(&self, input: &UriInput) -> UriResult {
        self.try_compute(input).unwrap_or_else(|e| self.degraded(e))
    }

    fn parse(analysis: &Value) -> anyhow::Result<UriInput> {
        if !analysis.is_object() {
            bail!("analysis must be a JSON object");
        }
        UriInput::deserialize(analysis).context("analysis has an unexpected shape")
    }

    fn degraded(&self, e: anyhow::Error) -> UriResult {
        warn!(target: "uri", error = %format!("{e:#}"), "user rights index degraded");
        metrics::counter!("uri_degraded_total").increment(1);
        let score = self.cfg.neutral_score;
        UriResult {
            categories: BTreeMap::new(),
            weighted_score: score,
            grade: self.cfg.grades.grade(score),
            guardrail: None,
            error: Some(format!("{e:#}")),
        }
    }

    fn try_compute(&self, input: &UriInput) -> anyhow::Result<UriResult> {
        if input.readability.is_none() && input.rights_details.is_none() && input.sections.is_none()
        {
            bail!("analysis has none of readability, rightsDetails or sections");
        }

        let grades = self.cfg.grades;
        let neutral = self.cfg.neutral_score;
        let mut categories: BTreeMap<Category, CategoryScore> = Category::ALL
            .iter()
            .map(|c| (*c, CategoryScore::seed(neutral, grades.grade(neutral))))
            .collect();

        let details = input
            .rights_details
            .as_ref()
            .and_then(|r| r.details.as_ref());

        // rights assessor: authoritative overwrite
        if let Some(details) = details {
            for (key, obj) in &details.category_scores {
                let Some(cat) = mapped(key) else { continue };
                let score = finite_score(obj.score).unwrap_or(neutral);
                let Some(target) = categories.get_mut(&cat) else { continue };
                target.score = score;
                target.grade = grades.grade(score);
                target.add_source(SOURCE_RIGHTS);
                target.signals.insert("ruleScore".into(), score);
                if let Some(raw) = obj.raw.filter(|x| x.is_finite()) {
                    target.signals.insert("ruleRaw".into(), raw);
                }
                if let Some(adj) = obj.adjusted.filter(|x| x.is_finite()) {
                    target.signals.insert("ruleAdjusted".into(), adj);
                }
            }
        }

        // model category scores: blend
        if self.cfg.ml_fusion {
            if let Some(details) = details {
                self.fuse_ml(&mut categories, &details.ml_category_scores);
            }
        }

        // readability → clarity
        if let Some(ns) = input
            .readability
            .as_ref()
            .and_then(|r| finite_score(r.normalized_score))
        {
            if let Some(clarity) = categories.get_mut(&Category::ClarityTransparency) {
                let p = self.cfg.clarity_prior;
                clarity.score = (p * clarity.score + (1.0 - p) * ns).round();
                clarity.grade = grades.grade(clarity.score);
                clarity.signals.insert("readability".into(), ns);
            }
        }

        // sections: minority vote each
        for section in input.sections.iter().flatten() {
            let Some(rights) = section.rights.as_ref() else { continue };
            for (key, obj) in &rights.category_scores {
                let (Some(cat), Some(sc)) = (mapped(key), finite_score(obj.score)) else {
                    continue;
                };
                let Some(target) = categories.get_mut(&cat) else { continue };
                let p = self.cfg.section_prior;
                target.score = (p * target.score + (1.0 - p) * sc).round();
                target.grade = grades.grade(target.score);
            }
        }

        for c in categories.values_mut() {
            c.sentiment = self.sentiment(c.score);
        }

        let base = self.weighted(&categories);
        if !base.is_finite() {
            bail!("weighted score is not finite");
        }

        let mut weighted_score = round2(base);
        let mut guardrail = None;
        if self.cfg.guardrail.enabled {
            if let Some(report) = self.guardrail(base, &categories) {
                weighted_score = round2(report.0);
                for (cat, c) in categories.iter_mut() {
                    if cat.is_critical() {
                        c.signals.insert("guardrailPenalty".into(), report.1.penalty);
                        c.signals.insert("guardrailCap".into(), report.1.cap);
                        c.signals.insert("guardrailBaseScore".into(), report.1.base_score);
                    }
                }
                guardrail = Some(report.1);
            }
        }

        debug!(target: "uri", weighted_score, guardrail = guardrail.is_some(), "computed");

        Ok(UriResult {
            categories,
            weighted_score,
            grade: grades.grade(weighted_score),
            guardrail,
            error: None,
        })
    }

    fn fuse_ml(&self, categories: &mut BTreeMap<Category, CategoryScore>, ml: &BTreeMap<String, MlEntry>) {
        let min_obs = self.cfg.ml_min_observations.max(1) as f64;
        let prior = self.cfg.ml_prior;

        for (key, entry) in ml {
            let Some(cat) = mapped(key) else { continue };
            let (probability, score, observations) = match entry {
                // a bare probability stands for one observation
                MlEntry::Probability(p) => (Some(*p), None, 1.0),
                MlEntry::Detailed {
                    probability,
                    score,
                    observations,
                } => (*probability, *score, observations.unwrap_or(0.0)),
            };
            if !(observations >= min_obs) {
                continue;
            }

            let probability = probability
                .filter(|p| p.is_finite())
                .or_else(|| finite_score(score).map(|s| 1.0 - s / 100.0))
                .map(|p| p.clamp(0.0, 1.0));
            let Some(ml_score) =
                finite_score(score).or_else(|| probability.map(|p| ((1.0 - p) * 100.0).round()))
            else {
                continue;
            };

            let Some(target) = categories.get_mut(&cat) else { continue };
            target.score = (prior * target.score + (1.0 - prior) * ml_score).round();
            target.grade = self.cfg.grades.grade(target.score);
            target.add_source(SOURCE_ML);
            target.signals.insert("mlScore".into(), ml_score);
            if let Some(p) = probability {
                target.signals.insert("mlProbability".into(), p);
            }
            target.signals.insert("mlObservations".into(), observations);
        }
    }

    fn sentiment(&self, score: f64) -> i8 {
        if score <= self.cfg.sentiment_negative_max {
            -1
        } else if score >= self.cfg.sentiment_positive_min {
            1
        } else {
            0
        }
    }

    fn weighted(&self, categories: &BTreeMap<Category, CategoryScore>) -> f64 {
        let (mut sum, mut wsum) = (0.0, 0.0);
        for cat in Category::ALL {
            let w = self.cfg.weights.get(cat);
            let s = categories.get(&cat).map(|c| c.score).unwrap_or(self.cfg.neutral_score);
            sum += s * w;
            wsum += w;
        }
        if wsum > 0.0 {
            sum / wsum
        } else {
            self.cfg.neutral_score
        }
    }

    /// Penalty plus soft cap when a critical category is weak. Returns the
    /// adjusted score and its report, or `None` when nothing changed.
    fn guardrail(
        &self,
        base: f64,
        categories: &BTreeMap<Category, CategoryScore>,
    ) -> Option<(f64, GuardrailReport)> {
        let g = &self.cfg.guardrail;
        let critical: Vec<f64> = categories
            .iter()
            .filter(|(k, _)| k.is_critical())
            .map(|(_, c)| c.score)
            .collect();
        if critical.is_empty() {
            return None;
        }
        let min = critical.iter().copied().fold(f64::INFINITY, f64::min);
        let avg = critical.iter().sum::<f64>() / critical.len() as f64;
        if min >= g.critical_floor {
            return None;
        }

        let shortfall: f64 = critical
            .iter()
            .map(|s| (g.shortfall_base - s).max(0.0))
            .sum();
        let penalty = (shortfall * g.penalty_factor).round();
        let cap = (avg + g.avg_margin).min(min + g.min_margin).min(g.hard_cap);
        let adjusted = (base - penalty).max(0.0).min(cap);

        if penalty <= 0.0 && adjusted >= base {
            return None;
        }
        Some((
            adjusted,
            GuardrailReport {
                applied: true,
                penalty,
                cap,
                base_score: round2(base),
                min_critical_score: min,
                avg_critical_score: round2(avg),
            },
        ))
    }

    /// `uri_share · uri + (1 − uri_share) · readability`; a missing side counts as neutral.
    pub fn combined_grade(&self, uri: Option<f64>, readability: Option<f64>) -> CombinedGrade {
        let neutral = self.cfg.neutral_score;
        let uri_score = uri.filter(|x| x.is_finite()).unwrap_or(neutral);
        let readability_score = readability.filter(|x| x.is_finite()).unwrap_or(neutral);
        let uri_weight = self.cfg.combined_uri_share;
        let readability_weight = 1.0 - uri_weight;
        let combined = round2(uri_score * uri_weight + readability_score * readability_weight);
        CombinedGrade {
            combined_score: combined,
            grade: self.cfg.grades.grade(combined),
            breakdown: CombinedBreakdown {
                uri_score,
                readability_score,
                uri_weight,
                readability_weight: round2(readability_weight),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn uri() -> UserRightsIndex {
        UserRightsIndex::default()
    }

    #[test]
    fn rights_scores_overwrite_mapped_category() {
        let r = uri().compute(&json!({
            "readability": { "normalizedScore": 78 },
            "rightsDetails": { "details": { "categoryScores": { "DATA_PRACTICES": { "score": 65, "raw": -35 } } } },
            "sections": []
        }));
        let dc = &r.categories[&Category::DataCollectionUse];
        assert_eq!(dc.score, 65.0);
        assert_eq!(dc.grade, Grade::C);
        assert_eq!(dc.sources, vec![SOURCE_RIGHTS.to_string()]);
        assert_eq!(dc.signals["ruleRaw"], -35.0);
        // clarity: round(0.7*50 + 0.3*78) = 58
        assert_eq!(r.categories[&Category::ClarityTransparency].score, 58.0);
        assert!(r.error.is_none());
        assert!((0.0..=100.0).contains(&r.weighted_score));
    }

    #[test]
    fn empty_category_scores_leave_neutral_defaults() {
        let r = uri().compute(&json!({ "rightsDetails": { "details": { "categoryScores": {} } } }));
        assert_eq!(r.categories.len(), 8);
        for c in r.categories.values() {
            assert_eq!((c.score, c.grade, c.sentiment), (50.0, Grade::C, 0));
        }
        assert_eq!(r.weighted_score, 50.0);
    }

    #[test]
    fn malformed_input_degrades() {
        for bad in [json!({}), json!(42), json!({"sections": "nope"})] {
            let r = uri().compute(&bad);
            assert!(r.categories.is_empty(), "{bad}");
            assert_eq!(r.weighted_score, 50.0);
            assert_eq!(r.grade, Grade::C);
            assert!(r.error.is_some());
        }
    }

    #[test]
    fn unknown_and_billing_keys_are_ignored() {
        let r = uri().compute(&json!({ "rightsDetails": { "details": { "categoryScores": {
            "BILLING_AND_AUTORENEWAL": { "score": 10 },
            "SOMETHING_NEW": { "score": 0 }
        } } } }));
        assert!(r.categories.values().all(|c| c.score == 50.0));
    }

    #[test]
    fn ml_scores_blend_when_observed() {
        let r = uri().compute(&json!({ "rightsDetails": { "details": {
            "categoryScores": { "DISPUTE_RESOLUTION": { "score": 80 } },
            "mlCategoryScores": {
                "DISPUTE_RESOLUTION": { "probability": 0.8, "observations": 2 },
                "DATA_PRACTICES": { "probability": 0.9, "observations": 0 }
            }
        } } }));
        let dr = &r.categories[&Category::DisputeResolution];
        // ml score = 20; round(0.65*80 + 0.35*20) = 59
        assert_eq!(dr.score, 59.0);
        assert_eq!(dr.sources, vec![SOURCE_RIGHTS.to_string(), SOURCE_ML.to_string()]);
        assert_eq!(dr.signals["mlScore"], 20.0);
        assert_eq!(r.categories[&Category::DataCollectionUse].score, 50.0);
    }

    #[test]
    fn sections_vote_twenty_percent_each() {
        let r = uri().compute(&json!({
            "sections": [
                { "rights": { "categoryScores": { "UNILATERAL_CHANGES": { "score": 0 } } } },
                { "rights": { "categoryScores": { "UNILATERAL_CHANGES": { "score": 0 } } } },
                { "heading": "no rights here" }
            ]
        }));
        // 50 → 40 → 32
        let tc = &r.categories[&Category::TermsChanges];
        assert_eq!(tc.score, 32.0);
        assert_eq!(tc.sentiment, -1);
        assert_eq!(tc.grade, Grade::F);
    }

    #[test]
    fn incoming_scores_are_clamped() {
        let r = uri().compute(&json!({ "rightsDetails": { "details": { "categoryScores": {
            "CONTENT_AND_IP": { "score": 140 }
        } } } }));
        let c = &r.categories[&Category::ContentRights];
        assert_eq!(c.score, 100.0);
        assert_eq!(c.sentiment, 1);
    }

    #[test]
    fn guardrail_penalizes_weak_critical_categories() {
        let mut cfg = UriConfig::default();
        cfg.guardrail.enabled = true;
        let engine = UserRightsIndex::new(cfg);
        let r = engine.compute(&json!({ "rightsDetails": { "details": { "categoryScores": {
            "DATA_PRACTICES": { "score": 40 },
            "CONTENT_AND_IP": { "score": 100 },
            "ALGORITHMIC_DECISIONS": { "score": 100 },
            "ACCOUNT_MANAGEMENT": { "score": 100 }
        } } } }));
        let g = r.guardrail.expect("guardrail applied");
        // shortfall: 30 (data) + 20·3 (neutral criticals) = 90 → penalty 59
        assert_eq!(g.penalty, 59.0);
        assert!(r.weighted_score < g.base_score);
        assert!(r.categories[&Category::UserPrivacy].signals.contains_key("guardrailPenalty"));

        // off by default
        let plain = uri().compute(&json!({ "rightsDetails": { "details": { "categoryScores": {
            "DATA_PRACTICES": { "score": 40 }
        } } } }));
        assert!(plain.guardrail.is_none());
    }

    #[test]
    fn combined_grade_blends_and_falls_back() {
        let c = uri().combined_grade(Some(80.0), Some(60.0));
        assert_eq!(c.combined_score, 74.0);
        assert_eq!(c.grade, Grade::B);
        let none = uri().combined_grade(None, Some(f64::NAN));
        assert_eq!(none.combined_score, 50.0);
    }
}
