//! Rights assessor: clause signals → per-category scores (0..=100, higher is
//! better for the user) and an overall rights score/grade.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::classify::rules::{count_clauses, has_legal_header, ClauseCounts, ClauseType, RiskTier};
use crate::classify::ClauseClassifier;
use crate::config::RightsConfig;
use crate::grade::{round2, Grade};
use crate::text::{count_legal_terms, HeuristicSegmenter, Segmenter};
use crate::uri::Category;

/// Categories the rubric scores in. Mapped onto the eight URI categories by
/// [`InternalCategory::canonical`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InternalCategory {
    DisputeResolution,
    ClassActions,
    UnilateralChanges,
    DataPractices,
    BillingAndAutorenewal,
    ContentAndIp,
    LiabilityAndRemedies,
    RetentionAndDeletion,
    ConsentAndOptOut,
    AccountManagement,
    AlgorithmicDecisions,
}

impl InternalCategory {
    pub const ALL: [InternalCategory; 11] = [
        InternalCategory::DisputeResolution,
        InternalCategory::ClassActions,
        InternalCategory::UnilateralChanges,
        InternalCategory::DataPractices,
        InternalCategory::BillingAndAutorenewal,
        InternalCategory::ContentAndIp,
        InternalCategory::LiabilityAndRemedies,
        InternalCategory::RetentionAndDeletion,
        InternalCategory::ConsentAndOptOut,
        InternalCategory::AccountManagement,
        InternalCategory::AlgorithmicDecisions,
    ];

    /// Fixed many-to-one map onto URI categories. Billing has no URI counterpart.
    pub fn canonical(self) -> Option<Category> {
        match self {
            InternalCategory::DisputeResolution | InternalCategory::ClassActions => {
                Some(Category::DisputeResolution)
            }
            InternalCategory::UnilateralChanges => Some(Category::TermsChanges),
            InternalCategory::DataPractices => Some(Category::DataCollectionUse),
            InternalCategory::RetentionAndDeletion => Some(Category::UserPrivacy),
            InternalCategory::ConsentAndOptOut | InternalCategory::LiabilityAndRemedies => {
                Some(Category::ClarityTransparency)
            }
            InternalCategory::ContentAndIp => Some(Category::ContentRights),
            InternalCategory::AccountManagement => Some(Category::AccountManagement),
            InternalCategory::AlgorithmicDecisions => Some(Category::AlgorithmicDecisions),
            InternalCategory::BillingAndAutorenewal => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            InternalCategory::DisputeResolution => "DISPUTE_RESOLUTION",
            InternalCategory::ClassActions => "CLASS_ACTIONS",
            InternalCategory::UnilateralChanges => "UNILATERAL_CHANGES",
            InternalCategory::DataPractices => "DATA_PRACTICES",
            InternalCategory::BillingAndAutorenewal => "BILLING_AND_AUTORENEWAL",
            InternalCategory::ContentAndIp => "CONTENT_AND_IP",
            InternalCategory::LiabilityAndRemedies => "LIABILITY_AND_REMEDIES",
            InternalCategory::RetentionAndDeletion => "RETENTION_AND_DELETION",
            InternalCategory::ConsentAndOptOut => "CONSENT_AND_OPT_OUT",
            InternalCategory::AccountManagement => "ACCOUNT_MANAGEMENT",
            InternalCategory::AlgorithmicDecisions => "ALGORITHMIC_DECISIONS",
        }
    }

    pub fn from_name(name: &str) -> Option<InternalCategory> {
        InternalCategory::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(name.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InternalCategoryScore {
    pub score: f64,
    /// Σ count × weight before normalization.
    pub raw: f64,
    /// `raw` divided by the length normalization factor.
    pub adjusted: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MlCategoryScore {
    pub probability: f64,
    pub score: f64,
    pub observations: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RightsDetails {
    pub chunk_count: usize,
    pub word_count: usize,
    pub clause_signals: usize,
    pub category_scores: BTreeMap<InternalCategory, InternalCategoryScore>,
    #[serde(default)]
    pub ml_category_scores: BTreeMap<InternalCategory, MlCategoryScore>,
    /// Highest fused (rule + model) probability per clause the model covers.
    #[serde(default)]
    pub ml_fused: BTreeMap<ClauseType, f64>,
    pub clause_counts: BTreeMap<RiskTier, BTreeMap<ClauseType, usize>>,
    pub ml_applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RightsAssessment {
    pub rights_score: f64,
    pub grade: Grade,
    pub confidence: f64,
    /// Raw lexicon hits; consumers compare it with the detection thresholds.
    pub legal_term_count: usize,
    pub details: RightsDetails,
}

/// Compact per-section view: what the URI engine reads from each section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRights {
    pub rights_score: f64,
    pub grade: Grade,
    pub category_scores: BTreeMap<InternalCategory, InternalCategoryScore>,
}

impl From<&RightsAssessment> for SectionRights {
    fn from(r: &RightsAssessment) -> Self {
        Self {
            rights_score: r.rights_score,
            grade: r.grade,
            category_scores: r.details.category_scores.clone(),
        }
    }
}

/// Result of scoring one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkScore {
    pub word_count: usize,
    pub counts: ClauseCounts,
    pub score: f64,
    pub raw_negative: f64,
    pub raw_positive: f64,
}

static SENTENCE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^.!?]+[.!?]+").expect("sentence run regex"));

/// Punctuated sentence runs, plus any unpunctuated tail that still carries
/// words (a last line or list item without a final period).
fn sentence_runs(text: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut end = 0;
    for m in SENTENCE_RUN.find_iter(text) {
        runs.push(m.as_str());
        end = m.end();
    }
    let tail = &text[end..];
    if tail.chars().any(char::is_alphabetic) {
        runs.push(tail);
    }
    runs
}

#[derive(Debug, Clone, Default)]
pub struct RightsAssessor {
    cfg: RightsConfig,
    segmenter: HeuristicSegmenter,
}

impl RightsAssessor {
    pub fn new(cfg: RightsConfig) -> Self {
        Self {
            cfg,
            segmenter: HeuristicSegmenter,
        }
    }

    pub fn config(&self) -> &RightsConfig {
        &self.cfg
    }

    /// Greedy sentence packing into chunks of at most `chunk_size` chars
    /// (a single longer sentence forms its own chunk). A trailing run without
    /// terminal punctuation is kept as a last sentence.
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        for sentence in sentence_runs(text) {
            if current.len() + sentence.len() > self.cfg.chunk_size {
                if !current.trim().is_empty() {
                    chunks.push(current.trim().to_string());
                }
                current = sentence.to_string();
            } else {
                current.push(' ');
                current.push_str(sentence);
            }
        }
        if !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
        }
        if chunks.is_empty() && !text.trim().is_empty() {
            chunks.push(text.trim().to_string());
        }
        chunks
    }

    /// Rubric score for a set of clause counts over `word_count` words.
    pub fn score_counts(&self, counts: &ClauseCounts, word_count: usize) -> ChunkScore {
        let (mut neg, mut pos) = (0.0, 0.0);
        for (clause, n) in counts.iter() {
            let w = self.cfg.weight(clause) * n as f64;
            if w < 0.0 {
                neg += w;
            } else {
                pos += w;
            }
        }

        let norm = (word_count as f64 / self.cfg.normalization_per_words).max(1.0);
        let score = if neg == 0.0 && pos == 0.0 {
            self.cfg.no_signal_score
        } else {
            let capped_neg = (neg / norm).max(self.cfg.max_negative);
            let capped_pos = (pos / norm).min(self.cfg.max_positive);
            (100.0 + capped_neg + capped_pos).clamp(0.0, 100.0)
        };

        ChunkScore {
            word_count,
            counts: counts.clone(),
            score,
            raw_negative: neg,
            raw_positive: pos,
        }
    }

    /// Full assessment. With a classifier, model evidence is fused into the
    /// clause counts before scoring; without one, scoring is rules only.
    pub fn analyze(&self, text: &str, classifier: Option<&ClauseClassifier>) -> RightsAssessment {
        let legal_term_count = count_legal_terms(&self.segmenter.words(text));
        let chunks = self.chunk_text(text);
        if chunks.is_empty() {
            return self.neutral(legal_term_count);
        }

        let mut total_score = 0.0;
        let mut total_words = 0usize;
        let mut aggregate = ClauseCounts::default();
        let mut ml_evidence: BTreeMap<ClauseType, (f64, u32)> = BTreeMap::new();
        let mut ml_fused: BTreeMap<ClauseType, f64> = BTreeMap::new();
        let mut ml_applied = false;

        for chunk in &chunks {
            let words = chunk.split_whitespace().count().max(1);
            let mut counts = count_clauses(chunk);

            if let Some(clf) = classifier {
                let mut sentences: Vec<&str> = sentence_runs(chunk)
                    .into_iter()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect();
                if sentences.is_empty() {
                    sentences.push(chunk.as_str());
                }

                for (class, ev) in clf.evidence(&sentences) {
                    let Some(clause) = ClauseType::from_name(&class) else {
                        continue;
                    };
                    let slot = ml_evidence.entry(clause).or_insert((0.0, 0));
                    slot.0 = slot.0.max(ev.max_probability);
                    slot.1 += ev.observations;

                    // A missing rule hit is missing evidence: the model decides alone.
                    let rule_hit = counts.get(clause) > 0;
                    let fused = if rule_hit {
                        clf.fuse(true, ev.max_probability)
                    } else {
                        ev.max_probability
                    };
                    let best = ml_fused.entry(clause).or_insert(0.0);
                    *best = best.max(fused);

                    if !rule_hit && fused >= clf.threshold_for(&class) {
                        counts.add(clause, 1);
                        ml_applied = true;
                    }
                }
            }

            let scored = self.score_counts(&counts, words);
            debug!(target: "rights", score = scored.score, words, "chunk scored");
            total_score += scored.score;
            total_words += words;
            aggregate.merge(&counts);
        }

        let rights_score = round2(total_score / chunks.len() as f64);
        let category_scores = self.category_scores(&aggregate, total_words);
        let ml_category_scores = Self::ml_category_scores(&ml_evidence);
        let signals = aggregate.total();

        let expected_chunks = (total_words as f64 / self.cfg.normalization_per_words).ceil().max(1.0);
        let coverage = (chunks.len() as f64 / expected_chunks).min(1.0);
        let signal = (signals as f64 / 10.0).min(1.0);
        let doc_type = if has_legal_header(text) { 1.0 } else { 0.0 };
        let confidence = round2(0.4 * coverage + 0.4 * signal + 0.2 * doc_type);

        RightsAssessment {
            rights_score,
            grade: self.cfg.grades.grade(rights_score),
            confidence,
            legal_term_count,
            details: RightsDetails {
                chunk_count: chunks.len(),
                word_count: total_words,
                clause_signals: signals,
                category_scores,
                ml_category_scores,
                ml_fused: ml_fused
                    .into_iter()
                    .map(|(k, v)| (k, round2(v * 100.0) / 100.0))
                    .collect(),
                clause_counts: aggregate.by_tier(),
                ml_applied,
            },
        }
    }

    /// Per internal category: Σ count × weight over matched clauses, length
    /// normalized and soft-bounded, then shifted onto 0..=100. Categories with
    /// no matched clause are omitted.
    fn category_scores(
        &self,
        counts: &ClauseCounts,
        total_words: usize,
    ) -> BTreeMap<InternalCategory, InternalCategoryScore> {
        let norm = (total_words as f64 / self.cfg.normalization_per_words).max(1.0);
        let mut raw: BTreeMap<InternalCategory, f64> = BTreeMap::new();
        for (clause, n) in counts.iter() {
            *raw.entry(clause.internal_category()).or_insert(0.0) +=
                n as f64 * self.cfg.weight(clause);
        }

        raw.into_iter()
            .map(|(cat, raw)| {
                let adjusted = raw / norm;
                let bounded = adjusted.clamp(self.cfg.category_floor, self.cfg.category_ceiling);
                let score = (100.0 + bounded).clamp(0.0, 100.0);
                (
                    cat,
                    InternalCategoryScore {
                        score: round2(score),
                        raw,
                        adjusted: round2(adjusted),
                    },
                )
            })
            .collect()
    }

    /// Model view per internal category: likelihood of an unfavourable clause
    /// turned into a score (`1 - p`).
    fn ml_category_scores(
        evidence: &BTreeMap<ClauseType, (f64, u32)>,
    ) -> BTreeMap<InternalCategory, MlCategoryScore> {
        let mut out: BTreeMap<InternalCategory, MlCategoryScore> = BTreeMap::new();
        for (clause, (p, obs)) in evidence {
            let e = out
                .entry(clause.internal_category())
                .or_insert(MlCategoryScore {
                    probability: 0.0,
                    score: 100.0,
                    observations: 0,
                });
            e.probability = e.probability.max(*p);
            e.observations += obs;
            e.score = ((1.0 - e.probability) * 100.0).round();
        }
        for e in out.values_mut() {
            e.probability = round2(e.probability * 100.0) / 100.0;
        }
        out
    }

    fn neutral(&self, legal_term_count: usize) -> RightsAssessment {
        let score = self.cfg.no_signal_score;
        RightsAssessment {
            rights_score: score,
            grade: self.cfg.grades.grade(score),
            confidence: 0.0,
            legal_term_count,
            details: RightsDetails {
                chunk_count: 0,
                word_count: 0,
                clause_signals: 0,
                category_scores: BTreeMap::new(),
                ml_category_scores: BTreeMap::new(),
                ml_fused: BTreeMap::new(),
                clause_counts: ClauseCounts::default().by_tier(),
                ml_applied: false,
            },
        }
    }
}
