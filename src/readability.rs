//! Readability grader: Flesch reading ease, Flesch-Kincaid grade level and
//! Gunning Fog over heuristic segmentation.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::config::ReadabilityConfig;
use crate::grade::{round2, Grade};
use crate::text::{HeuristicSegmenter, Segmenter};

/// Words with at least this many syllables count as complex (Fog index).
const COMPLEX_SYLLABLES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadabilityResult {
    pub flesch: f64,
    pub kincaid: f64,
    pub fog_index: f64,
    pub average_grade: Grade,
    pub word_count: usize,
    pub sentence_count: usize,
    pub average_sentence_length: f64,
    pub average_syllables_per_word: f64,
    pub complex_word_count: usize,
    pub syllable_count: usize,
    /// Flesch clamped to 0..=100; what the URI engine blends into clarity.
    pub normalized_score: f64,
    pub confidence: f64,
}

impl ReadabilityResult {
    /// Result for text with nothing to measure.
    pub fn not_applicable() -> Self {
        Self {
            flesch: 0.0,
            kincaid: 0.0,
            fog_index: 0.0,
            average_grade: Grade::NotApplicable,
            word_count: 0,
            sentence_count: 0,
            average_sentence_length: 0.0,
            average_syllables_per_word: 0.0,
            complex_word_count: 0,
            syllable_count: 0,
            normalized_score: 50.0,
            confidence: 0.0,
        }
    }
}

#[derive(Clone)]
pub struct ReadabilityGrader {
    cfg: ReadabilityConfig,
    segmenter: Arc<dyn Segmenter>,
}

impl std::fmt::Debug for ReadabilityGrader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadabilityGrader")
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

impl Default for ReadabilityGrader {
    fn default() -> Self {
        Self::new(ReadabilityConfig::default())
    }
}

impl ReadabilityGrader {
    pub fn new(cfg: ReadabilityConfig) -> Self {
        Self::with_segmenter(cfg, Arc::new(HeuristicSegmenter))
    }

    pub fn with_segmenter(cfg: ReadabilityConfig, segmenter: Arc<dyn Segmenter>) -> Self {
        Self { cfg, segmenter }
    }

    pub fn grade(&self, text: &str) -> ReadabilityResult {
        let words = self.segmenter.words(text);
        if words.is_empty() {
            return ReadabilityResult::not_applicable();
        }
        let sentence_count = self.segmenter.sentences(text).len().max(1);
        let word_count = words.len();

        let mut syllable_count = 0usize;
        let mut complex_word_count = 0usize;
        for w in &words {
            let s = self.segmenter.syllables(w);
            syllable_count += s;
            if s >= COMPLEX_SYLLABLES {
                complex_word_count += 1;
            }
        }

        let asl = word_count as f64 / sentence_count as f64;
        let asw = syllable_count as f64 / word_count as f64;
        let flesch = 206.835 - 1.015 * asl - 84.6 * asw;
        let kincaid = 0.39 * asl + 11.8 * asw - 15.59;
        let fog = 0.4 * (asl + 100.0 * complex_word_count as f64 / word_count as f64);

        let confidence = (word_count as f64 / self.cfg.confidence_saturation_words).min(1.0);

        debug!(
            target: "readability",
            words = word_count,
            sentences = sentence_count,
            kincaid,
            "graded"
        );

        ReadabilityResult {
            flesch: round2(flesch),
            kincaid: round2(kincaid),
            fog_index: round2(fog),
            average_grade: self.cfg.grade_for(kincaid),
            word_count,
            sentence_count,
            average_sentence_length: round2(asl),
            average_syllables_per_word: round2(asw),
            complex_word_count,
            syllable_count,
            normalized_score: round2(flesch.clamp(0.0, 100.0)),
            confidence: round2(confidence),
        }
    }
}
