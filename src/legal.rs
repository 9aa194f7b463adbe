//! "Is this legal text?" detection from lexicon density, term proximity and
//! document-structure patterns, plus the consumer-facing detection thresholds.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::classify::rules::has_legal_header;
use crate::config::DetectionThresholds;
use crate::grade::round2;
use crate::text::{is_legal_term, HeuristicSegmenter, Segmenter};

/// Anything shorter is not worth classifying.
const MIN_TEXT_CHARS: usize = 3;
/// Weighted score a document needs (with enough terms) to count as legal.
const LEGAL_SCORE: f64 = 0.5;

static SECTION_NUMBERING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:\d+\.|\([a-z]\)|\([0-9]\)|\d+\.\d+)").expect("section numbering regex")
});
static DEFINITIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?im)(?:^|\n)\s*["']?\w+["']?\s+(?:shall |means |refers to |is defined as )"#)
        .expect("definitions regex")
});
static CITATIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\d+\s+U\.S\.C\.|§+\s*\d+|\bCFR\b|\bFR\b)").expect("citations regex")
});
static LISTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:[A-Z]\.|\d+\.|\u{2022}|-)\s+").expect("lists regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionLevel {
    Low,
    Medium,
    High,
}

/// What a consumer should do with a document, by legal-term count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionAction {
    AutoGrade,
    Notify,
    None,
}

impl DetectionThresholds {
    pub fn action(&self, term_count: usize) -> DetectionAction {
        if term_count >= self.auto_grade {
            DetectionAction::AutoGrade
        } else if term_count >= self.notify {
            DetectionAction::Notify
        } else {
            DetectionAction::None
        }
    }

    pub fn level(&self, term_count: usize) -> DetectionLevel {
        match self.action(term_count) {
            DetectionAction::AutoGrade => DetectionLevel::High,
            DetectionAction::Notify => DetectionLevel::Medium,
            DetectionAction::None => DetectionLevel::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructurePatterns {
    pub has_numbered_sections: bool,
    pub has_definitions: bool,
    pub has_legal_headers: bool,
    pub has_citations: bool,
    pub has_lists: bool,
}

impl StructurePatterns {
    pub fn detect(text: &str) -> Self {
        Self {
            has_numbered_sections: SECTION_NUMBERING.is_match(text),
            has_definitions: DEFINITIONS.is_match(text),
            has_legal_headers: has_legal_header(text),
            has_citations: CITATIONS.is_match(text),
            has_lists: LISTS.is_match(text),
        }
    }

    /// 0.2 per pattern present.
    pub fn score(&self) -> f64 {
        [
            self.has_numbered_sections,
            self.has_definitions,
            self.has_legal_headers,
            self.has_citations,
            self.has_lists,
        ]
        .iter()
        .filter(|b| **b)
        .count() as f64
            * 0.2
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalTextMetrics {
    pub term_count: usize,
    pub unique_terms: usize,
    pub density: f64,
    pub proximity_score: f64,
    pub avg_sentence_length: f64,
    pub total_words: usize,
    pub total_sentences: usize,
    pub term_distribution: BTreeMap<String, usize>,
    pub patterns: StructurePatterns,
    pub pattern_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalTextStatus {
    pub is_legal: bool,
    pub level: DetectionLevel,
    pub action: DetectionAction,
    pub score: f64,
    pub metrics: LegalTextMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LegalTextDetector {
    thresholds: DetectionThresholds,
}

impl LegalTextDetector {
    pub fn new(thresholds: DetectionThresholds) -> Self {
        Self { thresholds }
    }

    pub fn analyze(&self, text: &str) -> LegalTextStatus {
        let text = text.trim();
        if text.len() < MIN_TEXT_CHARS {
            return LegalTextStatus {
                is_legal: false,
                level: DetectionLevel::Low,
                action: DetectionAction::None,
                score: 0.0,
                metrics: LegalTextMetrics::default(),
                reason: Some("insufficient_text".into()),
            };
        }

        let seg = HeuristicSegmenter;
        let words = seg.words(text);
        let sentences = seg.sentences(text);
        let mut metrics = self.term_metrics(&words);
        metrics.total_sentences = sentences.len();
        metrics.avg_sentence_length = round2(words.len() as f64 / sentences.len().max(1) as f64);
        metrics.patterns = StructurePatterns::detect(text);
        metrics.pattern_score = round2(metrics.patterns.score());

        let score = metrics.density * 0.4 + metrics.proximity_score * 0.3 + metrics.pattern_score * 0.3;
        let is_legal = metrics.term_count >= self.thresholds.section && score >= LEGAL_SCORE;

        LegalTextStatus {
            is_legal,
            level: self.thresholds.level(metrics.term_count),
            action: self.thresholds.action(metrics.term_count),
            score: round2(score),
            metrics,
            reason: None,
        }
    }

    /// Term counts, density and the proximity bonus: consecutive legal terms
    /// `d` words apart (d <= proximity) add `1 - d / proximity`.
    fn term_metrics<S: AsRef<str>>(&self, words: &[S]) -> LegalTextMetrics {
        let proximity = self.thresholds.proximity.max(1) as f64;
        let mut distribution: BTreeMap<String, usize> = BTreeMap::new();
        let mut total = 0usize;
        let mut bonus = 0.0;
        let mut last: Option<usize> = None;

        for (i, w) in words.iter().enumerate() {
            let w = w.as_ref().to_lowercase();
            if !is_legal_term(&w) {
                continue;
            }
            total += 1;
            if let Some(prev) = last {
                let gap = (i - prev) as f64;
                if gap <= proximity {
                    bonus += 1.0 - gap / proximity;
                }
            }
            last = Some(i);
            *distribution.entry(w).or_insert(0) += 1;
        }

        let density = if words.is_empty() {
            0.0
        } else {
            total as f64 / words.len() as f64
        };
        LegalTextMetrics {
            term_count: total,
            unique_terms: distribution.len(),
            density: round2(density),
            proximity_score: round2(bonus / total.max(1) as f64),
            total_words: words.len(),
            term_distribution: distribution,
            ..LegalTextMetrics::default()
        }
    }
}
