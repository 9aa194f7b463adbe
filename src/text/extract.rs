//! Text extraction: raw HTML or plain text → normalized plain text + basic metadata.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::lexicon::count_legal_terms;
use super::segment::{HeuristicSegmenter, Segmenter};

/// What the caller handed us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// Sniff: input starting with `<` is treated as HTML.
    #[default]
    Auto,
    Text,
    Html,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentStats {
    pub paragraphs: usize,
    pub sentences: usize,
    pub estimated_reading_minutes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedText {
    pub text: String,
    /// Resolved kind (never `Auto`).
    pub kind: InputKind,
    pub word_count: usize,
    pub legal_term_count: usize,
    pub stats: ContentStats,
}

/// Source-agnostic extraction seam. The pipeline only needs normalized text and counts.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, input: &str, kind: InputKind) -> ExtractedText;
}

static RE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment regex"));
static RE_NON_CONTENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style|noscript|template)\b[^>]*>.*?</\s*(script|style|noscript|template)\s*>")
        .expect("non-content regex")
});
static RE_LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(br|li)\b[^>]*/?>").expect("line break regex"));
static RE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</?(p|div|h[1-6]|section|article|main|header|footer|ul|ol|table|tr|blockquote|dl|dt|dd)\b[^>]*>")
        .expect("block tag regex")
});
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));
static RE_SPACES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\u{a0}\u{200b}]+").expect("spaces regex"));

/// UI chrome that survives tag stripping on real pages.
const NAV_LINES: &[&str] = &["back to top", "menu", "home", "accept", "decline", "close"];

/// Default extractor: regex tag stripping + entity decoding + line cleanup.
#[derive(Debug, Clone, Default)]
pub struct BasicExtractor {
    segmenter: HeuristicSegmenter,
}

impl BasicExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    fn html_to_text(html: &str) -> String {
        let s = RE_COMMENT.replace_all(html, " ");
        let s = RE_NON_CONTENT.replace_all(&s, " ");
        let s = RE_LINE_BREAK.replace_all(&s, "\n");
        let s = RE_BLOCK.replace_all(&s, "\n\n");
        let s = RE_TAG.replace_all(&s, " ");
        html_escape::decode_html_entities(&s).into_owned()
    }

    /// Line-level cleanup shared by both input kinds. Keeps single blank lines
    /// as paragraph separators.
    fn normalize(text: &str) -> String {
        let unified = text.replace("\r\n", "\n").replace('\r', "\n");
        let mut out: Vec<String> = Vec::new();
        let mut last_content: Option<String> = None;

        for raw in unified.lines() {
            let line = RE_SPACES.replace_all(raw, " ").trim().to_string();
            if line.is_empty() {
                if out.last().is_some_and(|l| !l.is_empty()) {
                    out.push(String::new());
                }
                continue;
            }
            let lower = line.to_lowercase();
            if NAV_LINES.contains(&lower.as_str()) {
                continue;
            }
            if last_content.as_deref() == Some(lower.as_str()) {
                continue;
            }
            last_content = Some(lower);
            out.push(line);
        }

        while out.last().is_some_and(|l| l.is_empty()) {
            out.pop();
        }
        out.join("\n")
    }

    fn stats(&self, text: &str, words: usize) -> ContentStats {
        ContentStats {
            paragraphs: text.split("\n\n").filter(|p| !p.trim().is_empty()).count(),
            sentences: self.segmenter.sentences(text).len(),
            estimated_reading_minutes: words.div_ceil(200),
        }
    }
}

impl TextExtractor for BasicExtractor {
    fn extract(&self, input: &str, kind: InputKind) -> ExtractedText {
        let kind = match kind {
            InputKind::Auto if input.trim_start().starts_with('<') => InputKind::Html,
            InputKind::Auto => InputKind::Text,
            k => k,
        };
        let plain = match kind {
            InputKind::Html => Self::html_to_text(input),
            _ => input.to_string(),
        };
        let text = Self::normalize(&plain);
        let words = self.segmenter.words(&text);
        let stats = self.stats(&text, words.len());

        ExtractedText {
            legal_term_count: count_legal_terms(&words),
            word_count: words.len(),
            text,
            kind,
            stats,
        }
    }
}
