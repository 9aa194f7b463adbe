//! Text handling: extraction, segmentation and the legal-term lexicon.

pub mod extract;
pub mod lexicon;
pub mod segment;

pub use extract::{BasicExtractor, ContentStats, ExtractedText, InputKind, TextExtractor};
pub use lexicon::{count_legal_terms, is_legal_term};
pub use segment::{HeuristicSegmenter, Segmenter};
