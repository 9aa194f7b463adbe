use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Single-word legal vocabulary (lowercase). Multi-word phrases are handled by clause rules.
static LEGAL_TERMS: Lazy<HashSet<String>> = Lazy::new(|| {
    let raw = include_str!("../../legal_terms.json");
    serde_json::from_str::<Vec<String>>(raw)
        .expect("valid legal term lexicon")
        .into_iter()
        .map(|t| t.to_lowercase())
        .collect()
});

pub fn is_legal_term(word: &str) -> bool {
    LEGAL_TERMS.contains(word.to_lowercase().as_str())
}

/// Number of words (already split) that are legal terms, counting repeats.
pub fn count_legal_terms<S: AsRef<str>>(words: &[S]) -> usize {
    words.iter().filter(|w| is_legal_term(w.as_ref())).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexicon_is_case_insensitive() {
        assert!(is_legal_term("Arbitration"));
        assert!(is_legal_term("opt-out"));
        assert!(!is_legal_term("cats"));
    }

    #[test]
    fn counts_repeats() {
        let words = ["terms", "of", "service", "terms"];
        assert_eq!(count_legal_terms(&words), 3);
    }
}
