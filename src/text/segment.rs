//! Heuristic sentence/word/syllable splitting.
//!
//! Scoring code only talks to the [`Segmenter`] trait, so the heuristic can be
//! replaced by a proper tokenizer without touching the graders.

/// Splits text into the units readability and rights scoring count.
pub trait Segmenter: Send + Sync {
    /// Sentences in reading order, trimmed. Sentences without a letter are dropped.
    fn sentences(&self, text: &str) -> Vec<String>;
    /// Whitespace-separated words with edge punctuation removed; only words containing a letter.
    fn words(&self, text: &str) -> Vec<String>;
    /// Estimated syllable count for a single word (at least 1).
    fn syllables(&self, word: &str) -> usize;
}

/// Punctuation/vowel-group heuristic. Imprecise on purpose-built edge cases
/// (decimals, initials) but stable and fast.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicSegmenter;

/// A single period after one of these does not close a sentence.
const ABBREVIATIONS: &[&str] = &[
    "e.g", "i.e", "etc", "inc", "ltd", "co", "corp", "mr", "mrs", "ms", "dr", "no", "vs", "u.s",
    "st", "jr", "sr",
];

const CLOSERS: &[char] = &['"', '\'', ')', ']', '\u{201d}', '\u{2019}'];

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn ends_with_abbreviation(buf: &str) -> bool {
    let Some(last) = buf.split_whitespace().last() else {
        return false;
    };
    let token = last
        .trim_end_matches(|c: char| is_terminal(c) || CLOSERS.contains(&c))
        .to_lowercase();
    ABBREVIATIONS.contains(&token.as_str())
}

impl Segmenter for HeuristicSegmenter {
    fn sentences(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let n = chars.len();
        let mut out = Vec::new();
        let mut cur = String::new();
        let mut i = 0;

        while i < n {
            let c = chars[i];

            if is_terminal(c) {
                let mut j = i;
                while j < n && is_terminal(chars[j]) {
                    j += 1;
                }
                let run = j - i;
                while j < n && CLOSERS.contains(&chars[j]) {
                    j += 1;
                }
                cur.extend(&chars[i..j]);

                let boundary = j >= n || chars[j].is_whitespace();
                let abbreviation = c == '.' && run == 1 && ends_with_abbreviation(&cur);
                if boundary && !abbreviation {
                    out.push(std::mem::take(&mut cur));
                }
                i = j;
                continue;
            }

            // blank line = paragraph break
            if c == '\n' {
                let mut j = i + 1;
                while j < n && matches!(chars[j], ' ' | '\t' | '\r') {
                    j += 1;
                }
                if j < n && chars[j] == '\n' {
                    out.push(std::mem::take(&mut cur));
                    i = j + 1;
                    continue;
                }
            }

            cur.push(c);
            i += 1;
        }
        out.push(cur);

        out.into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| s.chars().any(char::is_alphabetic))
            .collect()
    }

    fn words(&self, text: &str) -> Vec<String> {
        text.split_whitespace()
            .filter(|w| w.chars().any(char::is_alphabetic))
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
            .collect()
    }

    fn syllables(&self, word: &str) -> usize {
        let letters: Vec<char> = word
            .chars()
            .filter(|c| c.is_alphabetic())
            .flat_map(char::to_lowercase)
            .collect();
        if letters.is_empty() {
            return 1;
        }

        let mut count = 0usize;
        let mut prev_vowel = false;
        for &c in &letters {
            let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
            if vowel && !prev_vowel {
                count += 1;
            }
            prev_vowel = vowel;
        }
        if letters.last() == Some(&'e') && count > 1 {
            count -= 1;
        }
        count.max(1)
    }
}
