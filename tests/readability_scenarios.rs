//! Readability grader scenarios + property checks over seeded random text.

use rand::{rngs::StdRng, seq::IndexedRandom, Rng, SeedableRng};

use terms_guardian::config::ReadabilityConfig;
use terms_guardian::readability::ReadabilityGrader;
use terms_guardian::Grade;

const SHORT_WORDS: &[&str] = &["we", "you", "can", "use", "the", "app", "cat", "data", "pay", "stop"];
const LONG_WORDS: &[&str] = &[
    "indemnification",
    "notwithstanding",
    "jurisdictional",
    "representations",
    "consequential",
    "authorization",
    "interpretation",
];

fn random_text(rng: &mut StdRng, sentences: usize, vocab: &[&str]) -> String {
    let mut out = String::new();
    for _ in 0..sentences {
        let len = rng.random_range(3..15);
        let words: Vec<&str> = (0..len)
            .map(|_| *vocab.choose(rng).expect("non-empty vocab"))
            .collect();
        out.push_str(&words.join(" "));
        out.push_str(". ");
    }
    out
}

#[test]
fn plain_text_outgrades_dense_legalese() {
    let g = ReadabilityGrader::default();
    let plain = g.grade("You can stop using the app at any time. We will not sell your data. Ask us if you have questions.");
    let dense = g.grade(
        "Notwithstanding the foregoing, the indemnification obligations hereunder shall survive termination \
         and shall encompass consequential, incidental and exemplary damages attributable to unauthorized \
         utilization of proprietary intellectual property representations.",
    );
    assert!(plain.flesch > dense.flesch);
    assert!(plain.kincaid < dense.kincaid);
    assert!(plain.average_grade < dense.average_grade, "{:?} vs {:?}", plain.average_grade, dense.average_grade);
    assert_eq!(dense.average_grade, Grade::F);
    assert_eq!(dense.normalized_score, 0.0);
}

#[test]
fn metrics_stay_finite_and_normalized_for_random_text() {
    let g = ReadabilityGrader::default();
    let mut rng = StdRng::seed_from_u64(0x7e57);
    let mixed: Vec<&str> = SHORT_WORDS.iter().chain(LONG_WORDS).copied().collect();

    for _ in 0..200 {
        let n = rng.random_range(1..12);
        let text = random_text(&mut rng, n, &mixed);
        let r = g.grade(&text);
        assert!(r.flesch.is_finite() && r.kincaid.is_finite() && r.fog_index.is_finite());
        assert!((0.0..=100.0).contains(&r.normalized_score), "{}", r.normalized_score);
        assert!((0.0..=1.0).contains(&r.confidence));
        assert!(r.word_count > 0);
        assert_ne!(r.average_grade, Grade::NotApplicable);
    }
}

#[test]
fn longer_words_never_read_easier() {
    let g = ReadabilityGrader::default();
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..50 {
        let n = rng.random_range(2..8);
        let short = g.grade(&random_text(&mut rng, n, SHORT_WORDS));
        let long = g.grade(&random_text(&mut rng, n, LONG_WORDS));
        assert!(short.average_syllables_per_word < long.average_syllables_per_word);
        assert!(short.flesch > long.flesch);
    }
}

#[test]
fn longer_sentences_read_harder_at_equal_syllables() {
    let g = ReadabilityGrader::default();
    let mut rng = StdRng::seed_from_u64(0x5e17);
    let mixed: Vec<&str> = SHORT_WORDS.iter().chain(LONG_WORDS).copied().collect();

    for _ in 0..100 {
        // same words per sentence, each sentence doubled: syllables per word
        // stay put while sentence length grows
        let sentences: Vec<Vec<&str>> = (0..rng.random_range(1..8))
            .map(|_| {
                (0..rng.random_range(3..10))
                    .map(|_| *mixed.choose(&mut rng).expect("non-empty vocab"))
                    .collect()
            })
            .collect();
        let short: String = sentences.iter().map(|s| format!("{}. ", s.join(" "))).collect();
        let long: String = sentences
            .iter()
            .map(|s| format!("{} {}. ", s.join(" "), s.join(" ")))
            .collect();

        let (a, b) = (g.grade(&short), g.grade(&long));
        assert_eq!(a.sentence_count, b.sentence_count);
        assert_eq!(a.average_syllables_per_word, b.average_syllables_per_word);
        assert!(b.average_sentence_length > a.average_sentence_length);
        assert!(b.flesch < a.flesch, "{} !< {}", b.flesch, a.flesch);
        assert!(b.kincaid > a.kincaid, "{} !> {}", b.kincaid, a.kincaid);
    }
}

#[test]
fn confidence_grows_with_length_then_saturates() {
    let g = ReadabilityGrader::new(ReadabilityConfig {
        confidence_saturation_words: 100.0,
        ..ReadabilityConfig::default()
    });
    let mut last = 0.0;
    for reps in [1usize, 5, 10, 20, 40, 80] {
        let text = "We keep your data safe. ".repeat(reps);
        let c = g.grade(&text).confidence;
        assert!(c >= last, "confidence dropped at {reps}: {c} < {last}");
        last = c;
    }
    assert_eq!(last, 1.0);
}

#[test]
fn grade_bands_follow_kincaid() {
    let cfg = ReadabilityConfig::default();
    assert_eq!(cfg.grade_for(-2.0), Grade::A);
    assert_eq!(cfg.grade_for(7.5), Grade::B);
    assert_eq!(cfg.grade_for(12.9), Grade::C);
    assert_eq!(cfg.grade_for(15.0), Grade::D);
    assert_eq!(cfg.grade_for(28.9), Grade::F);
}
