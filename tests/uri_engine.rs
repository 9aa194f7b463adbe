// tests/uri_engine.rs
//
// User Rights Index over the public JSON boundary: random upstream shapes,
// degraded inputs, guardrail and combined grade.

use rand::{rngs::StdRng, seq::IndexedRandom, Rng, SeedableRng};
use serde_json::{json, Map, Value};

use terms_guardian::config::{AnalysisConfig, UriConfig};
use terms_guardian::grade::GradeScale;
use terms_guardian::uri::UriInput;
use terms_guardian::{Category, Grade, UserRightsIndex};

const KEYS: &[&str] = &[
    "DISPUTE_RESOLUTION",
    "CLASS_ACTIONS",
    "UNILATERAL_CHANGES",
    "DATA_PRACTICES",
    "BILLING_AND_AUTORENEWAL",
    "CONTENT_AND_IP",
    "LIABILITY_AND_REMEDIES",
    "RETENTION_AND_DELETION",
    "CONSENT_AND_OPT_OUT",
    "ACCOUNT_MANAGEMENT",
    "ALGORITHMIC_DECISIONS",
    "SOMETHING_ELSE",
];

fn random_scores(rng: &mut StdRng) -> Value {
    let mut m = Map::new();
    for _ in 0..rng.random_range(0..6) {
        let key = *KEYS.choose(rng).expect("keys");
        let score: f64 = rng.random_range(-40.0..160.0);
        m.insert(key.to_string(), json!({ "score": score, "raw": score - 100.0 }));
    }
    Value::Object(m)
}

fn random_analysis(rng: &mut StdRng) -> Value {
    let mut ml = Map::new();
    for _ in 0..rng.random_range(0..4) {
        let key = *KEYS.choose(rng).expect("keys");
        let p: f64 = rng.random_range(0.0..1.0);
        if rng.random_bool(0.5) {
            ml.insert(key.to_string(), json!(p));
        } else {
            ml.insert(key.to_string(), json!({ "probability": p, "observations": rng.random_range(0..3) }));
        }
    }
    let sections: Vec<Value> = (0..rng.random_range(0..5))
        .map(|_| json!({ "rights": { "categoryScores": random_scores(rng) } }))
        .collect();
    json!({
        "readability": { "normalizedScore": rng.random_range(-20.0..130.0) },
        "rightsDetails": { "details": {
            "categoryScores": random_scores(rng),
            "mlCategoryScores": Value::Object(ml),
        } },
        "sections": sections,
    })
}

#[test]
fn random_inputs_stay_in_range_and_graded() {
    let engines = [
        UserRightsIndex::default(),
        UserRightsIndex::new(UriConfig {
            guardrail: terms_guardian::config::GuardrailConfig {
                enabled: true,
                ..Default::default()
            },
            ..UriConfig::default()
        }),
    ];
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);

    for _ in 0..300 {
        let analysis = random_analysis(&mut rng);
        for engine in &engines {
            let r = engine.compute(&analysis);
            assert!(r.error.is_none(), "{:?}", r.error);
            assert_eq!(r.categories.len(), Category::ALL.len());
            assert!((0.0..=100.0).contains(&r.weighted_score), "{}", r.weighted_score);
            assert_eq!(r.grade, GradeScale::URI.grade(r.weighted_score));
            for (cat, c) in &r.categories {
                assert!((0.0..=100.0).contains(&c.score), "{cat:?} {}", c.score);
                assert_eq!(c.grade, GradeScale::URI.grade(c.score));
                assert!((-1..=1).contains(&c.sentiment));
            }
        }
    }
}

#[test]
fn compute_is_idempotent() {
    let uri = UserRightsIndex::default();
    let mut rng = StdRng::seed_from_u64(0x1De);

    for _ in 0..100 {
        let analysis = random_analysis(&mut rng);
        let first = uri.compute(&analysis);
        assert_eq!(first, uri.compute(&analysis));

        let input: UriInput = serde_json::from_value(analysis).expect("generated analysis parses");
        let typed = uri.compute_input(&input);
        assert_eq!(typed, uri.compute_input(&input));
        assert_eq!(typed, first);
    }

    let bad = json!("nope");
    assert_eq!(uri.compute(&bad), uri.compute(&bad));
}

#[test]
fn non_objects_and_bad_shapes_degrade() {
    let uri = UserRightsIndex::default();
    for bad in [
        json!(null),
        json!([1, 2, 3]),
        json!("text"),
        json!({ "unrelated": true }),
        json!({ "rightsDetails": { "details": { "categoryScores": "oops" } } }),
    ] {
        let r = uri.compute(&bad);
        assert!(r.is_degraded(), "{bad}");
        assert_eq!(r.weighted_score, 50.0);
        assert_eq!(r.grade, Grade::C);
        assert!(r.categories.is_empty());
    }
}

#[test]
fn harmful_dispute_terms_pull_the_index_down() {
    let uri = UserRightsIndex::default();
    let neutral = uri.compute(&json!({ "sections": [] }));
    let harmful = uri.compute(&json!({
        "rightsDetails": { "details": { "categoryScores": {
            "DISPUTE_RESOLUTION": { "score": 20 },
            "DATA_PRACTICES": { "score": 30 }
        } } }
    }));
    assert_eq!(neutral.weighted_score, 50.0);
    assert!(harmful.weighted_score < neutral.weighted_score);
    let dr = &harmful.categories[&Category::DisputeResolution];
    assert_eq!(dr.sentiment, -1);
    assert_eq!(dr.grade, Grade::F);
}

#[test]
fn combined_grade_blends_uri_and_readability() {
    let uri = UserRightsIndex::default();
    let c = uri.combined_grade(Some(80.0), Some(60.0));
    // 0.7 * 80 + 0.3 * 60 = 74
    assert_eq!(c.combined_score, 74.0);
    assert_eq!(c.grade, Grade::B);
    let missing = uri.combined_grade(None, None);
    assert_eq!(missing.combined_score, 50.0);
}

#[test]
fn weights_must_sum_to_one() {
    let mut cfg = AnalysisConfig::default();
    cfg.uri.weights.dispute_resolution = 0.5;
    assert!(cfg.validate().is_err());
    assert!(AnalysisConfig::default().validate().is_ok());
}
