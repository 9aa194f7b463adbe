// tests/classifier_model.rs
//
// The bundled clause model asset and its fusion into rights scoring.

use std::sync::Arc;

use terms_guardian::classify::{ClauseClassifier, ClauseModel, ClauseType};
use terms_guardian::config::ModelConfig;
use terms_guardian::rights::RightsAssessor;

fn bundled() -> ClauseModel {
    let raw = std::fs::read_to_string("assets/clause_model.json").expect("read bundled model");
    ClauseModel::from_json_str(&raw).expect("bundled model validates")
}

fn classifier() -> ClauseClassifier {
    ClauseClassifier::new(Arc::new(bundled()), &ModelConfig::default())
}

#[test]
fn bundled_model_knows_the_four_classes() {
    let m = bundled();
    let names: Vec<&str> = m.class_names().collect();
    assert_eq!(
        names,
        vec!["ARBITRATION", "CLASS_ACTION_WAIVER", "LIABILITY_LIMITATION", "UNILATERAL_CHANGES"]
    );
}

#[test]
fn clause_sentences_outscore_chatter() {
    let m = bundled();
    let preds = m.classify_sentences(&[
        "Any dispute shall be resolved by binding arbitration.",
        "I like cats and dogs.",
    ]);
    assert!(preds[0].proba["ARBITRATION"] > 0.9);
    assert!(preds[1].proba["ARBITRATION"] < 0.1);
    for p in &preds {
        assert!(p.proba.values().all(|v| (0.0..=1.0).contains(v)));
    }
}

#[test]
fn model_catches_what_rules_miss() {
    let text = "In no event shall we be liable for indirect or consequential damages.";
    let a = RightsAssessor::default();

    let rules_only = a.analyze(text, None);
    assert_eq!(rules_only.rights_score, 80.0);
    assert!(!rules_only.details.ml_applied);

    let clf = classifier();
    let fused = a.analyze(text, Some(&clf));
    assert!(fused.details.ml_applied);
    // one inferred LIABILITY_LIMITATION clause at weight -6
    assert_eq!(fused.rights_score, 94.0);
    assert!(fused.details.ml_fused[&ClauseType::LiabilityLimitation] > 0.9);
}

#[test]
fn model_reads_an_unpunctuated_last_sentence() {
    let text = "I like cats. In no event shall we be liable for indirect or consequential damages";
    let fused = RightsAssessor::default().analyze(text, Some(&classifier()));
    assert!(fused.details.ml_applied);
    assert!(fused.details.ml_fused[&ClauseType::LiabilityLimitation] > 0.9);
}

#[test]
fn rule_hits_are_not_double_counted() {
    let text = "Any dispute shall be resolved by binding arbitration.";
    let a = RightsAssessor::default();
    let clf = classifier();
    let fused = a.analyze(text, Some(&clf));
    let rules = a.analyze(text, None);
    assert_eq!(fused.rights_score, rules.rights_score);
    // alpha + (1 - alpha) * p with p close to 1
    assert!(fused.details.ml_fused[&ClauseType::Arbitration] > 0.99);
}

#[test]
fn invalid_assets_are_rejected() {
    for bad in [
        r#"{"vocab":{},"idf":[],"classes":{"A":{"coef":[],"intercept":0.0}}}"#,
        r#"{"vocab":{"a":0},"idf":[1.0],"classes":{}}"#,
        r#"not json"#,
    ] {
        assert!(ClauseModel::from_json_str(bad).is_err(), "{bad}");
    }
}
