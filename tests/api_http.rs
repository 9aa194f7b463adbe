// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - POST /analyze  (text + html, bad payloads, body size limits)
// - POST /uri
// - GET /debug/history

use serde_json::json;
use serde_json::Value as Json;
use shuttle_axum::axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt as _; // for `oneshot`

use terms_guardian::{api, Analyzer, AnalyzerHandle, AppState};

const BODY_LIMIT: usize = 64 * 1024 * 1024;

/// Router over the built-in policy (rules only, no files needed).
fn test_router() -> Router {
    api::router(AppState::new(AnalyzerHandle::new(Analyzer::default())))
}

async fn read_json(resp: shuttle_axum::axum::response::Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

fn post_json(uri: &str, payload: &Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST")
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = test_router().oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    assert_eq!(String::from_utf8_lossy(&bytes).trim(), "OK");
}

#[tokio::test]
async fn api_analyze_returns_report_fields() {
    let payload = json!({
        "text": "Terms of Service\n\n1. Disputes\nAny dispute shall be resolved by binding arbitration. You waive any right to a class action.\n"
    });
    let resp = test_router()
        .oneshot(post_json("/analyze", &payload))
        .await
        .expect("oneshot /analyze");
    assert_eq!(resp.status(), StatusCode::OK);

    let v = read_json(resp).await;
    // Contract checks for UI consumers
    for key in ["readability", "rights", "userRightsIndex", "summary", "combinedGrade", "metadata"] {
        assert!(v.get(key).is_some(), "missing '{key}'");
    }
    let score = v["userRightsIndex"]["weightedScore"].as_f64().expect("weightedScore");
    assert!((0.0..=100.0).contains(&score));
    assert_eq!(v["metadata"]["modelLoaded"], json!(false));
}

#[tokio::test]
async fn api_analyze_accepts_html_kind() {
    let payload = json!({
        "text": "<p>We may terminate your account without notice.</p>",
        "kind": "html"
    });
    let resp = test_router()
        .oneshot(post_json("/analyze", &payload))
        .await
        .expect("oneshot /analyze html");
    assert_eq!(resp.status(), StatusCode::OK);
    let v = read_json(resp).await;
    assert!(v["metadata"]["wordCount"].as_u64().expect("wordCount") > 0);
}

#[tokio::test]
async fn api_analyze_rejects_missing_text() {
    let resp = test_router()
        .oneshot(post_json("/analyze", &json!({ "body": "nope" })))
        .await
        .expect("oneshot /analyze bad");
    assert!(resp.status().is_client_error(), "got {}", resp.status());
}

#[tokio::test]
async fn api_uri_degrades_instead_of_failing() {
    let app = test_router();

    let ok = app
        .clone()
        .oneshot(post_json(
            "/uri",
            &json!({
                "readability": { "normalizedScore": 78 },
                "rightsDetails": { "details": { "categoryScores": { "DATA_PRACTICES": { "score": 65 } } } },
                "sections": []
            }),
        ))
        .await
        .expect("oneshot /uri");
    assert_eq!(ok.status(), StatusCode::OK);
    let v = read_json(ok).await;
    assert_eq!(v["categories"]["DATA_COLLECTION_USE"]["score"], json!(65.0));
    assert!(v.get("error").is_none());

    let bad = app
        .oneshot(post_json("/uri", &json!([1, 2, 3])))
        .await
        .expect("oneshot /uri bad");
    assert_eq!(bad.status(), StatusCode::OK);
    let v = read_json(bad).await;
    assert_eq!(v["weightedScore"], json!(50.0));
    assert_eq!(v["grade"], json!("C"));
    assert!(v["error"].is_string());
}

#[tokio::test]
async fn api_history_records_fingerprints_without_text() {
    let app = test_router();
    for text in ["We may modify these terms.", "We do not sell personal data."] {
        let resp = app
            .clone()
            .oneshot(post_json("/analyze", &json!({ "text": text })))
            .await
            .expect("oneshot /analyze");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let req = Request::builder()
        .uri("/debug/history")
        .body(Body::empty())
        .expect("build GET /debug/history");
    let resp = app.oneshot(req).await.expect("oneshot /debug/history");
    assert_eq!(resp.status(), StatusCode::OK);

    let v = read_json(resp).await;
    let rows = v.as_array().expect("array");
    assert_eq!(rows.len(), 2);
    let raw = v.to_string();
    assert!(!raw.contains("modify these terms"));
    assert!(rows[0]["documentId"].as_str().is_some_and(|id| id.len() == 12));
}

#[tokio::test]
async fn api_analyze_accepts_documents_above_the_default_body_limit() {
    // ~3 MB: above axum's 2 MB default, below the 5 MiB document cap
    let text = "We store data for 30 days. ".repeat(116_000);
    assert!(text.len() > 3_000_000);
    let resp = test_router()
        .oneshot(post_json("/analyze", &json!({ "text": text })))
        .await
        .expect("oneshot /analyze large");
    assert_eq!(resp.status(), StatusCode::OK);
    let v = read_json(resp).await;
    assert!(v["metadata"]["wordCount"].as_u64().expect("wordCount") > 500_000);
}

#[tokio::test]
async fn api_analyze_rejects_oversized_documents_with_422() {
    let text = "a".repeat(terms_guardian::engine::MAX_INPUT_BYTES + 1);
    let resp = test_router()
        .oneshot(post_json("/analyze", &json!({ "text": text })))
        .await
        .expect("oneshot /analyze oversized");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let v = read_json(resp).await;
    assert!(v["error"].as_str().is_some_and(|e| e.contains("too large")));
}
