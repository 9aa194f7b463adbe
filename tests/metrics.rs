// tests/metrics.rs
use axum::body::{self, Body};
use axum::http::Request;
use http::StatusCode;
use axum::Router;
use tokio::sync::OnceCell;
use tower::ServiceExt;

use terms_guardian::{app_with_handle, Analyzer, AnalyzerHandle};

static APP: OnceCell<Router> = OnceCell::const_new();

// One in-process app per test binary: the Prometheus recorder is global.
async fn app() -> Router {
    APP.get_or_init(|| async {
        app_with_handle(AnalyzerHandle::new(Analyzer::default()))
            .expect("app should build Router in tests")
    })
    .await
    .clone()
}

async fn scrape(app: Router) -> String {
    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn analysis_series_show_up_after_a_run() {
    let app = app().await;

    let r = app
        .clone()
        .oneshot(
            Request::post("/analyze")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"text":"Any dispute shall be resolved by binding arbitration."}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(r.status(), StatusCode::OK);

    let text = scrape(app).await;
    for needle in [
        "analysis_runs_total",
        "analysis_duration_ms",
        "analysis_combined_uri_share",
    ] {
        assert!(text.contains(needle), "metrics exposition missing '{needle}'\n{text}");
    }
}

#[tokio::test]
async fn degraded_uri_is_counted() {
    let app = app().await;

    let r = app
        .clone()
        .oneshot(
            Request::post("/uri")
                .header("content-type", "application/json")
                .body(Body::from("\"not an object\""))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(r.status(), StatusCode::OK);

    let text = scrape(app).await;
    assert!(text.contains("uri_degraded_total"), "no uri_degraded_total\n{text}");
}
