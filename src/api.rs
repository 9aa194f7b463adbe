use std::sync::Arc;

use serde_json::{json, Value};
use shuttle_axum::axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::config::AnalyzerHandle;
use crate::engine::MAX_INPUT_BYTES;
use crate::history::History;
use crate::report::{Report, ReportFingerprint};
use crate::text::InputKind;
use crate::uri::UriResult;

/// Fingerprints served by `/debug/history`.
const HISTORY_VIEW: usize = 10;

/// Request body cap. Leaves room for JSON escaping of a maximal document so
/// oversized text reaches the engine's own size check (422) instead of a 413.
pub const MAX_BODY_BYTES: usize = 2 * MAX_INPUT_BYTES;

#[derive(Clone)]
pub struct AppState {
    pub analyzer: AnalyzerHandle,
    pub history: Arc<History>,
}

impl AppState {
    pub fn new(analyzer: AnalyzerHandle) -> Self {
        Self {
            analyzer,
            history: Arc::new(History::default()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/analyze", post(analyze))
        .route("/uri", post(compute_uri))
        .route("/debug/history", get(debug_history))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Error body: `{"error": "..."}`.
struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

#[derive(serde::Deserialize)]
struct AnalyzeReq {
    text: String,
    #[serde(default)]
    kind: InputKind,
}

async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeReq>,
) -> Result<Json<Report>, ApiError> {
    let analyzer = state.analyzer.current();
    let report = analyzer
        .analyze_input(&body.text, body.kind)
        .await
        .map_err(|e| {
            warn!(target: "api", error = %e, "analyze rejected");
            ApiError(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        })?;
    state.history.push(&report);
    Ok(Json(report))
}

/// Raw upstream analysis in, index out. Malformed input yields a degraded
/// result with `error`, never a 5xx.
async fn compute_uri(State(state): State<AppState>, Json(body): Json<Value>) -> Json<UriResult> {
    let analyzer = state.analyzer.current();
    Json(analyzer.uri().compute(&body))
}

async fn debug_history(State(state): State<AppState>) -> Json<Vec<ReportFingerprint>> {
    Json(state.history.snapshot_last_n(HISTORY_VIEW))
}
