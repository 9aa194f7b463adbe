// src/lib.rs
// Public library surface for the server, the CLI and integration tests.

pub mod api;
pub mod classify;
pub mod config;
pub mod engine;
pub mod grade;
pub mod history;
pub mod legal;
pub mod metrics;
pub mod readability;
pub mod report;
pub mod rights;
pub mod summarize;
pub mod text;
pub mod uri;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::{start_hot_reload_thread, AnalysisConfig, AnalyzerHandle, ModelConfig};
pub use crate::engine::Analyzer;
pub use crate::grade::Grade;
pub use crate::report::Report;
pub use crate::uri::{Category, UriResult, UserRightsIndex};

use axum::Router;

/// Full HTTP app over an existing handle: API routes plus `/metrics`.
pub fn app_with_handle(handle: AnalyzerHandle) -> anyhow::Result<Router> {
    let metrics =
        crate::metrics::Metrics::init(handle.current().config().uri.combined_uri_share)?;
    Ok(router(AppState::new(handle)).merge(metrics.router()))
}

/// Full HTTP app with configuration loaded from the default locations.
pub async fn app() -> anyhow::Result<Router> {
    let analyzer = Analyzer::from_files()?;
    app_with_handle(AnalyzerHandle::new(analyzer))
}
