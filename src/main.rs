//! Terms Guardian service: binary entrypoint.
//! Boots the Axum HTTP server with the analysis pipeline, metrics and
//! optional config hot reload.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use terms_guardian::config::{is_dev_env, AnalysisConfig};
use terms_guardian::engine::ENV_ANALYSIS_DEV_LOG;
use terms_guardian::{app_with_handle, start_hot_reload_thread, Analyzer, AnalyzerHandle};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - ANALYSIS_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var(ENV_ANALYSIS_DEV_LOG)
        .ok()
        .is_some_and(|v| v == "1");
    if !(dev_flag && is_dev_env()) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("engine=info,config=info,classify=info,api=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let analyzer = Analyzer::from_files()
        .map_err(|e| shuttle_runtime::Error::Custom(e.context("failed to load analysis config")))?;
    let handle = AnalyzerHandle::new(analyzer);

    // If hot reload is enabled, spawn background watcher
    start_hot_reload_thread(handle.clone(), AnalysisConfig::resolve_path());

    let router = app_with_handle(handle).map_err(shuttle_runtime::Error::Custom)?;
    Ok(router.into())
}
