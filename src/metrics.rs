use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder (once per process) and describe the
    /// analysis series. Later calls reuse the installed recorder.
    pub fn init(uri_share: f64) -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| {
                let handle = PrometheusBuilder::new().install_recorder()?;
                describe_counter!("analysis_runs_total", "Documents analyzed");
                describe_counter!(
                    "analysis_model_fallback_total",
                    "Analyses that fell back to rules only"
                );
                describe_counter!("uri_degraded_total", "URI computations that degraded");
                describe_histogram!("analysis_duration_ms", "Pipeline wall time in ms");
                Ok::<_, anyhow::Error>(handle)
            })?
            .clone();

        // Static gauge with the configured URI share of the combined grade
        gauge!("analysis_combined_uri_share").set(uri_share);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
