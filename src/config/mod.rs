pub mod analysis;
pub mod model;
pub mod reload;

pub use analysis::{
    AnalysisConfig, CategoryWeights, DetectionThresholds, GuardrailConfig, ReadabilityConfig,
    RightsConfig, UriConfig,
};
pub use model::{ModelConfig, ModelSourceKind};
pub use reload::{start_hot_reload_thread, AnalyzerHandle};

/// Dev environment: debug build OR SHUTTLE_ENV in {local, development, dev}.
pub fn is_dev_env() -> bool {
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}
