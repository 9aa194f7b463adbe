// src/config/model.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{env, fs, path::Path};

pub const DEFAULT_MODEL_CONFIG_PATH: &str = "config/model.json";
pub const ENV_MODEL_CONFIG_PATH: &str = "MODEL_CONFIG_PATH";
pub const ENV_CLAUSE_MODEL_PATH: &str = "CLAUSE_MODEL_PATH";
pub const ENV_CLAUSE_MODEL_URL: &str = "CLAUSE_MODEL_URL";

fn default_fuse_alpha() -> f64 {
    0.65
}
fn default_threshold() -> f64 {
    0.6
}

/// Where the classifier asset comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSourceKind {
    File,
    Http,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub enabled: bool,
    pub source: ModelSourceKind,
    /// Path or URL. "ENV" means: read from CLAUSE_MODEL_PATH / CLAUSE_MODEL_URL (by source).
    pub location: String,
    /// Weight of rule evidence when fused with the model probability.
    #[serde(default = "default_fuse_alpha")]
    pub fuse_alpha: f64,
    /// Per-class decision thresholds on the fused probability.
    #[serde(default)]
    pub thresholds: BTreeMap<String, f64>,
    #[serde(default = "default_threshold")]
    pub default_threshold: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let thresholds = [
            ("ARBITRATION", 0.6),
            ("CLASS_ACTION_WAIVER", 0.6),
            ("LIABILITY_LIMITATION", 0.55),
            ("UNILATERAL_CHANGES", 0.55),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            enabled: false,
            source: ModelSourceKind::File,
            location: "assets/clause_model.json".to_string(),
            fuse_alpha: default_fuse_alpha(),
            thresholds,
            default_threshold: default_threshold(),
        }
    }
}

impl ModelConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read model config at {}: {}", path.display(), e)
        })?;
        Self::from_json_str(&data)
    }

    /// MODEL_CONFIG_PATH or "config/model.json".
    pub fn resolve_path() -> std::path::PathBuf {
        env::var(ENV_MODEL_CONFIG_PATH)
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|_| std::path::PathBuf::from(DEFAULT_MODEL_CONFIG_PATH))
    }

    pub fn from_json_str(data: &str) -> anyhow::Result<Self> {
        let mut cfg: ModelConfig = serde_json::from_str(data)?;

        // Resolve location if "ENV"
        if cfg.location.trim().eq_ignore_ascii_case("env") {
            cfg.location = match cfg.source {
                ModelSourceKind::File => env::var(ENV_CLAUSE_MODEL_PATH)
                    .map_err(|_| anyhow::anyhow!("Missing {ENV_CLAUSE_MODEL_PATH} env var"))?,
                ModelSourceKind::Http => env::var(ENV_CLAUSE_MODEL_URL)
                    .map_err(|_| anyhow::anyhow!("Missing {ENV_CLAUSE_MODEL_URL} env var"))?,
            };
        }

        // Sanitize probabilities
        if !(0.0..=1.0).contains(&cfg.fuse_alpha) {
            cfg.fuse_alpha = default_fuse_alpha();
        }
        if !(0.0..=1.0).contains(&cfg.default_threshold) {
            cfg.default_threshold = default_threshold();
        }
        for v in cfg.thresholds.values_mut() {
            if !v.is_finite() {
                *v = default_threshold();
            }
            *v = v.clamp(0.0, 1.0);
        }
        cfg.thresholds = std::mem::take(&mut cfg.thresholds)
            .into_iter()
            .map(|(k, v)| (k.trim().to_ascii_uppercase(), v))
            .collect();

        Ok(cfg)
    }

    pub fn threshold_for(&self, class: &str) -> f64 {
        self.thresholds
            .get(class)
            .copied()
            .unwrap_or(self.default_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_sanitizes() {
        let cfg = ModelConfig::from_json_str(
            r#"{"enabled": true, "source": "file", "location": "m.json",
                "fuse_alpha": 4.0, "thresholds": {"arbitration": 1.7}}"#,
        )
        .unwrap();
        assert!(cfg.enabled);
        assert_eq!(cfg.fuse_alpha, 0.65);
        assert_eq!(cfg.threshold_for("ARBITRATION"), 1.0);
        assert_eq!(cfg.threshold_for("CLASS_ACTION_WAIVER"), 0.6);
    }

    #[test]
    fn default_is_disabled_with_known_thresholds() {
        let cfg = ModelConfig::default();
        assert!(!cfg.enabled);
        assert_eq!(cfg.threshold_for("LIABILITY_LIMITATION"), 0.55);
    }
}
