use chrono::NaiveDate;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default TOML file consulted when no `--config` path is given.
pub const DEFAULT_CONFIG_FILE: &str = "scorer.toml";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ModelConfig {
    pub path: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: "models/marketing_pipeline.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FeatureConfig {
    /// Date `DaysSinceEnroll` is measured against, `YYYY-MM-DD`.
    pub enroll_reference_date: String,
    /// Pins the year used for `Age`; the local clock is used when unset.
    #[serde(default)]
    pub current_year: Option<i32>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            enroll_reference_date: "2024-01-01".to_string(),
            current_year: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ScorerConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ScorerConfig {
    pub fn enroll_reference(&self) -> Result<NaiveDate, figment::Error> {
        NaiveDate::parse_from_str(&self.features.enroll_reference_date, "%Y-%m-%d").map_err(|e| {
            figment::Error::from(format!(
                "features.enroll_reference_date '{}' is not YYYY-MM-DD: {e}",
                self.features.enroll_reference_date
            ))
        })
    }
}

/// Layered configuration: defaults, then the TOML file, then `SCORER_*`
/// environment variables (`SCORER_SERVER__PORT=9000`).
pub fn load_config(path: Option<&Path>) -> Result<ScorerConfig, figment::Error> {
    let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    let figment = Figment::from(Serialized::defaults(ScorerConfig::default()))
        .merge(Toml::file(file))
        .merge(Env::prefixed("SCORER_").split("__"));

    let config: ScorerConfig = figment.extract()?;

    if config.model.path.trim().is_empty() {
        return Err(figment::Error::from("model.path must be set".to_string()));
    }
    config.enroll_reference()?;

    Ok(config)
}
