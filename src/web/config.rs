use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        WebConfig {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_user_tle")]
    pub user_tle: PathBuf,
    #[serde(default = "default_catalog")]
    pub catalog: PathBuf,
    #[serde(default = "default_results")]
    pub results: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            user_tle: default_user_tle(),
            catalog: default_catalog(),
            results: default_results(),
        }
    }
}

fn default_user_tle() -> PathBuf {
    PathBuf::from("data/user_tle.csv")
}

fn default_catalog() -> PathBuf {
    PathBuf::from("data/tle_data.csv")
}

fn default_results() -> PathBuf {
    PathBuf::from("data/predictions.json")
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            path: default_model_path(),
        }
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/conjunction_model.json")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Scan window length from the moment a run starts, e.g. "48h".
    #[serde(default = "default_window", deserialize_with = "duration_from_str")]
    pub window: Duration,
    #[serde(default = "default_coarse_step", deserialize_with = "duration_from_str")]
    pub coarse_step: Duration,
    #[serde(default = "default_fine_step", deserialize_with = "duration_from_str")]
    pub fine_step: Duration,
    #[serde(default = "default_threshold_km")]
    pub threshold_km: f64,
    /// Cap on catalog satellites per run; unset scans the whole catalog.
    #[serde(default)]
    pub catalog_limit: Option<usize>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            window: default_window(),
            coarse_step: default_coarse_step(),
            fine_step: default_fine_step(),
            threshold_km: default_threshold_km(),
            catalog_limit: None,
        }
    }
}

fn default_window() -> Duration {
    Duration::from_secs(48 * 3600)
}

fn default_coarse_step() -> Duration {
    Duration::from_secs(3600)
}

fn default_fine_step() -> Duration {
    Duration::from_secs(60)
}

fn default_threshold_km() -> f64 {
    100.0
}

fn duration_from_str<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let duration = humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)?;
    if duration.is_zero() {
        return Err(serde::de::Error::custom(format!(
            "duration '{s}' must be positive"
        )));
    }
    Ok(duration)
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file if present, otherwise fall back to defaults.
    pub fn load_or_default(path: &str) -> Result<Self, ConfigError> {
        if std::path::Path::new(path).exists() {
            Self::from_file(path)
        } else {
            log::info!("config file {path} not found, using defaults");
            Ok(Config::default())
        }
    }
}
