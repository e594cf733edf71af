use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::constants;
use crate::error::{EtlError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: constants::DEFAULT_BASE_URL.to_string(),
            timeout_seconds: constants::DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: constants::DEFAULT_OUTPUT_DIR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: String,
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: constants::DEFAULT_LOG_DIR.to_string(),
            file_name: constants::DEFAULT_LOG_FILE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from `etl.toml` when no path is given.
    ///
    /// A missing default file yields the built-in defaults; a missing file that
    /// was asked for explicitly is an error. Environment overrides are applied
    /// afterwards.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(constants::DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(constants::DEFAULT_CONFIG_PATH)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_file(config_path: &str) -> Result<Self> {
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            EtlError::Config(format!("Failed to read config file '{}': {}", config_path, e))
        })?;
        Self::from_toml_str(&config_content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.source.base_url.trim().is_empty() {
            return Err(EtlError::Config("source.base_url must not be empty".into()));
        }
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_non_empty("ETL_SOURCE_BASE_URL") {
            self.source.base_url = v;
        }
        if let Some(v) = env_non_empty("ETL_OUTPUT_DIR") {
            self.output.dir = v;
        }
        if let Some(v) = env_non_empty("ETL_LOG_DIR") {
            self.logging.dir = v;
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}
