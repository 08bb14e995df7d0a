//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Prediction service used when nothing else is configured
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

/// Per-request timeout used when nothing else is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Link placed in share summaries
pub const DEFAULT_RESULTS_URL: &str = "http://localhost:5173/results";

pub const ENV_CONFIG: &str = "IPO_INTAKE_CONFIG";
pub const ENV_SERVICE_URL: &str = "IPO_INTAKE_SERVICE_URL";
pub const ENV_TIMEOUT: &str = "IPO_INTAKE_TIMEOUT";
pub const ENV_STORE: &str = "IPO_INTAKE_STORE";

/// Valid configuration keys with a short description
pub const VALID_KEYS: &[(&str, &str)] = &[
    ("service_url", "Base URL of the prediction service"),
    ("timeout_secs", "Per-request timeout in seconds"),
    ("store_path", "File holding the latest submission outcome"),
    ("results_url", "Link included in share summaries"),
    ("report_dir", "Default directory for exported reports"),
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Intake configuration with layered hierarchy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults are applied by the accessors

        // 2. Global user config
        if let Some(path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&path) {
                config.merge(global);
            }
        }

        // 3. Environment variables
        config.merge(Self::from_env());

        config
    }

    /// Path of the global config file, honouring `IPO_INTAKE_CONFIG`
    pub fn global_config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(ENV_CONFIG).filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }
        directories::ProjectDirs::from("", "", "ipo-intake")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    fn read_file(path: &Path) -> Option<Config> {
        let contents = std::fs::read_to_string(path).ok()?;
        if contents.trim().is_empty() {
            return None;
        }
        match serde_yml::from_str::<Config>(&contents) {
            Ok(mut config) => {
                debug!(path = %path.display(), "loaded config file");
                if config.timeout_secs == Some(0) {
                    warn!(path = %path.display(), "ignoring timeout_secs: 0");
                    config.timeout_secs = None;
                }
                Some(config)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                None
            }
        }
    }

    fn from_env() -> Config {
        let mut config = Config::default();
        if let Ok(url) = std::env::var(ENV_SERVICE_URL) {
            config.service_url = Some(url);
        }
        if let Ok(raw) = std::env::var(ENV_TIMEOUT) {
            match parse_timeout(&raw) {
                Ok(secs) => config.timeout_secs = Some(secs),
                Err(e) => warn!(error = %e, "ignoring {}", ENV_TIMEOUT),
            }
        }
        if let Some(path) = std::env::var_os(ENV_STORE).filter(|p| !p.is_empty()) {
            config.store_path = Some(PathBuf::from(path));
        }
        config
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.service_url.is_some() {
            self.service_url = other.service_url;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.store_path.is_some() {
            self.store_path = other.store_path;
        }
        if other.results_url.is_some() {
            self.results_url = other.results_url;
        }
        if other.report_dir.is_some() {
            self.report_dir = other.report_dir;
        }
    }

    pub fn service_url(&self) -> &str {
        self.service_url.as_deref().unwrap_or(DEFAULT_SERVICE_URL)
    }

    pub fn timeout(&self) -> Duration {
        let secs = self
            .timeout_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    pub fn results_url(&self) -> &str {
        self.results_url.as_deref().unwrap_or(DEFAULT_RESULTS_URL)
    }

    /// Where reports go when no destination is given
    pub fn report_dir(&self) -> PathBuf {
        self.report_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Effective value of a key as text, if set or defaulted
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(match key {
            "service_url" => Some(self.service_url().to_string()),
            "timeout_secs" => Some(self.timeout().as_secs().to_string()),
            "store_path" => self.store_path.as_ref().map(|p| p.display().to_string()),
            "results_url" => Some(self.results_url().to_string()),
            "report_dir" => Some(self.report_dir().display().to_string()),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        })
    }

    /// Check a key/value pair and convert it to the YAML value stored on disk
    pub fn yaml_value(key: &str, value: &str) -> Result<serde_yml::Value, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        match key {
            "service_url" | "results_url" => {
                if value.starts_with("http://") || value.starts_with("https://") {
                    Ok(serde_yml::Value::String(value.to_string()))
                } else {
                    Err(invalid("must start with http:// or https://"))
                }
            }
            "timeout_secs" => parse_timeout(value)
                .map(|secs| serde_yml::Value::Number(secs.into()))
                .map_err(|_| invalid("must be a positive whole number of seconds")),
            "store_path" | "report_dir" => {
                if value.trim().is_empty() {
                    Err(invalid("must not be empty"))
                } else {
                    Ok(serde_yml::Value::String(value.to_string()))
                }
            }
            other => Err(ConfigError::UnknownKey(other.to_string())),
        }
    }
}

fn parse_timeout(raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidValue {
            key: "timeout_secs".to_string(),
            value: raw.to_string(),
            reason: "must be a positive whole number of seconds".to_string(),
        }),
    }
}
