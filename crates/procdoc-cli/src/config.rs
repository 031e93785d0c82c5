//! Tool configuration
//!
//! Resolution order: built-in defaults, then the TOML file, then `PROCDOC_*`
//! environment variables, then command-line flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Parse `text` or `json`, case-insensitive
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Errors loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`ProcdocConfig`]
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Environment variable holds an unusable value
    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },
}

/// procdoc configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcdocConfig {
    /// Root directory of the artifact object store
    pub storage_root: PathBuf,
    /// SQLite URL of the version metadata database
    pub database_url: String,
    /// Per-command timeout in seconds
    pub timeout_secs: u64,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for ProcdocConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("procdoc-storage"),
            database_url: "sqlite:procdoc.db".to_string(),
            timeout_secs: 60,
            log_format: LogFormat::Text,
        }
    }
}

impl ProcdocConfig {
    /// Environment variable names
    pub const ENV_STORAGE_ROOT: &'static str = "PROCDOC_STORAGE_ROOT";
    pub const ENV_DATABASE_URL: &'static str = "PROCDOC_DATABASE_URL";
    pub const ENV_TIMEOUT_SECS: &'static str = "PROCDOC_TIMEOUT_SECS";
    pub const ENV_LOG_FORMAT: &'static str = "PROCDOC_LOG_FORMAT";

    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text; missing keys keep their defaults
    ///
    /// # Errors
    /// Returns error if the text is not valid configuration TOML
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Read a TOML file
    ///
    /// # Errors
    /// Read or parse failure
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults or `path`, then process environment overrides
    ///
    /// # Errors
    /// Read/parse failure or an invalid environment value
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_env_from(|key| std::env::var(key).ok())
    }

    /// Apply `PROCDOC_*` overrides read through `lookup`
    ///
    /// # Errors
    /// Unparseable timeout or log format
    pub fn with_env_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(Self::ENV_STORAGE_ROOT) {
            self.storage_root = PathBuf::from(root);
        }
        if let Some(url) = lookup(Self::ENV_DATABASE_URL) {
            self.database_url = url;
        }
        if let Some(value) = lookup(Self::ENV_TIMEOUT_SECS) {
            self.timeout_secs = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: Self::ENV_TIMEOUT_SECS,
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup(Self::ENV_LOG_FORMAT) {
            self.log_format = LogFormat::parse(&value).ok_or_else(|| ConfigError::InvalidEnv {
                var: Self::ENV_LOG_FORMAT,
                value: value.clone(),
            })?;
        }
        Ok(self)
    }

    /// With storage root
    #[inline]
    #[must_use]
    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = root.into();
        self
    }

    /// With database URL
    #[inline]
    #[must_use]
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    /// With timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// With log format
    #[inline]
    #[must_use]
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Command timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
