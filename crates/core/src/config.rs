//! Configuration management
//!
//! Loads and saves the s3walk configuration file, stored in TOML format at
//! ~/.config/s3walk/config.toml. Every value has a default, so the file is
//! optional; CLI flags override whatever is loaded.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::walker::{DEFAULT_MAX_DEPTH, DEFAULT_WORKERS};

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Default output format
const DEFAULT_OUTPUT: &str = "human";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Default settings
    #[serde(default)]
    pub defaults: Defaults,

    /// Backoff policy for listing calls
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Endpoint override for S3-compatible backends
    #[serde(default)]
    pub endpoint: Endpoint,

    /// Static credentials; when absent the SDK's default provider chain is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
}

/// Default settings for CLI behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Degree of parallelism (worker count)
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Levels of hierarchical expansion before flat listing
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Output format: "human" or "json"
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable colored output
    #[serde(default = "default_color")]
    pub color: bool,
}

/// Endpoint configuration for S3-compatible backends
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Endpoint {
    /// Endpoint URL; when absent the SDK resolves the AWS endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Region name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Use path-style addressing (required by most non-AWS backends)
    #[serde(default)]
    pub force_path_style: bool,
}

/// Static access credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Access key ID
    pub access_key: String,

    /// Secret access key
    pub secret_key: String,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn default_jobs() -> usize {
    DEFAULT_WORKERS
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_color() -> bool {
    true
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            max_depth: default_max_depth(),
            output: default_output(),
            color: default_color(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            retry: RetryPolicy::default(),
            endpoint: Endpoint::default(),
            credentials: None,
        }
    }
}

impl Config {
    /// Validate field values that serde cannot check
    pub fn validate(&self) -> Result<()> {
        if self.defaults.jobs == 0 {
            return Err(Error::Config("jobs must be at least 1".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config("retry.max_attempts must be at least 1".into()));
        }
        if self.defaults.output != "human" && self.defaults.output != "json" {
            return Err(Error::Config(format!(
                "unknown output format '{}', expected 'human' or 'json'",
                self.defaults.output
            )));
        }
        if let Some(url) = &self.endpoint.url {
            url::Url::parse(url)?;
        }
        Ok(())
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        let config_path = config_dir.join("s3walk").join("config.toml");
        Ok(Self { config_path })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns the default
    /// configuration. A schema version newer than this binary understands is
    /// an error rather than a silent misread.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let contents = std::fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&contents)?;

        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "config schema version {} is newer than supported version {}",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to disk, creating parent directories as needed
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, contents)?;
        Ok(())
    }
}
