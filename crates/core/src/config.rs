use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Default model identifier used until the user picks one
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Name of the per-user data directory under `$HOME`
const DATA_DIR_NAME: &str = ".peditor";

/// Generation backend selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// Any OpenAI-compatible chat completions endpoint
    #[serde(rename = "openai")]
    OpenAi {
        /// Base URL for the API
        #[serde(default = "default_openai_base_url")]
        base_url: String,
    },
    /// Scripted responses, for demos and offline work
    #[serde(rename = "mock")]
    Mock {
        /// TOML file with `[[responses]]` entries (optional)
        #[serde(default)]
        responses_file: Option<PathBuf>,
        /// Delay between emitted fragments
        #[serde(default)]
        fragment_delay_ms: u64,
    },
}

impl ProviderConfig {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderConfig::OpenAi { .. } => "openai",
            ProviderConfig::Mock { .. } => "mock",
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::OpenAi { base_url: default_openai_base_url() }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

/// Defaults and limits for generation calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Maximum silence between fragments before the call fails (unset: wait forever)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Model used when no model has been stored in settings
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Temperature used when none has been stored in settings
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { timeout_secs: None, default_model: default_model(), default_temperature: default_temperature() }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

/// Local persistence settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// SQLite database path (default: `~/.peditor/peditor.db`)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: FileLoggingConfig,
    #[serde(default)]
    pub privacy: PrivacyLoggingConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: FileLoggingConfig::default(),
            privacy: PrivacyLoggingConfig::default(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

/// `[logging.file]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileLoggingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_file_log_level")]
    pub level: String,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self { enabled: false, level: default_file_log_level() }
    }
}

fn default_file_log_level() -> String {
    "debug".to_string()
}

/// `[logging.privacy]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrivacyLoggingConfig {
    /// How prompt and response text appear in logs: `none`, `truncate` or `full`
    #[serde(default = "default_log_content")]
    pub log_content: String,
    #[serde(default = "default_truncate_length")]
    pub truncate_length: usize,
}

impl Default for PrivacyLoggingConfig {
    fn default() -> Self {
        Self { log_content: default_log_content(), truncate_length: default_truncate_length() }
    }
}

fn default_log_content() -> String {
    "none".to_string()
}

fn default_truncate_length() -> usize {
    200
}

/// Root configuration structure for config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str).map_err(|e| Error::Config(format!("TOML parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(format!("TOML serialize error: {}", e)))
    }

    /// `~/.peditor`
    pub fn data_dir() -> Result<PathBuf> {
        let home = env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .map_err(|_| Error::Config("Could not determine home directory".to_string()))?;
        Ok(PathBuf::from(home).join(DATA_DIR_NAME))
    }

    /// `~/.peditor/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("config.toml"))
    }

    /// Resolved SQLite path
    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.store.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("peditor.db")),
        }
    }

    fn validate(&self) -> Result<()> {
        let temperature = self.generation.default_temperature;
        if !(0.0..=1.0).contains(&temperature) {
            return Err(Error::Config(
                ConfigError::TemperatureOutOfRange(temperature).to_string(),
            ));
        }

        if self.generation.default_model.trim().is_empty() {
            return Err(Error::Config(ConfigError::EmptyField("generation.default_model").to_string()));
        }

        if self.generation.timeout_secs == Some(0) {
            return Err(Error::Config(ConfigError::ZeroTimeout.to_string()));
        }

        if let ProviderConfig::OpenAi { base_url } = &self.provider
            && base_url.trim().is_empty()
        {
            return Err(Error::Config(ConfigError::EmptyField("provider.base_url").to_string()));
        }

        Ok(())
    }

    /// Get example configuration (as a string)
    pub fn example() -> &'static str {
        r#"# PEditor configuration

# Generation backend: "openai" (any OpenAI-compatible endpoint) or "mock"
[provider]
provider = "openai"
base_url = "https://api.openai.com/v1"

[generation]
# Fail a generation when the model goes quiet for this many seconds (optional)
# timeout_secs = 60
default_model = "gpt-4o"
default_temperature = 0.7

[store]
# SQLite file holding settings and histories (optional)
# path = "/home/me/.peditor/peditor.db"

[logging]
level = "warn"
format = "pretty"

[logging.file]
enabled = false
level = "debug"

[logging.privacy]
# How prompt and response text appear in logs: "none", "truncate" or "full"
log_content = "none"
truncate_length = 200
"#
    }
}

/// Configuration-specific errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Temperature outside the accepted range
    #[error("temperature must be between 0.0 and 1.0, got {0}")]
    TemperatureOutOfRange(f32),

    /// Required value is blank
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// Timeout set to zero
    #[error("generation.timeout_secs must be greater than zero")]
    ZeroTimeout,
}
