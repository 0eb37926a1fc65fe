//! Logging built on the tracing ecosystem.
//!
//! # Environment Variables
//!
//! - `PEDITOR_LOG`: Filter directive (like `RUST_LOG`), e.g., `peditor=debug`
//! - `PEDITOR_LOG_FORMAT`: Output format for stderr: `pretty`, `json`, `compact`
//! - `PEDITOR_LOG_DIR`: Directory for file logs (default `~/.peditor/logs/`)
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! level = "warn"
//! format = "pretty"
//!
//! [logging.file]
//! enabled = true
//! level = "debug"
//!
//! [logging.privacy]
//! log_content = "truncate"
//! truncate_length = 200
//! ```
//!
//! The terminal UI owns the screen, so it initializes logging with stderr disabled and
//! relies on the file layer alone. Keep the returned guard alive for the whole process;
//! dropping it stops the background writer.

use crate::Error;
use crate::config::{Config, FileLoggingConfig, LoggingConfig as ConfigLoggingConfig};
use std::env;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
pub use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format for stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Pretty, human-readable output with colors (default for TTY)
    #[default]
    Pretty,
    /// JSON output (one line per event)
    Json,
    /// Compact, single-line output
    Compact,
}

impl LogFormat {
    pub const VALUES: &[LogFormat] = &[LogFormat::Pretty, LogFormat::Json, LogFormat::Compact];

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            "compact" => Some(LogFormat::Compact),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
            LogFormat::Compact => "compact",
        }
    }
}

/// How prompt and response text shows up in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentLogging {
    /// Replace content with a marker.
    #[default]
    None,
    /// Log up to `truncate_length` chars.
    Truncate,
    /// Log everything (user text ends up on disk).
    Full,
}

impl ContentLogging {
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(ContentLogging::None),
            "truncate" => Some(ContentLogging::Truncate),
            "full" => Some(ContentLogging::Full),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentLogging::None => "none",
            ContentLogging::Truncate => "truncate",
            ContentLogging::Full => "full",
        }
    }
}

impl FromStr for ContentLogging {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentLogging::parse_str(s).ok_or_else(|| format!("invalid content logging: {}", s))
    }
}

/// Privacy configuration for user text in logs.
#[derive(Debug, Clone, Default)]
pub struct PrivacyConfig {
    pub log_content: ContentLogging,
    pub truncate_length: usize,
}

/// Runtime logging settings, bridged from the `[logging]` config section.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default log level for stderr output.
    pub level: String,
    /// Output format for stderr.
    pub format: LogFormat,
    /// Write events to stderr at all.
    pub stderr: bool,
    /// File logging configuration (optional).
    pub file: Option<FileLoggingConfig>,
    pub privacy: PrivacyConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
            stderr: true,
            file: None,
            privacy: PrivacyConfig::default(),
        }
    }
}

impl From<ConfigLoggingConfig> for LoggingConfig {
    fn from(config: ConfigLoggingConfig) -> Self {
        let format = LogFormat::parse_str(&config.format).unwrap_or_default();
        let log_content = ContentLogging::parse_str(&config.privacy.log_content).unwrap_or_default();

        Self {
            level: config.level,
            format,
            stderr: true,
            file: if config.file.enabled { Some(config.file) } else { None },
            privacy: PrivacyConfig { log_content, truncate_length: config.privacy.truncate_length },
        }
    }
}

impl From<&Config> for LoggingConfig {
    fn from(config: &Config) -> Self {
        LoggingConfig::from(config.logging.clone())
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Enable or disable the stderr layer.
    pub fn with_stderr(mut self, enabled: bool) -> Self {
        self.stderr = enabled;
        self
    }

    pub fn with_file_logging(mut self, config: FileLoggingConfig) -> Self {
        self.file = Some(config);
        self
    }

    pub fn with_privacy(mut self, config: PrivacyConfig) -> Self {
        self.privacy = config;
        self
    }

    fn build_env_filter(&self, fallback: &str) -> EnvFilter {
        let filter = env::var("PEDITOR_LOG")
            .ok()
            .or_else(|| env::var("RUST_LOG").ok())
            .unwrap_or_else(|| fallback.to_string());

        EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("warn"))
    }

    fn is_tty() -> bool {
        atty::is(atty::Stream::Stderr)
    }

    fn detect_format(&self) -> LogFormat {
        if let Ok(fmt_str) = env::var("PEDITOR_LOG_FORMAT")
            && let Some(fmt) = LogFormat::parse_str(&fmt_str)
        {
            return fmt;
        }

        if self.format != LogFormat::Pretty {
            return self.format;
        }

        if Self::is_tty() { LogFormat::Pretty } else { LogFormat::Compact }
    }

    /// Directory for rolling log files.
    pub fn log_dir() -> Result<PathBuf, Error> {
        if let Ok(custom_dir) = env::var("PEDITOR_LOG_DIR") {
            return Ok(PathBuf::from(custom_dir));
        }

        Ok(Config::data_dir()?.join("logs"))
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the global tracing subscriber.
///
/// Sets up an env-based filter per layer (`PEDITOR_LOG`, then `RUST_LOG`, then the configured
/// level), an optional stderr layer in the detected format, and an optional daily-rolling JSON
/// file layer. Returns the file writer's guard when file logging is on.
pub fn init_logging(config: Option<LoggingConfig>) -> Result<Option<WorkerGuard>, Error> {
    let config = config.unwrap_or_default();
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;

    if config.stderr {
        let filter = config.build_env_filter(&config.level);
        let layer: BoxedLayer = match config.detect_format() {
            LogFormat::Pretty => fmt::layer().pretty().with_writer(io::stderr).with_ansi(true).with_filter(filter).boxed(),
            LogFormat::Json => fmt::layer().json().with_writer(io::stderr).with_filter(filter).boxed(),
            LogFormat::Compact => fmt::layer().compact().with_writer(io::stderr).with_filter(filter).boxed(),
        };
        layers.push(layer);
    }

    if let Some(file_config) = &config.file {
        let log_dir = LoggingConfig::log_dir()?;
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| Error::Config(format!("Failed to create log directory: {}", e)))?;

        let file_appender = tracing_appender::rolling::daily(log_dir, "peditor.log");
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
        let filter = config.build_env_filter(&file_config.level);
        layers.push(fmt::layer().json().with_writer(non_blocking).with_filter(filter).boxed());
        guard = Some(file_guard);
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))?;

    Ok(guard)
}

/// Shorten or hide user text according to privacy settings.
pub fn redact_sensitive(content: &str, privacy: &PrivacyConfig) -> String {
    match privacy.log_content {
        ContentLogging::None => format!("[REDACTED {} chars]", content.chars().count()),
        ContentLogging::Truncate => {
            let total = content.chars().count();
            if total <= privacy.truncate_length {
                return content.to_string();
            }
            let mut truncated = content.chars().take(privacy.truncate_length).collect::<String>();
            truncated.push_str("...");
            truncated.push_str(&format!(" ({} total chars)", total));
            truncated
        }
        ContentLogging::Full => content.to_string(),
    }
}

/// Mask a credential for display, keeping the last four characters.
pub fn mask_credential(credential: &str) -> String {
    let trimmed = credential.trim();
    if trimmed.is_empty() {
        return "(not set)".to_string();
    }

    let count = trimmed.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }

    let tail: String = trimmed.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count.min(12) - 4), tail)
}

/// Sanitize file paths for logging (replace the home directory with `~`).
pub fn sanitize_path(path: &std::path::Path) -> String {
    if let Ok(home) = env::var("HOME")
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return format!("~/{}", stripped.display());
    }

    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!(LogFormat::parse_str("pretty"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse_str("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse_str("compact"), Some(LogFormat::Compact));
        assert_eq!(LogFormat::parse_str("invalid"), None);
    }

    #[test]
    fn test_log_format_as_str() {
        for format in LogFormat::VALUES {
            assert_eq!(LogFormat::parse_str(format.as_str()), Some(*format));
        }
    }

    #[test]
    fn test_content_logging_from_str() {
        assert_eq!("none".parse::<ContentLogging>(), Ok(ContentLogging::None));
        assert_eq!("TRUNCATE".parse::<ContentLogging>(), Ok(ContentLogging::Truncate));
        assert_eq!("full".parse::<ContentLogging>(), Ok(ContentLogging::Full));
        assert!("verbose".parse::<ContentLogging>().is_err());
        assert_eq!(ContentLogging::Truncate.as_str(), "truncate");
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.stderr);
        assert!(config.file.is_none());
    }

    #[test]
    fn test_logging_config_from_config_section() {
        let mut section = ConfigLoggingConfig::default();
        section.format = "json".to_string();
        section.file.enabled = true;
        section.privacy.log_content = "truncate".to_string();

        let config = LoggingConfig::from(section);
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.file.is_some());
        assert_eq!(config.privacy.log_content, ContentLogging::Truncate);
        assert_eq!(config.privacy.truncate_length, 200);
    }

    #[test]
    fn test_logging_config_builder() {
        let config = LoggingConfig::new()
            .with_level("debug")
            .with_format(LogFormat::Compact)
            .with_stderr(false)
            .with_file_logging(FileLoggingConfig::default())
            .with_privacy(PrivacyConfig { log_content: ContentLogging::Full, truncate_length: 10 });

        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Compact);
        assert!(!config.stderr);
        assert!(config.file.is_some());
        assert_eq!(config.privacy.log_content, ContentLogging::Full);
    }

    #[test]
    fn test_redact_sensitive_none() {
        let privacy = PrivacyConfig { log_content: ContentLogging::None, truncate_length: 100 };
        assert_eq!(redact_sensitive("secret draft", &privacy), "[REDACTED 12 chars]");
    }

    #[test]
    fn test_redact_sensitive_truncate() {
        let privacy = PrivacyConfig { log_content: ContentLogging::Truncate, truncate_length: 10 };

        let redacted = redact_sensitive("abcdefghijklmnopqrstuvwxyz", &privacy);
        assert!(redacted.starts_with("abcdefghij..."));
        assert!(redacted.contains("26 total chars"));

        assert_eq!(redact_sensitive("short", &privacy), "short");
    }

    #[test]
    fn test_redact_sensitive_full() {
        let privacy = PrivacyConfig { log_content: ContentLogging::Full, truncate_length: 1 };
        let long_content = "a".repeat(200);
        assert_eq!(redact_sensitive(&long_content, &privacy), long_content);
    }

    #[test]
    fn test_mask_credential() {
        assert_eq!(mask_credential(""), "(not set)");
        assert_eq!(mask_credential("abc"), "***");
        assert_eq!(mask_credential("sk-1234567890abcdef"), "********cdef");
        assert_eq!(mask_credential("sk-123456"), "*****3456");
    }

    #[test]
    fn test_sanitize_path() {
        let home = env::var("HOME").unwrap_or_default();
        let test_path = PathBuf::from(&home).join("notes").join("draft.txt");
        if !home.is_empty() {
            assert_eq!(sanitize_path(&test_path), "~/notes/draft.txt");
        }

        let abs_path = PathBuf::from("/var/log/test.log");
        assert_eq!(sanitize_path(&abs_path), "/var/log/test.log");
    }
}
