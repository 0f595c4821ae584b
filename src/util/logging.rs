//! Structured logging setup for diskfs
//!
//! The crate itself only emits `tracing` events; binaries and test harnesses
//! that embed it can use these helpers to install a subscriber. Output is
//! either human-readable or JSON, filtered through `RUST_LOG` plus a default
//! level for the `diskfs` target.
//!
//! # Example
//!
//! ```no_run
//! use diskfs::util::logging;
//!
//! logging::init_from_env();
//!
//! tracing::debug!(path = "/var/data/segment-0001", "Opening segment");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for events from this crate
    pub level: Level,

    /// Emit JSON lines instead of pretty console output
    pub use_json: bool,

    /// Include the module target (e.g., diskfs::fs) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON output with source locations, for log collectors
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
        }
    }
}

/// Parses a log level, case-insensitively. Unknown values fall back to INFO.
///
/// ```
/// use diskfs::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("WARN"), Level::WARN);
/// assert_eq!(parse_level("loud"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

/// Installs the global subscriber. Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = format!("diskfs={}", config.level).parse() {
            filter = filter.add_directive(directive);
        }

        let layer = fmt::layer()
            .with_target(config.include_target)
            .with_file(config.include_location)
            .with_line_number(config.include_location);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.json())
                .init();
        } else {
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    });
}

pub fn init_default() {
    init_logging(LoggingConfig::default());
}

/// Initializes logging from `DISKFS_LOG_LEVEL` and `DISKFS_LOG_JSON`.
pub fn init_from_env() {
    let level = env::var("DISKFS_LOG_LEVEL")
        .map(|v| parse_level(&v))
        .unwrap_or(Level::INFO);

    let use_json = env::var("DISKFS_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    init_logging(LoggingConfig {
        level,
        use_json,
        ..Default::default()
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("info"), Level::INFO);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
    }

    #[test]
    fn test_parse_level_case_and_whitespace() {
        assert_eq!(parse_level("TRACE"), Level::TRACE);
        assert_eq!(parse_level(" Debug "), Level::DEBUG);
    }

    #[test]
    fn test_parse_level_invalid() {
        assert_eq!(parse_level("verbose"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.use_json);
        assert!(config.include_target);
        assert!(!config.include_location);
    }

    #[test]
    fn test_production_config() {
        let config = LoggingConfig::production();
        assert!(config.use_json);
        assert!(config.include_location);
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging(LoggingConfig::with_level(Level::DEBUG));
        init_default();
        tracing::debug!("logging initialized");
    }
}
