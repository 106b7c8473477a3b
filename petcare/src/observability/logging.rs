//! Structured logging setup.
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and either
//! pretty console output or JSON lines. Initialization happens at most once
//! per process; later calls are ignored.
//!
//! # Environment Variables
//!
//! - `PETCARE_LOG_LEVEL`: trace, debug, info, warn or error - default: info
//! - `PETCARE_LOG_JSON`: `true` for JSON output - default: false
//! - `RUST_LOG`: standard filter directives, applied on top

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for this crate's events.
    pub level: Level,
    /// Emit JSON lines instead of console output.
    pub use_json: bool,
    /// Include the module target.
    pub include_target: bool,
    /// Include file and line number.
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
    /// Default configuration at the given level.
    #[must_use]
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON output with source locations.
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
        }
    }

    /// Reads `PETCARE_LOG_LEVEL` and `PETCARE_LOG_JSON`.
    #[must_use]
    pub fn from_env() -> Self {
        let level = env::var("PETCARE_LOG_LEVEL")
            .map(|v| parse_level(&v))
            .unwrap_or(Level::INFO);
        let use_json = env::var("PETCARE_LOG_JSON")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            level,
            use_json,
            ..Default::default()
        }
    }
}

/// Parses a log level, case-insensitively. Unknown values fall back to INFO.
#[must_use]
pub fn parse_level(level_str: &str) -> Level {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn crate_directive(level: Level) -> Option<Directive> {
    format!("petcare={level}").parse().ok()
}

/// Initializes the global subscriber.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();
        if let Some(directive) = crate_directive(config.level) {
            filter = filter.add_directive(directive);
        }

        // try_init: a host application may already own the global subscriber.
        let result = if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location),
                )
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location),
                )
                .try_init()
        };

        if let Err(err) = result {
            tracing::debug!(error = %err, "Global subscriber already installed");
        }
    });
}

/// Initializes logging from `PETCARE_*` environment variables.
pub fn init_from_env() {
    init_logging(LoggingConfig::from_env());
}
