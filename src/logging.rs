//! Logging setup for the `sqlerr` binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the application. This module does that for the command-line tool:
//! - Writes to stderr so stdout stays clean for JSON output
//! - Honors `SQLERR_LOG` (env-filter syntax) before the configured level

use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable consulted for a filter directive.
pub const LOG_ENV: &str = "SQLERR_LOG";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    /// Default: the CLI is quiet unless something is wrong.
    #[default]
    Warn,
    Error,
    Off,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

impl From<u8> for LogLevel {
    /// Convert a `-v` count to a level.
    /// 0 = Warn, 1 = Info, 2 = Debug, 3+ = Trace
    fn from(verbosity: u8) -> Self {
        match verbosity {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

/// Configuration for the stderr subscriber.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub with_timestamps: bool,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            with_timestamps: false,
            with_target: true,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.with_timestamps = enabled;
        self
    }

    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Configuration from a `-v` count.
    pub fn from_verbosity(verbosity: u8) -> Self {
        Self::default().with_level(LogLevel::from(verbosity))
    }

    fn env_filter(&self) -> EnvFilter {
        match std::env::var(LOG_ENV) {
            Ok(directive) if !directive.trim().is_empty() => EnvFilter::new(directive),
            _ => EnvFilter::new(self.level.directive()),
        }
    }
}

/// Installs the global subscriber. Call once at startup; later calls are
/// ignored.
pub fn init_logging(config: LoggingConfig) {
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(config.env_filter())
        .with_writer(std::io::stderr)
        .with_target(config.with_target);

    let result = if config.with_timestamps {
        subscriber.try_init()
    } else {
        subscriber.without_time().try_init()
    };

    if let Err(err) = result {
        tracing::debug!(%err, "logging already initialized");
    }
}
