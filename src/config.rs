//! Enricher options.
//!
//! Options can be built in code or loaded from a TOML file with environment
//! variable overrides. Validation happens once, when the enricher is built.

use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::naming::{self, AttributeNamer, NamingMode};

/// Errors raised while setting up an enricher.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The property prefix is empty or whitespace.
    #[error("invalid property_prefix {0:?}: must contain at least one non-whitespace character")]
    InvalidPrefix(String),

    /// The configuration file was not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// The configuration file path is not valid UTF-8.
    #[error("invalid configuration path: {0}")]
    InvalidPath(String),

    /// The configuration could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] ::config::ConfigError),
}

/// Which properties the enricher emits and how they are named.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnricherOptions {
    /// Emit parallel arrays over every error when there is more than one.
    pub include_all_errors: bool,
    /// Emit data source, database, connect timeout and client connection id.
    pub include_connection_context: bool,
    /// Emit `IsTransient`.
    pub detect_transient_failures: bool,
    /// Prefix used unless external semantics are on.
    pub property_prefix: String,
    /// Emit `IsDeadlock`.
    pub detect_deadlocks: bool,
    /// Emit `DeadlockGraph` when one is present. Needs `detect_deadlocks`.
    pub include_deadlock_graph: bool,
    /// Emit `IsTimeout` and `TimeoutType`.
    pub classify_timeouts: bool,
    /// Emit `ErrorCategory`, `IsUserError` and `IsSystemError`.
    pub categorize_errors: bool,
    /// Use dotted external attribute names instead of the prefix.
    pub use_open_telemetry_semantics: bool,
    /// Emit the retry guidance properties.
    pub provide_retry_guidance: bool,
    /// Emit `SeverityLevel` and `RequiresImmediateAttention`.
    pub include_severity_level: bool,
    /// Log debug diagnostics from the enricher.
    pub enable_diagnostics: bool,
}

impl Default for EnricherOptions {
    fn default() -> Self {
        Self {
            include_all_errors: true,
            include_connection_context: true,
            detect_transient_failures: true,
            property_prefix: naming::DEFAULT_PREFIX.to_string(),
            detect_deadlocks: true,
            include_deadlock_graph: true,
            classify_timeouts: true,
            categorize_errors: true,
            use_open_telemetry_semantics: false,
            provide_retry_guidance: true,
            include_severity_level: true,
            enable_diagnostics: false,
        }
    }
}

impl EnricherOptions {
    /// Default options: everything on, prefixed names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads options from a TOML file. The file is read as TOML whatever its
    /// extension.
    ///
    /// Environment variables override file values using the form
    /// `SQLERR__<FIELD>`, e.g. `SQLERR__USE_OPEN_TELEMETRY_SEMANTICS=true`.
    /// Fields missing from both sources keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, its path is not UTF-8, or
    /// it cannot be parsed. The loaded options are not validated here.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let path_str = path
            .to_str()
            .ok_or_else(|| ConfigError::InvalidPath(format!("{:?}", path)))?;

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path_str.to_string()));
        }

        let config = Config::builder()
            .add_source(File::new(path_str, FileFormat::Toml))
            .add_source(
                Environment::with_prefix("SQLERR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let options: EnricherOptions = config.try_deserialize()?;
        tracing::debug!(path = path_str, "loaded enricher options");
        Ok(options)
    }

    /// Checks the options for values that make the enricher unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.use_open_telemetry_semantics {
            naming::validate_prefix(&self.property_prefix)?;
        }
        Ok(())
    }

    /// Builds the namer these options describe.
    pub fn namer(&self) -> Result<AttributeNamer, ConfigError> {
        if self.use_open_telemetry_semantics {
            Ok(AttributeNamer::external())
        } else {
            AttributeNamer::new(NamingMode::Prefixed(self.property_prefix.clone()))
        }
    }

    pub fn with_property_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.property_prefix = prefix.into();
        self
    }

    pub fn with_open_telemetry_semantics(mut self, enabled: bool) -> Self {
        self.use_open_telemetry_semantics = enabled;
        self
    }

    pub fn with_all_errors(mut self, enabled: bool) -> Self {
        self.include_all_errors = enabled;
        self
    }

    pub fn with_connection_context(mut self, enabled: bool) -> Self {
        self.include_connection_context = enabled;
        self
    }

    pub fn with_transient_detection(mut self, enabled: bool) -> Self {
        self.detect_transient_failures = enabled;
        self
    }

    pub fn with_deadlock_detection(mut self, enabled: bool) -> Self {
        self.detect_deadlocks = enabled;
        self
    }

    pub fn with_deadlock_graph(mut self, enabled: bool) -> Self {
        self.include_deadlock_graph = enabled;
        self
    }

    pub fn with_timeout_classification(mut self, enabled: bool) -> Self {
        self.classify_timeouts = enabled;
        self
    }

    pub fn with_error_categories(mut self, enabled: bool) -> Self {
        self.categorize_errors = enabled;
        self
    }

    pub fn with_retry_guidance(mut self, enabled: bool) -> Self {
        self.provide_retry_guidance = enabled;
        self
    }

    pub fn with_severity_level(mut self, enabled: bool) -> Self {
        self.include_severity_level = enabled;
        self
    }

    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.enable_diagnostics = enabled;
        self
    }
}
