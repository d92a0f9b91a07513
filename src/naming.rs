//! Output property naming.
//!
//! Every property the enricher writes has a semantic key (e.g. `"Number"`).
//! The key becomes a property name either by prepending a configured prefix
//! or by looking it up in a fixed table of dotted, OpenTelemetry-style
//! attribute names. These names are an external contract: dashboards and
//! alerts match on them, so they are spelled out here rather than derived.

use std::borrow::Cow;

use crate::config::ConfigError;

/// Semantic keys for every property the enricher can emit.
pub mod keys {
    pub const IS_SQL_EXCEPTION: &str = "IsSqlException";
    pub const ERROR_COUNT: &str = "ErrorCount";
    pub const NUMBER: &str = "Number";
    pub const STATE: &str = "State";
    pub const CLASS: &str = "Class";
    pub const LINE: &str = "Line";
    pub const PROCEDURE: &str = "Procedure";
    pub const SERVER: &str = "Server";
    pub const MESSAGE: &str = "Message";
    pub const ALL_NUMBERS: &str = "AllNumbers";
    pub const ALL_STATES: &str = "AllStates";
    pub const ALL_CLASSES: &str = "AllClasses";
    pub const ALL_MESSAGES: &str = "AllMessages";
    pub const DATA_SOURCE: &str = "DataSource";
    pub const DATABASE: &str = "Database";
    pub const CONNECTION_TIMEOUT: &str = "ConnectionTimeout";
    pub const CLIENT_CONNECTION_ID: &str = "ClientConnectionId";
    pub const IS_TRANSIENT: &str = "IsTransient";
    pub const IS_DEADLOCK: &str = "IsDeadlock";
    pub const DEADLOCK_GRAPH: &str = "DeadlockGraph";
    pub const IS_TIMEOUT: &str = "IsTimeout";
    pub const TIMEOUT_TYPE: &str = "TimeoutType";
    pub const ERROR_CATEGORY: &str = "ErrorCategory";
    pub const IS_USER_ERROR: &str = "IsUserError";
    pub const IS_SYSTEM_ERROR: &str = "IsSystemError";
    pub const SHOULD_RETRY: &str = "ShouldRetry";
    pub const RETRY_STRATEGY: &str = "RetryStrategy";
    pub const SUGGESTED_RETRY_DELAY: &str = "SuggestedRetryDelay";
    pub const MAX_RETRIES: &str = "MaxRetries";
    pub const RETRY_REASON: &str = "RetryReason";
    pub const SEVERITY_LEVEL: &str = "SeverityLevel";
    pub const REQUIRES_IMMEDIATE_ATTENTION: &str = "RequiresImmediateAttention";
}

/// Default prefix for [`NamingMode::Prefixed`].
pub const DEFAULT_PREFIX: &str = "SqlException_";

/// How semantic keys become property names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingMode {
    /// `prefix + key`.
    Prefixed(String),
    /// Fixed dotted attribute names, `db.<lowercase key>` for unlisted keys.
    ExternalSemantics,
}

/// Maps semantic keys to output property names.
///
/// The prefix is validated once on construction; naming itself cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeNamer {
    mode: NamingMode,
}

impl Default for AttributeNamer {
    fn default() -> Self {
        Self {
            mode: NamingMode::Prefixed(DEFAULT_PREFIX.to_string()),
        }
    }
}

impl AttributeNamer {
    /// Creates a namer for the given mode, rejecting blank prefixes.
    pub fn new(mode: NamingMode) -> Result<Self, ConfigError> {
        if let NamingMode::Prefixed(prefix) = &mode {
            validate_prefix(prefix)?;
        }
        Ok(Self { mode })
    }

    /// Shorthand for `new(NamingMode::Prefixed(prefix))`.
    pub fn prefixed(prefix: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(NamingMode::Prefixed(prefix.into()))
    }

    /// Namer using external semantic-convention names.
    pub fn external() -> Self {
        Self {
            mode: NamingMode::ExternalSemantics,
        }
    }

    pub fn mode(&self) -> &NamingMode {
        &self.mode
    }

    /// Output property name for a semantic key.
    pub fn name(&self, key: &str) -> String {
        match &self.mode {
            NamingMode::Prefixed(prefix) => format!("{prefix}{key}"),
            NamingMode::ExternalSemantics => external_name(key).into_owned(),
        }
    }
}

/// Rejects a prefix that is empty or only whitespace.
pub fn validate_prefix(prefix: &str) -> Result<(), ConfigError> {
    if prefix.trim().is_empty() {
        return Err(ConfigError::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}

/// External attribute name for a semantic key.
pub fn external_name(key: &str) -> Cow<'static, str> {
    let name = match key {
        keys::IS_SQL_EXCEPTION => "db.exception.sql",
        keys::NUMBER => "db.error.code",
        keys::STATE => "db.error.state",
        keys::CLASS => "db.error.severity",
        keys::MESSAGE => "exception.message",
        keys::PROCEDURE => "db.operation",
        keys::SERVER => "server.address",
        keys::DATABASE => "db.name",
        keys::DATA_SOURCE => "server.address",
        keys::CLIENT_CONNECTION_ID => "db.client.connection.id",
        keys::IS_TRANSIENT => "db.error.transient",
        keys::IS_DEADLOCK => "db.error.deadlock",
        keys::IS_TIMEOUT => "db.error.timeout",
        keys::TIMEOUT_TYPE => "db.error.timeout.type",
        keys::ERROR_CATEGORY => "db.error.category",
        keys::IS_USER_ERROR => "db.error.user_caused",
        keys::IS_SYSTEM_ERROR => "db.error.system_caused",
        keys::DEADLOCK_GRAPH => "db.deadlock.graph",
        keys::ERROR_COUNT => "db.error.count",
        keys::ALL_NUMBERS => "db.error.all_codes",
        keys::ALL_STATES => "db.error.all_states",
        keys::ALL_CLASSES => "db.error.all_severities",
        keys::ALL_MESSAGES => "db.error.all_messages",
        keys::LINE => "db.error.line",
        keys::CONNECTION_TIMEOUT => "db.connection.timeout",
        keys::SHOULD_RETRY => "db.error.retry.recommended",
        keys::RETRY_STRATEGY => "db.error.retry.strategy",
        keys::SUGGESTED_RETRY_DELAY => "db.error.retry.delay",
        keys::MAX_RETRIES => "db.error.retry.max_attempts",
        keys::RETRY_REASON => "db.error.retry.reason",
        keys::SEVERITY_LEVEL => "db.error.severity.level",
        keys::REQUIRES_IMMEDIATE_ATTENTION => "db.error.critical",
        _ => return Cow::Owned(format!("db.{}", key.to_lowercase())),
    };
    Cow::Borrowed(name)
}
