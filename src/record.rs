//! Decoded driver errors.
//!
//! These types mirror what a SQL Server driver reports for a failed command:
//! one exception carrying one or more error records plus the context of the
//! connection it ran on. They are plain values; the enricher only reads them.

use std::error::Error as StdError;
use thiserror::Error;

/// A single error reported by the server for one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorRecord {
    /// Vendor error number.
    pub code: i32,
    /// Severity class, 0-25.
    pub severity_class: u8,
    /// State code, used by the server to tell call sites apart.
    pub state: u8,
    /// Error text.
    pub message: String,
    /// Stored procedure or RPC name, empty for ad-hoc batches.
    pub procedure: String,
    /// Server instance that raised the error.
    pub server: String,
    /// Line number within the batch or procedure.
    pub line: i32,
}

impl ErrorRecord {
    /// Creates a record with the given number and class; other fields empty.
    pub fn new(code: i32, severity_class: u8) -> Self {
        Self {
            code,
            severity_class,
            ..Self::default()
        }
    }

    pub fn with_state(mut self, state: u8) -> Self {
        self.state = state;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_procedure(mut self, procedure: impl Into<String>) -> Self {
        self.procedure = procedure.into();
        self
    }

    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    pub fn with_line(mut self, line: i32) -> Self {
        self.line = line;
        self
    }
}

/// Connection the failing command ran on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionContext {
    /// Server name or address from the connection string.
    pub data_source: String,
    /// Current database.
    pub database: String,
    /// Connect timeout in seconds.
    pub connection_timeout: u32,
}

impl ConnectionContext {
    pub fn new(data_source: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            data_source: data_source.into(),
            database: database.into(),
            connection_timeout: 15,
        }
    }

    pub fn with_connection_timeout(mut self, seconds: u32) -> Self {
        self.connection_timeout = seconds;
        self
    }
}

/// An exception raised by the driver, holding every error the server sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SqlException {
    /// Exception message; usually the first error's text.
    pub message: String,
    /// Errors in the order the server reported them.
    pub errors: Vec<ErrorRecord>,
    /// Connection context, when the driver knows it.
    pub connection: Option<ConnectionContext>,
    /// Client-side connection identifier.
    pub client_connection_id: Option<String>,
}

impl SqlException {
    /// Wraps a single error; the exception message is the error's text.
    pub fn from_error(error: ErrorRecord) -> Self {
        Self {
            message: error.message.clone(),
            errors: vec![error],
            ..Self::default()
        }
    }

    /// Builds an exception from several errors.
    pub fn from_errors(message: impl Into<String>, errors: Vec<ErrorRecord>) -> Self {
        Self {
            message: message.into(),
            errors,
            ..Self::default()
        }
    }

    pub fn with_connection(mut self, connection: ConnectionContext) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn with_client_connection_id(mut self, id: impl Into<String>) -> Self {
        self.client_connection_id = Some(id.into());
        self
    }

    /// The error classification keys off.
    pub fn first_error(&self) -> Option<&ErrorRecord> {
        self.errors.first()
    }
}

/// Finds the first [`SqlException`] in an error's `source()` chain, starting
/// with the error itself.
pub fn find_sql_exception<'a>(error: &'a (dyn StdError + 'static)) -> Option<&'a SqlException> {
    std::iter::successors(Some(error), |&e| e.source())
        .find_map(|e| e.downcast_ref::<SqlException>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("repository call failed")]
    struct RepositoryError {
        #[source]
        source: SqlException,
    }

    #[derive(Debug, Error)]
    #[error("request failed")]
    struct RequestError {
        #[source]
        source: RepositoryError,
    }

    #[derive(Debug, Error)]
    #[error("not a database problem")]
    struct OtherError;

    #[test]
    fn test_error_record_builder() {
        let record = ErrorRecord::new(547, 16)
            .with_state(1)
            .with_message("FK violation")
            .with_procedure("sp_Insert")
            .with_server("db01")
            .with_line(42);

        assert_eq!(record.code, 547);
        assert_eq!(record.severity_class, 16);
        assert_eq!(record.state, 1);
        assert_eq!(record.procedure, "sp_Insert");
        assert_eq!(record.line, 42);
    }

    #[test]
    fn test_from_error_uses_message() {
        let ex = SqlException::from_error(ErrorRecord::new(1205, 13).with_message("deadlocked"));
        assert_eq!(ex.to_string(), "deadlocked");
        assert_eq!(ex.first_error().map(|e| e.code), Some(1205));
    }

    #[test]
    fn test_find_direct() {
        let ex = SqlException::from_error(ErrorRecord::new(2627, 14));
        let found = find_sql_exception(&ex).expect("should find itself");
        assert_eq!(found.errors[0].code, 2627);
    }

    #[test]
    fn test_find_nested() {
        let err = RequestError {
            source: RepositoryError {
                source: SqlException::from_error(ErrorRecord::new(2627, 14)),
            },
        };
        let found = find_sql_exception(&err).expect("should find nested exception");
        assert_eq!(found.errors[0].code, 2627);
    }

    #[test]
    fn test_find_none() {
        assert!(find_sql_exception(&OtherError).is_none());
    }

    #[test]
    fn test_connection_defaults() {
        let conn = ConnectionContext::new("db01", "Orders");
        assert_eq!(conn.connection_timeout, 15);
        assert_eq!(conn.with_connection_timeout(30).connection_timeout, 30);
    }
}
