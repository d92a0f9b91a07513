//! sqlerror-enricher - structured diagnostics for SQL Server errors
//!
//! Classifies driver errors by category, transience, deadlock and timeout
//! kind, retry guidance and severity, and renders the result as named
//! properties for log enrichment.
//!
//! ```
//! use sqlerror_enricher::{EnricherOptions, ErrorRecord, SqlException, SqlExceptionEnricher};
//!
//! let enricher = SqlExceptionEnricher::new(EnricherOptions::default())?;
//! let ex = SqlException::from_error(ErrorRecord::new(1205, 13).with_message("deadlocked"));
//! let props = enricher.enrich(&ex);
//!
//! assert_eq!(props.get("SqlException_IsDeadlock"), Some(&serde_json::json!(true)));
//! assert_eq!(props.get("SqlException_RetryStrategy"), Some(&serde_json::json!("Exponential")));
//! # Ok::<(), sqlerror_enricher::ConfigError>(())
//! ```

pub mod config;
pub mod enricher;
pub mod error;
pub mod logging;
pub mod naming;
pub mod record;

pub use self::config::{ConfigError, EnricherOptions};
pub use enricher::{Properties, SqlExceptionEnricher};
pub use error::{
    Classification, ErrorCategory, RetryGuidance, RetryStrategy, SeverityLevel, TimeoutType,
};
pub use naming::{AttributeNamer, NamingMode};
pub use record::{find_sql_exception, ConnectionContext, ErrorRecord, SqlException};
