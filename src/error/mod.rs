//! SQL Server error classification engine
//!
//! Pure lookups over static tables keyed by the vendor error number (or, for
//! severity, the error class). Unknown inputs always map to a defined default;
//! nothing in this module can fail or hold state between calls.

pub mod category;
pub mod classification;
pub mod detector;
pub mod retry;
pub mod severity;
pub mod timeout;

// Re-export main types for convenient access
pub use category::{is_user_error, ErrorCategory};
pub use classification::Classification;
pub use detector::{is_deadlock, try_extract_graph, DEADLOCK_VICTIM};
pub use retry::{should_retry, RetryGuidance, RetryStrategy};
pub use severity::{requires_immediate_attention, SeverityLevel};
pub use timeout::{is_timeout, TimeoutType};
