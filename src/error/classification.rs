//! A full classification of one error record.
//!
//! Each classifier is independent; this type simply runs all of them over the
//! same record so callers do not have to.

use super::{
    category, detector, severity, timeout, ErrorCategory, RetryGuidance, SeverityLevel,
    TimeoutType,
};
use crate::record::ErrorRecord;

/// Everything the engine knows about one error record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification<'a> {
    /// Operational category.
    pub category: ErrorCategory,
    /// Caused by the caller's statement or privileges.
    pub is_user_error: bool,
    /// Error number is in the timeout table.
    pub is_timeout: bool,
    /// Timeout kind; `Unknown` unless `is_timeout`.
    pub timeout_type: TimeoutType,
    /// Deadlock victim.
    pub is_deadlock: bool,
    /// Well-formed deadlock graph found in the message, deadlocks only.
    pub deadlock_graph: Option<&'a str>,
    /// Retry recommendation.
    pub retry: &'static RetryGuidance,
    /// Level derived from the severity class.
    pub severity_level: SeverityLevel,
    /// Class 20 or above.
    pub requires_immediate_attention: bool,
}

impl<'a> Classification<'a> {
    /// Classifies a record.
    pub fn of(record: &'a ErrorRecord) -> Self {
        let is_deadlock = detector::is_deadlock(record.code);
        let deadlock_graph = if is_deadlock {
            detector::try_extract_graph(&record.message)
        } else {
            None
        };

        Self {
            category: ErrorCategory::from_code(record.code),
            is_user_error: category::is_user_error(record.code),
            is_timeout: timeout::is_timeout(record.code),
            timeout_type: TimeoutType::from_code(record.code),
            is_deadlock,
            deadlock_graph,
            retry: RetryGuidance::for_code(record.code),
            severity_level: SeverityLevel::from_class(record.severity_class),
            requires_immediate_attention: severity::requires_immediate_attention(
                record.severity_class,
            ),
        }
    }

    /// Transient means the retry table recommends retrying.
    pub fn is_transient(&self) -> bool {
        self.retry.should_retry
    }

    /// Anything not attributed to the caller.
    pub fn is_system_error(&self) -> bool {
        !self.is_user_error
    }
}
