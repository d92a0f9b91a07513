//! Retry guidance for SQL Server error numbers.
//!
//! Each known error number has one static guidance row. Numbers absent from
//! the table get [`RetryGuidance::DO_NOT_RETRY`]: unknown errors are never
//! considered transient.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Backoff shape recommended between attempts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RetryStrategy {
    /// Do not retry.
    #[default]
    None,
    /// Constant step: delay grows by the suggested delay each attempt.
    Linear,
    /// Delay doubles each attempt.
    Exponential,
}

impl RetryStrategy {
    /// Stable external name of the strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Linear => "Linear",
            Self::Exponential => "Exponential",
        }
    }
}

impl fmt::Display for RetryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retry recommendation for a single error number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryGuidance {
    /// Whether retrying is expected to help.
    pub should_retry: bool,
    /// Backoff shape.
    pub strategy: RetryStrategy,
    /// Initial delay before the first retry.
    pub suggested_delay: Duration,
    /// Recommended maximum number of retries.
    pub max_retries: u32,
    /// Human-readable explanation.
    pub reason: &'static str,
}

impl Default for RetryGuidance {
    fn default() -> Self {
        Self::DO_NOT_RETRY
    }
}

impl RetryGuidance {
    /// Guidance for error numbers with no table entry.
    pub const DO_NOT_RETRY: RetryGuidance = RetryGuidance {
        should_retry: false,
        strategy: RetryStrategy::None,
        suggested_delay: Duration::ZERO,
        max_retries: 0,
        reason: "",
    };

    const fn retry(
        strategy: RetryStrategy,
        delay_ms: u64,
        max_retries: u32,
        reason: &'static str,
    ) -> Self {
        Self {
            should_retry: true,
            strategy,
            suggested_delay: Duration::from_millis(delay_ms),
            max_retries,
            reason,
        }
    }

    const fn never(reason: &'static str) -> Self {
        Self {
            should_retry: false,
            strategy: RetryStrategy::None,
            suggested_delay: Duration::ZERO,
            max_retries: 0,
            reason,
        }
    }

    /// Looks up the guidance for an error number.
    pub fn for_code(code: i32) -> &'static RetryGuidance {
        GUIDANCE.get(&code).unwrap_or(&Self::DO_NOT_RETRY)
    }

    /// Suggested delay rendered the way it appears in log properties,
    /// e.g. `"100ms"` or `"2s"`.
    pub fn delay_display(&self) -> String {
        format_delay(self.suggested_delay)
    }

    /// Delay to wait before the 1-based `attempt`-th retry.
    ///
    /// Returns `None` when retrying is not advised or the attempt is outside
    /// `1..=max_retries`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if !self.should_retry || attempt == 0 || attempt > self.max_retries {
            return None;
        }

        match self.strategy {
            RetryStrategy::None => None,
            RetryStrategy::Linear => Some(self.suggested_delay.saturating_mul(attempt)),
            RetryStrategy::Exponential => {
                let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
                Some(self.suggested_delay.saturating_mul(factor))
            }
        }
    }
}

/// Returns true if the error is considered transient.
pub fn should_retry(code: i32) -> bool {
    RetryGuidance::for_code(code).should_retry
}

/// Formats a delay as whole seconds when possible, milliseconds otherwise.
pub fn format_delay(delay: Duration) -> String {
    let millis = delay.as_millis();
    if millis != 0 && millis % 1000 == 0 {
        format!("{}s", millis / 1000)
    } else {
        format!("{}ms", millis)
    }
}

use RetryStrategy::{Exponential, Linear};

#[rustfmt::skip]
const TABLE: &[(i32, RetryGuidance)] = &[
    // Lock conflicts and busy/unavailable platform
    (1205, RetryGuidance::retry(Exponential, 100, 3, "Deadlock victim - transient conflict, safe to retry")),
    (1222, RetryGuidance::retry(Exponential, 200, 3, "Lock timeout - retry with exponential backoff")),
    (40197, RetryGuidance::retry(Exponential, 1_000, 3, "Azure service busy - retry with backoff")),
    (40501, RetryGuidance::retry(Exponential, 2_000, 3, "Azure service busy - too many concurrent requests")),
    (40613, RetryGuidance::retry(Exponential, 1_000, 3, "Azure database unavailable - temporary issue")),
    (49918, RetryGuidance::retry(Exponential, 2_000, 2, "Insufficient resources - retry with backoff")),
    (49920, RetryGuidance::retry(Exponential, 2_000, 2, "Too many operations - retry with backoff")),
    // Connection and network failures
    (-1, RetryGuidance::retry(Linear, 5_000, 2, "Connection timeout - network issue, retry with delay")),
    (4060, RetryGuidance::retry(Linear, 3_000, 2, "Cannot open database - may be starting up")),
    (10053, RetryGuidance::retry(Linear, 2_000, 2, "Transport error - network instability")),
    (10054, RetryGuidance::retry(Linear, 2_000, 2, "Connection reset - network issue")),
    (10060, RetryGuidance::retry(Linear, 3_000, 2, "Network timeout - connectivity issue")),
    (10061, RetryGuidance::retry(Linear, 3_000, 2, "Connection refused - service may be restarting")),
    (40143, RetryGuidance::retry(Linear, 3_000, 2, "Connection initialization failed - retry")),
    (40540, RetryGuidance::retry(Linear, 5_000, 2, "Azure service error - temporary unavailability")),
    // Command and memory timeouts
    (-2, RetryGuidance::retry(Linear, 10_000, 1, "Command timeout - optimize query or increase timeout, then retry")),
    (8645, RetryGuidance::retry(Linear, 5_000, 1, "Memory timeout - retry once after delay")),
    // User errors
    (102, RetryGuidance::never("Syntax error - fix SQL statement")),
    (156, RetryGuidance::never("Syntax error near keyword - fix SQL")),
    (207, RetryGuidance::never("Invalid column name - fix query")),
    (208, RetryGuidance::never("Invalid object name - verify table/view exists")),
    (213, RetryGuidance::never("Column mismatch - fix INSERT statement")),
    (229, RetryGuidance::never("Permission denied - grant necessary permissions")),
    (230, RetryGuidance::never("Execute permission denied - grant EXECUTE permission")),
    (262, RetryGuidance::never("Permission denied - check user permissions")),
    (297, RetryGuidance::never("Permission denied - insufficient privileges")),
    (18456, RetryGuidance::never("Login failed - check credentials")),
    (547, RetryGuidance::never("Foreign key violation - verify related data exists")),
    (2601, RetryGuidance::never("Duplicate key in unique index - check data uniqueness")),
    (2627, RetryGuidance::never("Primary key violation - check for duplicate values")),
    (8152, RetryGuidance::never("String truncation - reduce data length or increase column size")),
    // Storage and consistency
    (823, RetryGuidance::never("I/O error - investigate storage subsystem")),
    (824, RetryGuidance::never("Consistency error - run DBCC CHECKDB")),
    (825, RetryGuidance::never("Read retry - investigate disk issues")),
];

static GUIDANCE: Lazy<HashMap<i32, RetryGuidance>> =
    Lazy::new(|| TABLE.iter().copied().collect());

/// Every error number with a guidance row, in ascending order.
pub fn known_codes() -> Vec<i32> {
    let mut codes: Vec<i32> = TABLE.iter().map(|(code, _)| *code).collect();
    codes.sort_unstable();
    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadlock_guidance() {
        let g = RetryGuidance::for_code(1205);
        assert!(g.should_retry);
        assert_eq!(g.strategy, RetryStrategy::Exponential);
        assert_eq!(g.delay_display(), "100ms");
        assert_eq!(g.max_retries, 3);
        assert!(g.reason.contains("Deadlock"));
    }

    #[test]
    fn test_primary_key_violation_guidance() {
        let g = RetryGuidance::for_code(2627);
        assert!(!g.should_retry);
        assert_eq!(g.strategy, RetryStrategy::None);
        assert_eq!(g.max_retries, 0);
        assert_eq!(g.delay_display(), "0ms");
        assert!(!g.reason.is_empty());
    }

    #[test]
    fn test_connection_timeout_guidance() {
        let g = RetryGuidance::for_code(-1);
        assert!(g.should_retry);
        assert_eq!(g.strategy, RetryStrategy::Linear);
        assert_eq!(g.delay_display(), "5s");
    }

    #[test]
    fn test_command_timeout_retries_once() {
        let g = RetryGuidance::for_code(-2);
        assert_eq!(g.strategy, RetryStrategy::Linear);
        assert_eq!(g.max_retries, 1);
        assert_eq!(g.delay_display(), "10s");
    }

    #[test]
    fn test_unknown_code_does_not_retry() {
        let g = RetryGuidance::for_code(50000);
        assert_eq!(*g, RetryGuidance::DO_NOT_RETRY);
        assert_eq!(g.reason, "");
        assert!(!should_retry(0));
        assert!(!should_retry(-3));
    }

    #[test]
    fn test_should_retry_agrees_with_guidance() {
        for code in known_codes() {
            assert_eq!(should_retry(code), RetryGuidance::for_code(code).should_retry);
        }
    }

    #[test]
    fn test_transient_sets() {
        for code in [1205, 1222, 40197, 40501, 40613, 49918, 49920] {
            let g = RetryGuidance::for_code(code);
            assert_eq!(g.strategy, RetryStrategy::Exponential, "{code}");
        }
        for code in [-1, 4060, 10053, 10054, 10060, 10061, 40143, 40540, -2, 8645] {
            let g = RetryGuidance::for_code(code);
            assert_eq!(g.strategy, RetryStrategy::Linear, "{code}");
        }
        for code in [102, 229, 547, 2627, 18456, 823, 824, 825] {
            assert!(!should_retry(code), "{code}");
        }
    }

    #[test]
    fn test_non_retry_rows_are_zeroed() {
        for (_, g) in TABLE.iter().filter(|(_, g)| !g.should_retry) {
            assert_eq!(g.strategy, RetryStrategy::None);
            assert_eq!(g.suggested_delay, Duration::ZERO);
            assert_eq!(g.max_retries, 0);
        }
    }

    #[test]
    fn test_table_has_no_duplicates() {
        assert_eq!(GUIDANCE.len(), TABLE.len());
    }

    #[test]
    fn test_format_delay() {
        assert_eq!(format_delay(Duration::ZERO), "0ms");
        assert_eq!(format_delay(Duration::from_millis(100)), "100ms");
        assert_eq!(format_delay(Duration::from_millis(1500)), "1500ms");
        assert_eq!(format_delay(Duration::from_secs(2)), "2s");
    }

    #[test]
    fn test_exponential_schedule() {
        let g = RetryGuidance::for_code(1205);
        assert_eq!(g.delay_for_attempt(0), None);
        assert_eq!(g.delay_for_attempt(1), Some(Duration::from_millis(100)));
        assert_eq!(g.delay_for_attempt(2), Some(Duration::from_millis(200)));
        assert_eq!(g.delay_for_attempt(3), Some(Duration::from_millis(400)));
        assert_eq!(g.delay_for_attempt(4), None);
    }

    #[test]
    fn test_linear_schedule() {
        let g = RetryGuidance::for_code(10054);
        assert_eq!(g.delay_for_attempt(1), Some(Duration::from_secs(2)));
        assert_eq!(g.delay_for_attempt(2), Some(Duration::from_secs(4)));
        assert_eq!(g.delay_for_attempt(3), None);
    }

    #[test]
    fn test_no_schedule_without_retry() {
        assert_eq!(RetryGuidance::for_code(2627).delay_for_attempt(1), None);
        assert_eq!(RetryGuidance::DO_NOT_RETRY.delay_for_attempt(1), None);
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(RetryStrategy::None.to_string(), "None");
        assert_eq!(RetryStrategy::Linear.to_string(), "Linear");
        assert_eq!(RetryStrategy::Exponential.to_string(), "Exponential");
    }
}
