//! Timeout classification for SQL Server error numbers.

use std::fmt;

/// Kind of timeout an error number represents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimeoutType {
    /// Not a timeout, or a timeout of unknown origin.
    #[default]
    Unknown,
    /// Failed to establish a session within the connect timeout.
    Connection,
    /// Statement execution exceeded the command timeout.
    Command,
    /// Socket-level timeout or refusal.
    Network,
}

impl TimeoutType {
    /// Looks up the timeout type for an error number.
    ///
    /// Non-timeout codes return [`TimeoutType::Unknown`]; gate on
    /// [`is_timeout`] to tell the two apart.
    pub fn from_code(code: i32) -> Self {
        lookup(code).unwrap_or_default()
    }

    /// Stable external name of the timeout type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Connection => "Connection",
            Self::Command => "Command",
            Self::Network => "Network",
        }
    }
}

impl fmt::Display for TimeoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn lookup(code: i32) -> Option<TimeoutType> {
    match code {
        -2 => Some(TimeoutType::Command),
        -1 => Some(TimeoutType::Connection),
        10060 | 10061 => Some(TimeoutType::Network),
        _ => None,
    }
}

/// Returns true if the error number is in the timeout table.
pub fn is_timeout(code: i32) -> bool {
    lookup(code).is_some()
}
