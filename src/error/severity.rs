//! Human-readable severity levels derived from the SQL Server error class.

use std::fmt;

/// Highest class of each level; anything above [`thresholds::CRITICAL`] is fatal.
pub mod thresholds {
    pub const INFORMATIONAL: u8 = 10;
    pub const WARNING: u8 = 13;
    pub const ERROR: u8 = 16;
    pub const SEVERE: u8 = 19;
    pub const CRITICAL: u8 = 24;
    /// Lowest class that needs an operator right away.
    pub const IMMEDIATE_ATTENTION: u8 = 20;
}

/// Ordinal severity level. Variants are declared lowest first so the derived
/// `Ord` follows severity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeverityLevel {
    /// Class 0-10: status information, not an error.
    #[default]
    Informational,
    /// Class 11-13: user-correctable issues.
    Warning,
    /// Class 14-16: user-correctable errors.
    Error,
    /// Class 17-19: software or resource errors needing an administrator.
    Severe,
    /// Class 20-24: the connection is terminated.
    Critical,
    /// Class 25 and above.
    Fatal,
}

impl SeverityLevel {
    /// Maps an error class onto a level. Total over `u8`.
    pub fn from_class(class: u8) -> Self {
        if class <= thresholds::INFORMATIONAL {
            Self::Informational
        } else if class <= thresholds::WARNING {
            Self::Warning
        } else if class <= thresholds::ERROR {
            Self::Error
        } else if class <= thresholds::SEVERE {
            Self::Severe
        } else if class <= thresholds::CRITICAL {
            Self::Critical
        } else {
            Self::Fatal
        }
    }

    /// Stable external name of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Informational => "Informational",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::Severe => "Severe",
            Self::Critical => "Critical",
            Self::Fatal => "Fatal",
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class 20 and above breaks the connection and warrants paging someone.
pub fn requires_immediate_attention(class: u8) -> bool {
    class >= thresholds::IMMEDIATE_ATTENTION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_by_class() {
        let cases = [
            (0, SeverityLevel::Informational),
            (1, SeverityLevel::Informational),
            (10, SeverityLevel::Informational),
            (11, SeverityLevel::Warning),
            (13, SeverityLevel::Warning),
            (14, SeverityLevel::Error),
            (16, SeverityLevel::Error),
            (17, SeverityLevel::Severe),
            (19, SeverityLevel::Severe),
            (20, SeverityLevel::Critical),
            (24, SeverityLevel::Critical),
            (25, SeverityLevel::Fatal),
            (255, SeverityLevel::Fatal),
        ];
        for (class, expected) in cases {
            assert_eq!(SeverityLevel::from_class(class), expected, "class {class}");
        }
    }

    #[test]
    fn test_boundaries_cross_one_level() {
        for (low, high) in [(10u8, 11u8), (13, 14), (16, 17), (19, 20), (24, 25)] {
            let a = SeverityLevel::from_class(low) as u8;
            let b = SeverityLevel::from_class(high) as u8;
            assert_eq!(b, a + 1, "{low}/{high}");
        }
    }

    #[test]
    fn test_immediate_attention() {
        assert!(!requires_immediate_attention(0));
        assert!(!requires_immediate_attention(19));
        assert!(requires_immediate_attention(20));
        assert!(requires_immediate_attention(25));
    }

    #[test]
    fn test_display() {
        assert_eq!(SeverityLevel::Critical.to_string(), "Critical");
        assert_eq!(SeverityLevel::from_class(16).to_string(), "Error");
    }
}
