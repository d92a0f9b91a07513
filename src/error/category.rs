//! Operational categories for SQL Server error numbers.
//!
//! The mapping is a hand-curated table of well-known error numbers. Anything
//! outside the table is [`ErrorCategory::Unknown`]; the lookup never fails.

use std::fmt;

/// Operational category of a SQL Server error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Error number not present in the curated table.
    #[default]
    Unknown,
    /// Network, connection, or service availability failures.
    Connectivity,
    /// Malformed statements or references to missing objects.
    Syntax,
    /// Authorization, login, or grant failures.
    Permission,
    /// Referential, uniqueness, or truncation violations.
    Constraint,
    /// Lock, memory, or quota exhaustion.
    Resource,
    /// On-disk or logical corruption.
    Corruption,
    /// Optimistic concurrency (snapshot isolation) conflicts.
    Concurrency,
}

impl ErrorCategory {
    /// Every category, in declaration order.
    pub const ALL: [ErrorCategory; 8] = [
        ErrorCategory::Unknown,
        ErrorCategory::Connectivity,
        ErrorCategory::Syntax,
        ErrorCategory::Permission,
        ErrorCategory::Constraint,
        ErrorCategory::Resource,
        ErrorCategory::Corruption,
        ErrorCategory::Concurrency,
    ];

    /// Looks up the category for an error number.
    pub fn from_code(code: i32) -> Self {
        match code {
            -2 | -1 | 4060 | 10053 | 10054 | 10060 | 10061 | 40143 | 40197 | 40501 | 40540
            | 40613 => Self::Connectivity,
            102 | 156 | 207 | 208 | 213 => Self::Syntax,
            229 | 230 | 262 | 297 | 18456 => Self::Permission,
            547 | 2601 | 2627 | 8152 => Self::Constraint,
            1205 | 1222 | 8645 | 8651 | 40544 | 40549 | 40550 | 40551 | 40552 | 40553 => {
                Self::Resource
            }
            823 | 824 | 825 => Self::Corruption,
            3960 | 3961 => Self::Concurrency,
            _ => Self::Unknown,
        }
    }

    /// Stable external name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Connectivity => "Connectivity",
            Self::Syntax => "Syntax",
            Self::Permission => "Permission",
            Self::Constraint => "Constraint",
            Self::Resource => "Resource",
            Self::Corruption => "Corruption",
            Self::Concurrency => "Concurrency",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true if the error is typically caused by the caller's statement or
/// privileges rather than by the server or the network.
///
/// Login failure (18456) is deliberately absent: it is a Permission error but
/// is usually an environment problem, not a statement problem.
pub fn is_user_error(code: i32) -> bool {
    matches!(
        code,
        102 | 156 | 207 | 208 | 213 | 547 | 2601 | 2627 | 8152 | 229 | 230 | 262 | 297
    )
}

/// Every error number the category table knows about, in ascending order.
pub fn known_codes() -> Vec<i32> {
    let mut codes = vec![
        -2, -1, 4060, 10053, 10054, 10060, 10061, 40143, 40197, 40501, 40540, 40613, 102, 156,
        207, 208, 213, 229, 230, 262, 297, 18456, 547, 2601, 2627, 8152, 1205, 1222, 8645, 8651,
        40544, 40549, 40550, 40551, 40552, 40553, 823, 824, 825, 3960, 3961,
    ];
    codes.sort_unstable();
    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_codes() {
        for code in [-2, -1, 4060, 10053, 10054, 10060, 10061, 40143, 40197, 40501, 40540, 40613] {
            assert_eq!(ErrorCategory::from_code(code), ErrorCategory::Connectivity, "{code}");
        }
    }

    #[test]
    fn test_curated_samples() {
        assert_eq!(ErrorCategory::from_code(102), ErrorCategory::Syntax);
        assert_eq!(ErrorCategory::from_code(229), ErrorCategory::Permission);
        assert_eq!(ErrorCategory::from_code(18456), ErrorCategory::Permission);
        assert_eq!(ErrorCategory::from_code(2627), ErrorCategory::Constraint);
        assert_eq!(ErrorCategory::from_code(1205), ErrorCategory::Resource);
        assert_eq!(ErrorCategory::from_code(824), ErrorCategory::Corruption);
        assert_eq!(ErrorCategory::from_code(3961), ErrorCategory::Concurrency);
    }

    #[test]
    fn test_unknown_default() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::Unknown);
        assert_eq!(ErrorCategory::from_code(50000), ErrorCategory::Unknown);
        assert_eq!(ErrorCategory::from_code(-3), ErrorCategory::Unknown);
        assert_eq!(ErrorCategory::from_code(i32::MIN), ErrorCategory::Unknown);
        assert_eq!(ErrorCategory::default(), ErrorCategory::Unknown);
    }

    #[test]
    fn test_known_codes_are_categorized() {
        let codes = known_codes();
        assert_eq!(codes.len(), 41);
        for code in codes {
            assert_ne!(ErrorCategory::from_code(code), ErrorCategory::Unknown, "{code}");
        }
    }

    #[test]
    fn test_user_errors() {
        assert!(is_user_error(547));
        assert!(is_user_error(2627));
        assert!(is_user_error(102));
        assert!(is_user_error(229));
        assert!(!is_user_error(1205));
        assert!(!is_user_error(-2));
        assert!(!is_user_error(18456));
        assert!(!is_user_error(0));
    }

    #[test]
    fn test_user_errors_are_syntax_permission_or_constraint() {
        for code in known_codes().into_iter().filter(|c| is_user_error(*c)) {
            assert!(matches!(
                ErrorCategory::from_code(code),
                ErrorCategory::Syntax | ErrorCategory::Permission | ErrorCategory::Constraint
            ));
        }
    }

    #[test]
    fn test_display_names() {
        let names: Vec<String> = ErrorCategory::ALL.iter().map(|c| c.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "Unknown",
                "Connectivity",
                "Syntax",
                "Permission",
                "Constraint",
                "Resource",
                "Corruption",
                "Concurrency"
            ]
        );
    }
}
