//! Safety Validator
//!
//! Keyword-level read-only check on candidate SQL. This is a denylist scan,
//! not a parser: a mutating keyword anywhere as a whole word rejects the query.

use crate::error::{CadetError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

pub const FORBIDDEN_KEYWORDS: [&str; 8] = [
    "DROP", "DELETE", "INSERT", "UPDATE", "ALTER", "TRUNCATE", "GRANT", "REVOKE",
];

lazy_static! {
    static ref FORBIDDEN_PATTERNS: Vec<(&'static str, Regex)> = FORBIDDEN_KEYWORDS
        .iter()
        .map(|kw| (*kw, Regex::new(&format!(r"(?i)\b{}\b", kw)).unwrap()))
        .collect();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SafetyViolation {
    #[error("SQL query is empty.")]
    EmptyQuery,

    #[error("Security Alert: The keyword '{0}' is forbidden. Read-only access only.")]
    ForbiddenKeyword(&'static str),
}

/// Check that `sql` is non-blank and contains no denylisted keyword.
///
/// Keywords are reported in denylist order, so a query with both `DROP` and
/// `DELETE` always names `DROP`.
pub fn validate_sql(sql: &str) -> std::result::Result<(), SafetyViolation> {
    if sql.trim().is_empty() {
        return Err(SafetyViolation::EmptyQuery);
    }

    for (keyword, pattern) in FORBIDDEN_PATTERNS.iter() {
        if pattern.is_match(sql) {
            return Err(SafetyViolation::ForbiddenKeyword(*keyword));
        }
    }

    Ok(())
}

/// [`validate_sql`] lifted into the crate error type.
pub fn ensure_read_only(sql: &str) -> Result<()> {
    validate_sql(sql).map_err(CadetError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_is_valid() {
        assert_eq!(validate_sql("SELECT * FROM customers"), Ok(()));
    }

    #[test]
    fn test_every_keyword_rejected_case_insensitive() {
        for kw in FORBIDDEN_KEYWORDS {
            let upper = format!("{} something FROM t", kw);
            let lower = format!("select 1; {} something", kw.to_lowercase());
            assert_eq!(validate_sql(&upper), Err(SafetyViolation::ForbiddenKeyword(kw)));
            assert_eq!(validate_sql(&lower), Err(SafetyViolation::ForbiddenKeyword(kw)));
        }
    }

    #[test]
    fn test_substring_identifiers_allowed() {
        let sql = "SELECT update_date, deleted_flag, dropoff_city, created_by_grantor FROM orders";
        assert_eq!(validate_sql(sql), Ok(()));
        assert_eq!(validate_sql("SELECT last_update FROM t"), Ok(()));
    }

    #[test]
    fn test_blank_rejected() {
        for sql in ["", "   ", "\n\t  \n"] {
            let err = validate_sql(sql).unwrap_err();
            assert_eq!(err, SafetyViolation::EmptyQuery);
            assert_eq!(err.to_string(), "SQL query is empty.");
        }
    }

    #[test]
    fn test_message_names_keyword() {
        let err = validate_sql("DELETE FROM customers WHERE id = 1").unwrap_err();
        assert!(err.to_string().contains("'DELETE'"));
    }

    #[test]
    fn test_verdict_is_stable() {
        for sql in ["DROP TABLE x", "SELECT 1", "", "select update_date from t"] {
            assert_eq!(validate_sql(sql), validate_sql(sql));
        }
    }

    #[test]
    fn test_ensure_read_only_maps_error() {
        let err = ensure_read_only("TRUNCATE sales").unwrap_err();
        assert!(matches!(err, CadetError::Validation(SafetyViolation::ForbiddenKeyword("TRUNCATE"))));
    }
}
