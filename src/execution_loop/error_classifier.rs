//! Error Classifier
//!
//! Buckets validator and executor error text so the repair prompt can add a
//! targeted hint.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlErrorClass {
    UnsafeKeyword,
    EmptyQuery,
    ColumnNotFound,
    TableNotFound,
    AmbiguousColumn,
    SyntaxError,
    Other,
}

impl fmt::Display for SqlErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlErrorClass::UnsafeKeyword => write!(f, "UnsafeKeyword"),
            SqlErrorClass::EmptyQuery => write!(f, "EmptyQuery"),
            SqlErrorClass::ColumnNotFound => write!(f, "ColumnNotFound"),
            SqlErrorClass::TableNotFound => write!(f, "TableNotFound"),
            SqlErrorClass::AmbiguousColumn => write!(f, "AmbiguousColumn"),
            SqlErrorClass::SyntaxError => write!(f, "SyntaxError"),
            SqlErrorClass::Other => write!(f, "Other"),
        }
    }
}

impl SqlErrorClass {
    pub fn hint(&self) -> &'static str {
        match self {
            SqlErrorClass::UnsafeKeyword => {
                "Only read-only SELECT statements are allowed. Remove any statement that modifies data."
            }
            SqlErrorClass::EmptyQuery => "Return a complete SELECT statement inside a ```sql block.",
            SqlErrorClass::ColumnNotFound => "A referenced column does not exist. Use only column names listed in the schema.",
            SqlErrorClass::TableNotFound => "A referenced table does not exist. Use only table names listed in the schema.",
            SqlErrorClass::AmbiguousColumn => "A column exists in more than one joined table. Qualify it with the table alias.",
            SqlErrorClass::SyntaxError => "The statement is not valid SQLite. Check keywords, commas and parentheses.",
            SqlErrorClass::Other => "Check table names, column names, and JOIN keys carefully.",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, error: &str) -> SqlErrorClass {
        let msg = error.to_lowercase();

        if msg.contains("is forbidden") || msg.contains("read-only access") {
            return SqlErrorClass::UnsafeKeyword;
        }
        if msg.contains("query is empty") {
            return SqlErrorClass::EmptyQuery;
        }
        if msg.contains("ambiguous column") {
            return SqlErrorClass::AmbiguousColumn;
        }
        if msg.contains("no such column") || (msg.contains("column") && msg.contains("does not exist")) {
            return SqlErrorClass::ColumnNotFound;
        }
        if msg.contains("no such table") || (msg.contains("table") && msg.contains("does not exist")) {
            return SqlErrorClass::TableNotFound;
        }
        if msg.contains("syntax error") || msg.contains("incomplete input") {
            return SqlErrorClass::SyntaxError;
        }

        SqlErrorClass::Other
    }
}
