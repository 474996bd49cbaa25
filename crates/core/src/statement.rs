//! The closed set of statements a scenario issues inside a session.

use core::fmt::{Debug, Formatter, Result};

/// Name of the single-column table every scenario reads and writes.
pub const TABLE: &str = "test";

/// DDL run by every driver's bootstrap once the database exists.
pub const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS test (value INT)";

/// Empties the table before each session begins.
pub const DELETE_ALL: &str = "DELETE FROM test";

/// How a driver spells bind parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParamStyle {
    /// `?`, as used by `MySQL`.
    QuestionMark,
    /// `$1`, as used by `PostgreSQL`.
    Numbered,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub enum Statement {
    /// Read every row and discard the result. Issued once at the start of a
    /// session so the engine fixes its isolation level (and snapshot).
    Scan,
    /// Insert one row.
    Insert(i32),
    /// Read any one row.
    SelectFirst,
    /// Read the row holding exactly this value.
    SelectEq(i32),
}

impl Statement {
    /// Whether the statement is issued with `fetch` rather than `execute`.
    #[must_use]
    pub const fn is_query(self) -> bool {
        matches!(self, Self::SelectFirst | Self::SelectEq(_))
    }

    /// The value bound to the statement's only parameter, if it has one.
    #[must_use]
    pub const fn param(self) -> Option<i32> {
        match self {
            Self::Insert(value) | Self::SelectEq(value) => Some(value),
            Self::Scan | Self::SelectFirst => None,
        }
    }

    #[must_use]
    pub const fn sql(self, style: ParamStyle) -> &'static str {
        match (self, style) {
            (Self::Scan, _) => "SELECT * FROM test",
            (Self::SelectFirst, _) => "SELECT value FROM test LIMIT 1",
            (Self::Insert(_), ParamStyle::QuestionMark) => "INSERT INTO test (value) VALUES (?)",
            (Self::Insert(_), ParamStyle::Numbered) => "INSERT INTO test (value) VALUES ($1)",
            (Self::SelectEq(_), ParamStyle::QuestionMark) => {
                "SELECT value FROM test WHERE value = ? LIMIT 1"
            }
            (Self::SelectEq(_), ParamStyle::Numbered) => {
                "SELECT value FROM test WHERE value = $1 LIMIT 1"
            }
        }
    }
}

impl Debug for Statement {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            Self::Scan => write!(f, "scan"),
            Self::Insert(value) => write!(f, "insert({value})"),
            Self::SelectFirst => write!(f, "select-first"),
            Self::SelectEq(value) => write!(f, "select(={value})"),
        }
    }
}
