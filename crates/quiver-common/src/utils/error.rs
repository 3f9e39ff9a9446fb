//! Error types for Quiver operations.
//!
//! Every fallible call in the workspace returns [`Result<T>`]. Errors carry
//! enough structure (types, indices, bounds) that callers can match on them
//! instead of parsing messages.
//!
//! A SQL `NULL` is never an error; it decodes to `None` or [`Value::Null`].
//!
//! [`Value::Null`]: crate::types::Value::Null

use std::fmt;

use thiserror::Error;

use crate::types::LogicalType;

/// Which kind of index an [`Error::OutOfBounds`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// A row within a chunk or result.
    Row,
    /// A column within a chunk or schema.
    Column,
    /// A field within a struct vector.
    StructField,
    /// A chunk within a materialized result.
    Chunk,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IndexKind::Row => "row",
            IndexKind::Column => "column",
            IndexKind::StructField => "struct field",
            IndexKind::Chunk => "chunk",
        })
    }
}

/// The main error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The runtime column type does not match the requested type.
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Type the caller asked for (at the mismatching depth).
        expected: LogicalType,
        /// Type the vector actually has (at the mismatching depth).
        found: LogicalType,
        /// Nesting path, e.g. `column 0 > element > field b`.
        path: String,
    },

    /// An index is past the end of what it indexes.
    #[error("{what} index {index} out of bounds (bound {bound})")]
    OutOfBounds {
        /// What was being indexed.
        what: IndexKind,
        /// The offending index.
        index: usize,
        /// The exclusive upper bound.
        bound: usize,
    },

    /// The engine produced a type this crate names but does not decode.
    #[error("unsupported type: {0}")]
    Unsupported(LogicalType),

    /// The result stream has ended. This is normal termination.
    #[error("result stream exhausted")]
    Exhausted,

    /// A buffer does not follow the engine's memory layout.
    #[error("layout violation: {0}")]
    Layout(String),

    /// A string record holds bytes that are not UTF-8.
    #[error("invalid UTF-8 in string at row {row}")]
    InvalidUtf8 {
        /// Row of the offending record.
        row: usize,
    },

    /// A builder was handed a value of the wrong shape for its column.
    #[error("cannot store {found} value in {expected} column")]
    InvalidValue {
        /// Column type.
        expected: LogicalType,
        /// Kind of the value that was offered.
        found: &'static str,
    },

    /// A column or field name lookup failed.
    #[error("column not found: {name}{}", hint_suffix(.hint))]
    ColumnNotFound {
        /// The name that was looked up.
        name: String,
        /// Optional "did you mean" hint.
        hint: Option<String>,
    },

    /// A raw type code is outside the engine's enumeration.
    #[error("unknown logical type id {0}")]
    UnknownTypeId(u32),

    /// Materialization went past the configured row limit.
    #[error("result has more than {limit} rows (saw {rows})")]
    LimitExceeded {
        /// The configured limit.
        limit: usize,
        /// Rows seen when the limit tripped.
        rows: usize,
    },

    /// A caller-supplied argument or configuration is invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The chunk source failed.
    #[error("chunk source error: {0}")]
    Source(String),
}

impl Error {
    /// Creates a [`Error::TypeMismatch`].
    pub fn type_mismatch(
        expected: LogicalType,
        found: LogicalType,
        path: impl fmt::Display,
    ) -> Self {
        Self::TypeMismatch {
            expected,
            found,
            path: path.to_string(),
        }
    }

    /// Creates a [`Error::OutOfBounds`].
    #[must_use]
    pub const fn out_of_bounds(what: IndexKind, index: usize, bound: usize) -> Self {
        Self::OutOfBounds { what, index, bound }
    }

    /// Creates a [`Error::Layout`].
    pub fn layout(message: impl Into<String>) -> Self {
        Self::Layout(message.into())
    }

    /// Returns true for normal end-of-stream.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_deref().map(|h| format!(". {h}")).unwrap_or_default()
}

/// A type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_names_both_types() {
        let err = Error::type_mismatch(LogicalType::TINYINT, LogicalType::BOOLEAN, "column 0");
        let msg = err.to_string();
        assert!(msg.contains("tinyint"), "{msg}");
        assert!(msg.contains("boolean"), "{msg}");
        assert!(msg.contains("column 0"), "{msg}");
    }

    #[test]
    fn test_out_of_bounds_reports_index_and_bound() {
        let err = Error::out_of_bounds(IndexKind::Row, 10, 5);
        assert_eq!(err.to_string(), "row index 10 out of bounds (bound 5)");
    }

    #[test]
    fn test_column_not_found_hint() {
        let err = Error::ColumnNotFound {
            name: "prce".into(),
            hint: Some("Did you mean 'price'?".into()),
        };
        assert_eq!(
            err.to_string(),
            "column not found: prce. Did you mean 'price'?"
        );
        let bare = Error::ColumnNotFound {
            name: "x".into(),
            hint: None,
        };
        assert_eq!(bare.to_string(), "column not found: x");
    }

    #[test]
    fn test_is_exhausted() {
        assert!(Error::Exhausted.is_exhausted());
        assert!(!Error::Source("boom".into()).is_exhausted());
    }
}
