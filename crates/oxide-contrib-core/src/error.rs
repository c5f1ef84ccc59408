//! Error types for SQL generation and row mapping.

use thiserror::Error;

use crate::value::SqlValue;

/// Errors raised while building statements or mapping rows.
///
/// None of these come from a database: they are detected before any SQL is
/// issued, or while turning a returned row into a typed value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// The table declares neither a key nor an explicit key column.
    #[error("table '{table}' must have at least one key or explicit key column")]
    MissingKey {
        /// Table name.
        table: String,
    },

    /// A single identity column was required but several are declared.
    #[error("table '{table}' has {count} identity columns, exactly one is required")]
    CompositeKey {
        /// Table name.
        table: String,
        /// Number of identity columns declared.
        count: usize,
    },

    /// No sort was given and the identity column cannot serve as one.
    #[error("no sort given for '{table}' and it has {identity_count} identity columns, expected one")]
    AmbiguousSort {
        /// Table name.
        table: String,
        /// Number of identity columns declared.
        identity_count: usize,
    },

    /// The dialect cannot run the requested strategy.
    #[error("dialect '{0}' is not supported for this operation")]
    UnsupportedDialect(String),

    /// The entity cannot be used for an identity-based statement.
    #[error("invalid entity: {0}")]
    InvalidEntity(String),

    /// An UPDATE was requested with nothing to assign.
    #[error("nothing to update on table '{table}'")]
    EmptyUpdate {
        /// Table name.
        table: String,
    },

    /// A column named by the caller is not part of the table.
    #[error("unknown column '{column}' on table '{table}'")]
    UnknownColumn {
        /// Table name.
        table: String,
        /// The column that was not found.
        column: String,
    },

    /// A `@name` placeholder has no value in the parameter mapping.
    #[error("missing value for parameter '@{0}'")]
    MissingParameter(String),

    /// A row does not carry the requested column.
    #[error("column '{0}' not found in row")]
    ColumnNotFound(String),

    /// A row value cannot be converted to the requested type.
    #[error("column '{column}' holds {found:?}, which is not a valid {expected}")]
    TypeMismatch {
        /// Column name.
        column: String,
        /// Name of the requested Rust type.
        expected: &'static str,
        /// The value actually found.
        found: SqlValue,
    },
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
