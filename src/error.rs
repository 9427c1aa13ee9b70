//! Error types for the mapper and the execution facade.

use crate::value::{ColumnKind, Value};

/// Errors raised while turning a result row into a record.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// The driver reported a declared column type the classifier does not know.
    #[error("unsupported column type `{type_name}` for column `{column}`")]
    UnsupportedColumnType { column: String, type_name: String },

    /// A row value could not be read into its scratch cell.
    #[error("failed to scan column `{column}` (index {index}): {source}")]
    RowScan {
        column: String,
        index: usize,
        #[source]
        source: rusqlite::Error,
    },

    /// A column value does not fit the kind of the destination field.
    #[error("column `{column}` of kind {column_kind} cannot be assigned to field `{field}` of kind {field_kind}")]
    FieldTypeMismatch {
        field: &'static str,
        field_kind: ColumnKind,
        column: String,
        column_kind: ColumnKind,
    },
}

/// Errors returned by [`SqliteDb`](crate::sqlite::SqliteDb) and friends.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Opening the database or the liveness check failed.
    #[error("failed to open database at {path}: {source}")]
    Connection {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Closing the connection failed.
    #[error("failed to close database: {0}")]
    Close(#[source] rusqlite::Error),

    #[error("exec failed for `{statement}` with args {args:?}: {source}")]
    Exec {
        statement: String,
        args: Vec<Value>,
        #[source]
        source: rusqlite::Error,
    },

    #[error("query failed for `{statement}` with args {args:?}: {source}")]
    Query {
        statement: String,
        args: Vec<Value>,
        #[source]
        source: rusqlite::Error,
    },

    /// Result marshaling failed part way through a query.
    #[error("mapping rows of `{statement}` with args {args:?} failed: {source}")]
    Mapping {
        statement: String,
        args: Vec<Value>,
        #[source]
        source: MapError,
    },

    /// Single-record query produced no row.
    #[error("query `{statement}` with args {args:?} returned no rows")]
    EmptyResult { statement: String, args: Vec<Value> },

    /// Single-record query produced more than one row.
    #[error("query `{statement}` with args {args:?} returned more than one row")]
    MultipleRows { statement: String, args: Vec<Value> },

    /// The async service was used before `start` or after `stop`.
    #[error("sqlite service is not started")]
    NotStarted,
}

impl Error {
    /// The marshaling error behind a [`Error::Mapping`], if any.
    pub fn map_error(&self) -> Option<&MapError> {
        match self {
            Error::Mapping { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
