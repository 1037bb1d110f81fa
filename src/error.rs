//! Error types for the ferrite store.
//!
//! Every failure in the engine is reported through [`StoreError`]. Nothing is
//! retried and nothing is swallowed: schema and constraint errors abort the
//! single operation and leave state as it was, I/O errors are surfaced as is.

use std::fmt::Display;
use std::io;
use std::string::FromUtf8Error;

use thiserror::Error;

use crate::persistence::{DataType, Value};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// The kind of named object an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Database,
    Table,
    Field,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            EntityKind::Database => "database",
            EntityKind::Table => "table",
            EntityKind::Field => "field",
        };
        write!(f, "{}", kind)
    }
}

/// Errors that can occur while defining, mutating or persisting records.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database, table or field with the same name already exists.
    #[error("already exists: {kind} '{name}'")]
    DuplicateEntity { kind: EntityKind, name: String },

    /// A database, table or field could not be found.
    #[error("does not exist: {kind} '{name}'")]
    NotFound { kind: EntityKind, name: String },

    /// The value does not match the declared field type.
    #[error("type mismatch: expected {expected}, got {found}")]
    TypeMismatch { expected: DataType, found: String },

    /// A PRIMARY KEY or UNIQUE field already holds this value.
    #[error("uniqueness violation: value {value} exists")]
    UniquenessViolation { value: Value },

    /// A PRIMARY KEY or NOT NULL field was given a null.
    #[error("not null violation: field does not accept null")]
    NotNullViolation,

    /// The combination of type, keys and default is not allowed.
    #[error("invalid constraint declaration: {message}")]
    InvalidConstraintDeclaration { message: String },

    /// The row index is past the end of the column.
    #[error("out of range: index {index}, row count {rows}")]
    IndexOutOfRange { index: usize, rows: usize },

    /// A field name that the table does not declare.
    #[error("unknown field '{name}'")]
    UnknownField { name: String },

    /// A field's existing rows do not line up with the table.
    #[error("row count mismatch: table has {expected} rows, field has {found}")]
    RowCountMismatch { expected: usize, found: usize },

    /// The operation needs an active database.
    #[error("no database selected")]
    NoDatabaseSelected,

    /// A snapshot blob could not be parsed.
    #[error("format error: {message}")]
    Format { message: String },

    /// Reading or writing the snapshot file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A single field rejected its value during a row level operation.
    #[error("field '{field}' rejected value: {source}")]
    FieldRejected {
        field: String,
        #[source]
        source: Box<StoreError>,
    },
}

impl StoreError {
    pub(crate) fn invalid_declaration(message: impl Into<String>) -> StoreError {
        StoreError::InvalidConstraintDeclaration {
            message: message.into(),
        }
    }

    pub(crate) fn format(message: impl Into<String>) -> StoreError {
        StoreError::Format {
            message: message.into(),
        }
    }

    pub(crate) fn rejected_by(field: &str, source: StoreError) -> StoreError {
        StoreError::FieldRejected {
            field: field.to_string(),
            source: Box::new(source),
        }
    }

    /// The innermost cause, looking through [`StoreError::FieldRejected`].
    pub fn root_cause(&self) -> &StoreError {
        match self {
            StoreError::FieldRejected { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::format(error.to_string())
    }
}

impl From<base64::DecodeError> for StoreError {
    fn from(error: base64::DecodeError) -> Self {
        StoreError::format(error.to_string())
    }
}

impl From<FromUtf8Error> for StoreError {
    fn from(error: FromUtf8Error) -> Self {
        StoreError::format(error.to_string())
    }
}
