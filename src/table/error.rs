use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
    #[error("column not found: {0}")]
    ColumnNotFound(String),
    #[error("column {0} is not numeric")]
    NotNumeric(String),
    #[error("column {0} is not textual")]
    NotText(String),
    #[error("column {name} has unsupported type {data_type}")]
    UnsupportedType { name: String, data_type: DataType },
    #[error("column {name} has {found} values, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),
    #[error("first column must be a non-null UTC nanosecond timestamp")]
    InvalidTimestamps,
    #[error("timestamp {0} cannot be stored in nanoseconds")]
    TimestampOutOfRange(DateTime<Utc>),
    #[error("cannot concatenate tables with different columns")]
    SchemaMismatch,
}
