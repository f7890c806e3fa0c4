//! FILENAME: core/engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Malformed value: {0}")]
    MalformedValue(String),

    #[error("Malformed record {record_index}, field '{field}': {reason}")]
    MalformedRecord {
        record_index: usize,
        field: String,
        reason: String,
    },

    #[error("Record source error: {0}")]
    Source(#[from] SourceError),
}

/// Raised by an ordering authority that cannot resolve a key set.
/// Never escapes `order_columns`, which falls back to lexicographic order.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderingError {
    #[error("Form schema unavailable: {0}")]
    SchemaUnavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("Record source unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}
