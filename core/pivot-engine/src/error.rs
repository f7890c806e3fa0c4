//! FILENAME: core/pivot-engine/src/error.rs

use engine::EngineError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PivotError {
    #[error("Unknown dimension: {0}")]
    UnknownDimension(String),

    #[error("Dimension '{dimension}' has no value for record {record_index}")]
    SelectorFailure {
        dimension: String,
        record_index: usize,
    },

    #[error("Record {record_index}: {source}")]
    MalformedValue {
        record_index: usize,
        #[source]
        source: EngineError,
    },
}
