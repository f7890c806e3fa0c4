//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Main library entry point for the submission tabulation engine.
//! CONTEXT: Re-exports public types and modules for use by other crates.
//!
//! Pipeline: `resolve_keys` discovers the column set of a record batch,
//! `order_columns` sequences it, and `build_table` materializes the export.

pub mod error;
pub mod export;
pub mod keys;
pub mod ordering;
pub mod record;
pub mod source;
pub mod table;
pub mod value;

// Re-export commonly used types at the crate root
pub use error::{EngineError, OrderingError, SourceError};
pub use export::{map_data_points, SubmissionExporter};
pub use keys::resolve_keys;
pub use ordering::{order_columns, FieldOrdering, FormSchema, SchemaField};
pub use record::Record;
pub use source::{FormRegistry, InMemorySource, RecordFilter, RecordSource, SchemaRegistry, ID_STRING};
pub use table::{
    build_table, build_table_with_options, Sheet, Table, TabulationOptions, MISSING_VALUE,
};
pub use value::FieldValue;
