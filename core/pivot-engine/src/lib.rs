//! FILENAME: core/pivot-engine/src/lib.rs
//! Cross-tabulation subsystem.
//!
//! This crate turns a population of submission records into a two-dimensional
//! frequency table. It depends on `engine` only for the record model
//! (Record, FieldValue) and its display normalization.
//!
//! Layers:
//! - `definition`: Serializable configuration (which dimensions to tabulate)
//! - `cache`: Value interning per axis (HOW we index)
//! - `view`: The resulting table and its interchange shape (WHAT we return)
//! - `engine`: Grouping and counting (HOW we calculate)

pub mod cache;
pub mod definition;
pub mod engine;
pub mod error;
pub mod view;

pub use cache::*;
pub use definition::*;
pub use error::PivotError;
pub use view::*;
pub use self::engine::{
    calculate_cross_tab, cross_tab, frequency_table,
    CrossTabCalculator, DimensionSelector, FieldSelector,
};
