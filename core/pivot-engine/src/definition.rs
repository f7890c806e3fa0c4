//! FILENAME: core/pivot-engine/src/definition.rs
//! Cross-Tab Definition - The serializable configuration.
//!
//! This module contains the types needed to DESCRIBE a frequency table:
//! which named dimensions go on the row and column axes, and how public
//! dimension names map onto record field keys.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PivotError;

// ============================================================================
// DIMENSIONS
// ============================================================================

/// A categorical dimension, read from one record field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension {
    /// Public name (e.g. "surveyor").
    pub name: String,

    /// Record field holding the dimension value (e.g. "surveyor_name").
    pub field: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, field: impl Into<String>) -> Self {
        Dimension {
            name: name.into(),
            field: field.into(),
        }
    }
}

/// Maps public dimension names to record fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionRegistry {
    fields: BTreeMap<String, String>,
}

impl DimensionRegistry {
    pub fn empty() -> Self {
        DimensionRegistry {
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, field: impl Into<String>) -> Self {
        self.fields.insert(name.into(), field.into());
        self
    }

    pub fn resolve(&self, name: &str) -> Result<Dimension, PivotError> {
        self.fields
            .get(name)
            .map(|field| Dimension::new(name, field.clone()))
            .ok_or_else(|| PivotError::UnknownDimension(name.to_string()))
    }

    /// Dimension names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }
}

impl Default for DimensionRegistry {
    fn default() -> Self {
        DimensionRegistry::empty()
            .with("survey", "survey_type")
            .with("surveyor", "surveyor_name")
            .with("date", "date")
            .with("location", "district")
    }
}

// ============================================================================
// CROSS-TAB DEFINITION
// ============================================================================

/// What to cross-tabulate: a row dimension against a column dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossTabDefinition {
    pub rows: Dimension,
    pub columns: Dimension,
}

impl CrossTabDefinition {
    pub fn new(rows: Dimension, columns: Dimension) -> Self {
        CrossTabDefinition { rows, columns }
    }

    /// Resolves both axes by public name.
    pub fn from_names(
        registry: &DimensionRegistry,
        rows: &str,
        columns: &str,
    ) -> Result<Self, PivotError> {
        Ok(CrossTabDefinition {
            rows: registry.resolve(rows)?,
            columns: registry.resolve(columns)?,
        })
    }
}
