//! FILENAME: core/pivot-engine/src/view.rs
//! Cross-Tab View - the output of the aggregator.
//!
//! `CrossTab` keeps counts sparse, keyed by (row index, column index).
//! `CrossTabDocument` is its interchange shape: headers as `{id, text}` and
//! cells nested by row then column, with absent pairs meaning zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One header on a cross-tab axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisHeader {
    #[serde(rename = "id")]
    pub index: usize,
    pub text: String,
}

/// A two-dimensional frequency table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossTab {
    pub row_headers: Vec<AxisHeader>,
    pub column_headers: Vec<AxisHeader>,
    pub cells: BTreeMap<(usize, usize), u64>,
}

impl CrossTab {
    /// Count at (row, column); zero when no record fell there.
    pub fn count(&self, row: usize, column: usize) -> u64 {
        self.cells.get(&(row, column)).copied().unwrap_or(0)
    }

    /// Count for a pair of display values, if both exist on their axes.
    pub fn count_for(&self, row_text: &str, column_text: &str) -> Option<u64> {
        let row = self.row_headers.iter().find(|h| h.text == row_text)?;
        let column = self.column_headers.iter().find(|h| h.text == column_text)?;
        Some(self.count(row.index, column.index))
    }

    /// Sum of all cells; equals the number of records tabulated.
    pub fn total(&self) -> u64 {
        self.cells.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Materializes the full grid, rows by columns, with zeros filled in.
    pub fn to_dense(&self) -> Vec<Vec<u64>> {
        let mut grid = vec![vec![0u64; self.column_headers.len()]; self.row_headers.len()];
        for (&(row, column), &count) in &self.cells {
            if let Some(cell) = grid.get_mut(row).and_then(|r| r.get_mut(column)) {
                *cell = count;
            }
        }
        grid
    }

    pub fn to_document(&self) -> CrossTabDocument {
        let mut cells: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
        for (&(row, column), &count) in &self.cells {
            cells
                .entry(row.to_string())
                .or_default()
                .insert(column.to_string(), count);
        }
        CrossTabDocument {
            row_headers: self.row_headers.clone(),
            column_headers: self.column_headers.clone(),
            cells,
        }
    }
}

/// Serializable form of a `CrossTab`. JSON object keys must be strings, so
/// cell indices are carried as decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossTabDocument {
    pub row_headers: Vec<AxisHeader>,
    pub column_headers: Vec<AxisHeader>,
    pub cells: BTreeMap<String, BTreeMap<String, u64>>,
}
