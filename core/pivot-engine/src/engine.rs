//! FILENAME: core/pivot-engine/src/engine.rs
//! Cross-Tab Engine - groups a record population by two dimensions and counts.
//!
//! Algorithm:
//! 1. Evaluate both selectors per record and normalize each value to its
//!    display string (so `1` and `"1"` land in the same group)
//! 2. Intern the strings per axis and count each (row, column) pair
//! 3. Sort each axis's distinct values and assign positional indices
//! 4. Re-key the pair counts by those indices into the sparse cell map

use std::collections::BTreeMap;

use engine::{FieldValue, Record};
use log::debug;
use rustc_hash::FxHashMap;

use crate::cache::{AxisCache, ValueId};
use crate::definition::{CrossTabDefinition, Dimension, DimensionRegistry};
use crate::error::PivotError;
use crate::view::{AxisHeader, CrossTab};

// ============================================================================
// SELECTORS
// ============================================================================

/// Extracts one categorical value from a record.
///
/// Selectors are expected to be total over the records they are given;
/// whatever error a selector returns is passed through unchanged.
pub trait DimensionSelector {
    fn select(&self, record: &Record, record_index: usize) -> Result<FieldValue, PivotError>;
}

impl<F> DimensionSelector for F
where
    F: Fn(&Record) -> Result<FieldValue, PivotError>,
{
    fn select(&self, record: &Record, _record_index: usize) -> Result<FieldValue, PivotError> {
        self(record)
    }
}

/// Reads a dimension straight from its record field.
#[derive(Debug, Clone)]
pub struct FieldSelector {
    dimension: Dimension,
}

impl FieldSelector {
    pub fn new(dimension: Dimension) -> Self {
        FieldSelector { dimension }
    }

    /// Selector over a raw field key, named after the key.
    pub fn field(field: impl Into<String>) -> Self {
        let field = field.into();
        FieldSelector {
            dimension: Dimension::new(field.clone(), field),
        }
    }
}

impl DimensionSelector for FieldSelector {
    fn select(&self, record: &Record, record_index: usize) -> Result<FieldValue, PivotError> {
        record
            .get(&self.dimension.field)
            .cloned()
            .ok_or_else(|| PivotError::SelectorFailure {
                dimension: self.dimension.name.clone(),
                record_index,
            })
    }
}

// ============================================================================
// CROSS-TAB CALCULATOR
// ============================================================================

/// Accumulates (row, column) observations and materializes the cross-tab.
#[derive(Debug, Default)]
pub struct CrossTabCalculator {
    rows: AxisCache,
    columns: AxisCache,
    counts: FxHashMap<(ValueId, ValueId), u64>,
    observations: u64,
}

impl CrossTabCalculator {
    pub fn new() -> Self {
        CrossTabCalculator::default()
    }

    /// Records one observation of the pair (row value, column value).
    pub fn add(&mut self, row_value: String, column_value: String) {
        let key = (self.rows.intern(row_value), self.columns.intern(column_value));
        *self.counts.entry(key).or_insert(0) += 1;
        self.observations += 1;
    }

    pub fn observations(&self) -> u64 {
        self.observations
    }

    /// Sorts both axes, assigns indices and builds the sparse cell map.
    pub fn finish(self) -> CrossTab {
        let (row_index_of, row_values) = self.rows.sorted_indices();
        let (column_index_of, column_values) = self.columns.sorted_indices();

        let cells: BTreeMap<(usize, usize), u64> = self
            .counts
            .iter()
            .map(|(&(r, c), &count)| {
                ((row_index_of[r as usize], column_index_of[c as usize]), count)
            })
            .collect();

        CrossTab {
            row_headers: build_headers(&row_values),
            column_headers: build_headers(&column_values),
            cells,
        }
    }
}

fn build_headers(sorted: &[&str]) -> Vec<AxisHeader> {
    sorted
        .iter()
        .enumerate()
        .map(|(index, text)| AxisHeader {
            index,
            text: text.to_string(),
        })
        .collect()
}

fn display(value: FieldValue, record_index: usize) -> Result<String, PivotError> {
    value
        .to_display_string()
        .map_err(|source| PivotError::MalformedValue {
            record_index,
            source,
        })
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Cross-tabulates `records` by the two selectors.
///
/// Every record contributes exactly one count, so the cell total equals
/// `records.len()`. The first selector or normalization failure aborts the
/// whole computation; no partial table is returned.
pub fn cross_tab(
    records: &[Record],
    row_selector: &dyn DimensionSelector,
    column_selector: &dyn DimensionSelector,
) -> Result<CrossTab, PivotError> {
    let mut calculator = CrossTabCalculator::new();

    for (record_index, record) in records.iter().enumerate() {
        let row_value = display(row_selector.select(record, record_index)?, record_index)?;
        let column_value = display(column_selector.select(record, record_index)?, record_index)?;
        calculator.add(row_value, column_value);
    }

    debug!(
        "Cross-tabulated {} records into {} pair groups",
        calculator.observations(),
        calculator.counts.len()
    );
    Ok(calculator.finish())
}

/// Cross-tabulates by the dimensions named in `definition`.
pub fn calculate_cross_tab(
    definition: &CrossTabDefinition,
    records: &[Record],
) -> Result<CrossTab, PivotError> {
    let rows = FieldSelector::new(definition.rows.clone());
    let columns = FieldSelector::new(definition.columns.clone());
    cross_tab(records, &rows, &columns)
}

/// Frequency table over two public dimension names, e.g. ("surveyor", "date").
pub fn frequency_table(
    records: &[Record],
    registry: &DimensionRegistry,
    rows: &str,
    columns: &str,
) -> Result<CrossTab, PivotError> {
    let definition = CrossTabDefinition::from_names(registry, rows, columns)?;
    calculate_cross_tab(&definition, records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone_records() -> Vec<Record> {
        vec![
            Record::from_pairs([("type", "A"), ("zone", "north")]),
            Record::from_pairs([("type", "A"), ("zone", "south")]),
            Record::from_pairs([("type", "B"), ("zone", "north")]),
        ]
    }

    fn header(index: usize, text: &str) -> AxisHeader {
        AxisHeader {
            index,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_basic_cross_tab() {
        let table = cross_tab(
            &zone_records(),
            &FieldSelector::field("type"),
            &FieldSelector::field("zone"),
        )
        .unwrap();

        assert_eq!(table.row_headers, vec![header(0, "A"), header(1, "B")]);
        assert_eq!(table.column_headers, vec![header(0, "north"), header(1, "south")]);

        let expected: BTreeMap<(usize, usize), u64> =
            [((0, 0), 1), ((0, 1), 1), ((1, 0), 1)].into_iter().collect();
        assert_eq!(table.cells, expected);
    }

    #[test]
    fn test_counts_accumulate() {
        let mut records = zone_records();
        records.push(Record::from_pairs([("type", "A"), ("zone", "north")]));
        records.push(Record::from_pairs([("type", "A"), ("zone", "north")]));

        let table = cross_tab(
            &records,
            &FieldSelector::field("type"),
            &FieldSelector::field("zone"),
        )
        .unwrap();
        assert_eq!(table.count(0, 0), 3);
        assert_eq!(table.total(), records.len() as u64);
    }

    #[test]
    fn test_empty_population() {
        let table = cross_tab(&[], &FieldSelector::field("a"), &FieldSelector::field("b")).unwrap();
        assert!(table.row_headers.is_empty());
        assert!(table.column_headers.is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn test_numeric_and_text_values_merge() {
        let records = vec![
            Record::from_pairs([("n", FieldValue::Integer(1)), ("c", FieldValue::text("x"))]),
            Record::from_pairs([("n", FieldValue::text("1")), ("c", FieldValue::text("x"))]),
        ];

        let table = cross_tab(&records, &FieldSelector::field("n"), &FieldSelector::field("c")).unwrap();
        assert_eq!(table.row_headers, vec![header(0, "1")]);
        assert_eq!(table.count(0, 0), 2);
    }

    #[test]
    fn test_missing_field_is_selector_failure() {
        let mut records = zone_records();
        records.push(Record::from_pairs([("type", "C")]));

        let err = cross_tab(&records, &FieldSelector::field("type"), &FieldSelector::field("zone"))
            .unwrap_err();
        assert_eq!(
            err,
            PivotError::SelectorFailure {
                dimension: "zone".to_string(),
                record_index: 3,
            }
        );
    }

    #[test]
    fn test_closure_selector() {
        let first_letter = |record: &Record| -> Result<FieldValue, PivotError> {
            let zone = record
                .get("zone")
                .and_then(|v| v.to_display_string().ok())
                .unwrap_or_default();
            Ok(FieldValue::Text(zone.chars().take(1).collect()))
        };

        let table = cross_tab(&zone_records(), &first_letter, &FieldSelector::field("type")).unwrap();
        assert_eq!(table.row_headers, vec![header(0, "n"), header(1, "s")]);
        assert_eq!(table.count_for("n", "A"), Some(1));
        assert_eq!(table.count_for("n", "B"), Some(1));
    }

    #[test]
    fn test_closure_error_passes_through() {
        let failing = |_: &Record| -> Result<FieldValue, PivotError> {
            Err(PivotError::UnknownDimension("weather".to_string()))
        };
        let err = cross_tab(&zone_records(), &failing, &FieldSelector::field("zone")).unwrap_err();
        assert_eq!(err, PivotError::UnknownDimension("weather".to_string()));
    }

    #[test]
    fn test_frequency_table_by_name() {
        let records = vec![
            Record::from_pairs([("surveyor_name", "Musa"), ("district", "Kano")]),
            Record::from_pairs([("surveyor_name", "Ada"), ("district", "Kano")]),
            Record::from_pairs([("surveyor_name", "Musa"), ("district", "Abuja")]),
        ];
        let registry = DimensionRegistry::default();

        let table = frequency_table(&records, &registry, "surveyor", "location").unwrap();
        assert_eq!(table.row_headers, vec![header(0, "Ada"), header(1, "Musa")]);
        assert_eq!(table.column_headers, vec![header(0, "Abuja"), header(1, "Kano")]);
        assert_eq!(table.to_dense(), vec![vec![0, 1], vec![1, 1]]);

        assert_eq!(
            frequency_table(&records, &registry, "surveyor", "weather"),
            Err(PivotError::UnknownDimension("weather".to_string()))
        );
    }

    #[test]
    fn test_idempotent() {
        let records = zone_records();
        let a = cross_tab(&records, &FieldSelector::field("zone"), &FieldSelector::field("type")).unwrap();
        let b = cross_tab(&records, &FieldSelector::field("zone"), &FieldSelector::field("type")).unwrap();
        assert_eq!(a, b);
    }
}
