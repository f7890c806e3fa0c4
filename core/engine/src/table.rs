//! FILENAME: core/engine/src/table.rs
//! PURPOSE: Flattens a batch of submissions into a tabular export.
//! CONTEXT: The resulting `Table` is handed to a renderer (see the persistence
//! crate); nothing here writes files or knows about spreadsheet formats.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::keys::resolve_keys;
use crate::ordering::{order_columns, FieldOrdering};
use crate::record::Record;

/// Placeholder written for a field a record does not have.
pub const MISSING_VALUE: &str = "n/a";

pub const DATA_SHEET_NAME: &str = "Data";
pub const DICTIONARY_SHEET_NAME: &str = "Dictionary";

// ============================================================================
// OPTIONS
// ============================================================================

/// Export settings. Deserializable so callers can keep them in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabulationOptions {
    /// Sentinel for fields missing from a record.
    pub missing_value: String,
    pub data_sheet_name: String,
    pub dictionary_sheet_name: String,
    /// When set, every field the ordering authority knows becomes a column,
    /// even if no record carries it.
    pub include_schema_fields: bool,
}

impl Default for TabulationOptions {
    fn default() -> Self {
        TabulationOptions {
            missing_value: MISSING_VALUE.to_string(),
            data_sheet_name: DATA_SHEET_NAME.to_string(),
            dictionary_sheet_name: DICTIONARY_SHEET_NAME.to_string(),
            include_schema_fields: false,
        }
    }
}

// ============================================================================
// TABLE
// ============================================================================

/// A named 2D grid of display strings. Row 0 is the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, header: Vec<String>) -> Self {
        Sheet {
            name: name.into(),
            rows: vec![header],
        }
    }

    pub fn header(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// An ordered sequence of sheets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub sheets: Vec<Sheet>,
}

impl Table {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// The first sheet, which holds the flattened records.
    pub fn data_sheet(&self) -> Option<&Sheet> {
        self.sheets.first()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builds the export table with default options.
pub fn build_table(
    records: &[Record],
    ordering: Option<&dyn FieldOrdering>,
    labels: Option<&HashMap<String, String>>,
) -> Result<Table, EngineError> {
    build_table_with_options(records, ordering, labels, &TabulationOptions::default())
}

/// Builds the export table.
///
/// The data sheet has one column per distinct key across `records`, ordered by
/// `order_columns`, and one row per record with the sentinel in place of any
/// missing field. A dictionary sheet of `(key, label)` rows follows when
/// `labels` is given. An empty batch yields a header-only data sheet.
pub fn build_table_with_options(
    records: &[Record],
    ordering: Option<&dyn FieldOrdering>,
    labels: Option<&HashMap<String, String>>,
    options: &TabulationOptions,
) -> Result<Table, EngineError> {
    let mut keys = resolve_keys(records);
    if let Some(authority) = ordering {
        if options.include_schema_fields {
            keys.extend(authority.known_keys());
        }
    }
    let headers = order_columns(&keys, ordering);

    let mut data = Sheet::new(options.data_sheet_name.clone(), headers.clone());
    data.rows.reserve(records.len());
    for (record_index, record) in records.iter().enumerate() {
        let row = tabulate_record(record, record_index, &headers, &options.missing_value)?;
        data.rows.push(row);
    }

    let mut sheets = vec![data];
    if let Some(labels) = labels {
        sheets.push(dictionary_sheet(&headers, labels, options));
    }

    debug!(
        "Tabulated {} records into {} columns, {} sheets",
        records.len(),
        headers.len(),
        sheets.len()
    );
    Ok(Table { sheets })
}

fn tabulate_record(
    record: &Record,
    record_index: usize,
    headers: &[String],
    missing: &str,
) -> Result<Vec<String>, EngineError> {
    headers
        .iter()
        .map(|key| {
            record.display_or(key, missing).map_err(|e| EngineError::MalformedRecord {
                record_index,
                field: key.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

fn dictionary_sheet(
    headers: &[String],
    labels: &HashMap<String, String>,
    options: &TabulationOptions,
) -> Sheet {
    let mut sheet = Sheet::new(
        options.dictionary_sheet_name.clone(),
        vec!["Name".to_string(), "Label".to_string()],
    );
    for key in headers {
        let label = labels
            .get(key)
            .cloned()
            .unwrap_or_else(|| options.missing_value.clone());
        sheet.rows.push(vec![key.clone(), label]);
    }
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::FormSchema;
    use crate::value::FieldValue;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_fields_get_sentinel() {
        let records = vec![
            Record::from_pairs([("a", "1"), ("b", "2")]),
            Record::from_pairs([("a", "3")]),
        ];

        let table = build_table(&records, None, None).unwrap();
        assert_eq!(table.sheets.len(), 1);

        let data = table.data_sheet().unwrap();
        assert_eq!(data.name, "Data");
        assert_eq!(data.header(), row(&["a", "b"]).as_slice());
        assert_eq!(data.data_rows(), &[row(&["1", "2"]), row(&["3", "n/a"])]);
    }

    #[test]
    fn test_empty_records() {
        let table = build_table(&[], None, None).unwrap();
        let data = table.data_sheet().unwrap();
        assert!(data.header().is_empty());
        assert!(data.data_rows().is_empty());
    }

    #[test]
    fn test_empty_records_with_schema_fields() {
        let schema = FormSchema::from_labels("f", [("x", "Ex"), ("y", "Why")]);
        let options = TabulationOptions {
            include_schema_fields: true,
            ..TabulationOptions::default()
        };

        let table = build_table_with_options(&[], Some(&schema), None, &options).unwrap();
        let data = table.data_sheet().unwrap();
        assert_eq!(data.header(), row(&["x", "y"]).as_slice());
        assert_eq!(data.row_count(), 1);
    }

    #[test]
    fn test_dictionary_sheet_follows_headers() {
        let schema = FormSchema::from_labels("f", [("b", "Bee"), ("a", "Ay")]);
        let labels: HashMap<String, String> = schema.xpaths_and_labels().into_iter().collect();
        let records = vec![Record::from_pairs([("a", "1"), ("b", "2"), ("c", "3")])];

        let table = build_table(&records, Some(&schema), Some(&labels)).unwrap();
        assert_eq!(table.sheets.len(), 2);

        let data = table.sheet("Data").unwrap();
        assert_eq!(data.header(), row(&["b", "a", "c"]).as_slice());
        assert_eq!(data.data_rows(), &[row(&["2", "1", "3"])]);

        let dictionary = table.sheet("Dictionary").unwrap();
        assert_eq!(
            dictionary.rows,
            vec![
                row(&["Name", "Label"]),
                row(&["b", "Bee"]),
                row(&["a", "Ay"]),
                row(&["c", "n/a"]),
            ]
        );
    }

    #[test]
    fn test_custom_sentinel() {
        let options = TabulationOptions {
            missing_value: String::new(),
            ..TabulationOptions::default()
        };
        let records = vec![
            Record::from_pairs([("a", "1")]),
            Record::from_pairs([("b", "2")]),
        ];

        let table = build_table_with_options(&records, None, None, &options).unwrap();
        assert_eq!(
            table.data_sheet().unwrap().data_rows(),
            &[row(&["1", ""]), row(&["", "2"])]
        );
    }

    #[test]
    fn test_malformed_record_propagates() {
        let records = vec![
            Record::from_pairs([("a", FieldValue::Integer(1))]),
            Record::from_pairs([("a", FieldValue::Float(f64::NAN))]),
        ];

        let err = build_table(&records, None, None).unwrap_err();
        assert!(matches!(
            err,
            EngineError::MalformedRecord { record_index: 1, ref field, .. } if field == "a"
        ));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: TabulationOptions =
            serde_json::from_str(r#"{"missing_value": "-"}"#).unwrap();
        assert_eq!(options.missing_value, "-");
        assert_eq!(options.data_sheet_name, "Data");
        assert!(!options.include_schema_fields);
    }
}
