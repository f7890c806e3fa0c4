//! FILENAME: core/persistence/src/json.rs
//! JSON interchange: cross-tab documents out, submission records in.

use std::fs;
use std::path::{Path, PathBuf};

use engine::{Record, RecordFilter, RecordSource, SourceError};
use pivot_engine::CrossTab;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::PersistenceError;

/// Serializes a cross-tab as an indented JSON document:
/// `{"row_headers": [{"id", "text"}], "column_headers": [...], "cells": {"i": {"j": n}}}`.
pub fn crosstab_to_json(table: &CrossTab) -> Result<String, PersistenceError> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    table.to_document().serialize(&mut serializer)?;
    String::from_utf8(buffer).map_err(|e| PersistenceError::InvalidFormat(e.to_string()))
}

/// Parses a JSON array of submission objects.
pub fn records_from_json(json: &str) -> Result<Vec<Record>, PersistenceError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let items = value.as_array().ok_or_else(|| {
        PersistenceError::InvalidFormat("expected a JSON array of records".to_string())
    })?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            Record::from_json_value(item)
                .map_err(|e| PersistenceError::InvalidFormat(format!("record {}: {}", i, e)))
        })
        .collect()
}

pub fn load_records_json(path: &Path) -> Result<Vec<Record>, PersistenceError> {
    let text = fs::read_to_string(path)?;
    records_from_json(&text)
}

/// A record source backed by a JSON array file, re-read on every fetch.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileSource { path: path.into() }
    }
}

impl RecordSource for JsonFileSource {
    fn fetch(&self, filter: &RecordFilter) -> Result<Vec<Record>, SourceError> {
        let records = load_records_json(&self.path).map_err(|e| match e {
            PersistenceError::Io(io) => SourceError::Unavailable(format!("{:?}: {}", self.path, io)),
            other => SourceError::InvalidRecord(other.to_string()),
        })?;
        Ok(records.into_iter().filter(|r| filter.matches(r)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::FieldValue;
    use pivot_engine::{cross_tab, FieldSelector};

    #[test]
    fn test_crosstab_json_shape() {
        let records = records_from_json(
            r#"[{"type": "A", "zone": "north"},
                {"type": "A", "zone": "south"},
                {"type": "B", "zone": "north"}]"#,
        )
        .unwrap();
        let table = cross_tab(&records, &FieldSelector::field("type"), &FieldSelector::field("zone")).unwrap();

        let json = crosstab_to_json(&table).unwrap();
        assert!(json.contains("\n    \"row_headers\""));

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["column_headers"][1]["text"], "south");
        assert_eq!(parsed["cells"]["0"]["1"], 1);
        assert_eq!(parsed["cells"]["1"]["0"], 1);
        assert!(parsed["cells"]["1"].get("1").is_none());
    }

    #[test]
    fn test_records_from_json() {
        let records = records_from_json(r#"[{"a": 1}, {"b": "x"}]"#).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("a"), Some(&FieldValue::Integer(1)));
    }

    #[test]
    fn test_large_integer_cell_is_exact() {
        let records = records_from_json(r#"[{"id": 18446744073709551615}]"#).unwrap();
        let table = engine::build_table(&records, None, None).unwrap();
        assert_eq!(table.data_sheet().unwrap().rows[1], vec!["18446744073709551615".to_string()]);
    }

    #[test]
    fn test_records_from_json_rejects_non_objects() {
        let err = records_from_json(r#"[{"a": 1}, 5]"#).unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidFormat(ref m) if m.starts_with("record 1")));

        assert!(matches!(
            records_from_json(r#"{"a": 1}"#),
            Err(PersistenceError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_missing_file_source_is_unavailable() {
        let source = JsonFileSource::new("/nonexistent/submissions.json");
        assert!(matches!(
            source.fetch(&RecordFilter::All),
            Err(SourceError::Unavailable(_))
        ));
    }
}
