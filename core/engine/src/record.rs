//! FILENAME: core/engine/src/record.rs
//! PURPOSE: A single schema-less survey submission.
//! CONTEXT: Keys come from a dynamic form definition (xpath-like identifiers), so
//! records in one batch need not share a key set. All access goes through the
//! typed accessors below; the engine never mutates a record it was given.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, SourceError};
use crate::value::FieldValue;

/// A field-key to value mapping for one submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Record {
            fields: BTreeMap::new(),
        }
    }

    /// Builds a record from `(key, value)` pairs. Later duplicates win.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Record {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Converts a JSON object into a record. Any other JSON shape is rejected.
    pub fn from_json_value(value: &serde_json::Value) -> Result<Self, SourceError> {
        match value {
            serde_json::Value::Object(entries) => Ok(Record {
                fields: entries
                    .iter()
                    .map(|(k, v)| (k.clone(), FieldValue::from(v)))
                    .collect(),
            }),
            other => Err(SourceError::InvalidRecord(format!(
                "expected a JSON object, found {}",
                json_kind(other)
            ))),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Returns the value under `key`, or `default` when the record lacks it.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a FieldValue) -> &'a FieldValue {
        self.fields.get(key).unwrap_or(default)
    }

    /// Returns the display string for `key`, substituting `missing` when absent.
    pub fn display_or(&self, key: &str, missing: &str) -> Result<String, EngineError> {
        match self.fields.get(key) {
            Some(value) => value.to_display_string(),
            None => Ok(missing.to_string()),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record::from_pairs(iter)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
