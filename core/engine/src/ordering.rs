//! FILENAME: core/engine/src/ordering.rs
//! PURPOSE: Column ordering, with or without a form schema as ordering authority.
//! CONTEXT: A form definition knows the canonical sequence in which its fields
//! appear in the survey. When one is available the export follows it; otherwise
//! columns are sorted lexicographically.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::OrderingError;

// ============================================================================
// ORDERING AUTHORITY
// ============================================================================

/// An external capability that knows the canonical field sequence of a form.
pub trait FieldOrdering {
    /// Orders `keys` by their position in the canonical sequence.
    /// Implementations may omit keys they do not know; `order_columns`
    /// appends those afterwards.
    fn order(&self, keys: &[String]) -> Result<Vec<String>, OrderingError>;

    /// Human labels for the given keys. Keys without a label are omitted.
    fn labels_for(&self, keys: &[String]) -> Vec<(String, String)>;

    /// Every key the authority knows, in canonical order.
    fn known_keys(&self) -> Vec<String>;
}

/// One field of a form definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub xpath: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// Canonical field sequence and labels of a single form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "FormSchemaDef")]
pub struct FormSchema {
    pub form_id: String,
    pub fields: Vec<SchemaField>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

/// Wire shape of a form schema; the position index is rebuilt on load.
#[derive(Deserialize)]
struct FormSchemaDef {
    form_id: String,
    fields: Vec<SchemaField>,
}

impl From<FormSchemaDef> for FormSchema {
    fn from(def: FormSchemaDef) -> Self {
        FormSchema::new(def.form_id, def.fields)
    }
}

impl FormSchema {
    pub fn new(form_id: impl Into<String>, fields: Vec<SchemaField>) -> Self {
        let mut schema = FormSchema {
            form_id: form_id.into(),
            fields,
            positions: HashMap::new(),
        };
        schema.index_positions();
        schema
    }

    /// Builds a schema from `(xpath, label)` pairs in canonical order.
    pub fn from_labels<'a, I>(form_id: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let fields = fields
            .into_iter()
            .map(|(xpath, label)| SchemaField {
                xpath: xpath.to_string(),
                label: Some(label.to_string()),
            })
            .collect();
        FormSchema::new(form_id, fields)
    }

    /// Parses a form definition of the shape `{"form_id": .., "fields": [{"xpath", "label"}]}`.
    pub fn from_json(json: &str) -> Result<Self, OrderingError> {
        serde_json::from_str(json).map_err(|e| OrderingError::SchemaUnavailable(e.to_string()))
    }

    /// First occurrence wins when a form lists an xpath twice.
    fn index_positions(&mut self) {
        self.positions.clear();
        for (i, field) in self.fields.iter().enumerate() {
            self.positions.entry(field.xpath.clone()).or_insert(i);
        }
    }

    pub fn position(&self, xpath: &str) -> Option<usize> {
        self.positions.get(xpath).copied()
    }

    pub fn label(&self, xpath: &str) -> Option<&str> {
        self.position(xpath)
            .and_then(|i| self.fields.get(i))
            .and_then(|f| f.label.as_deref())
    }

    /// All `(xpath, label)` pairs of the form in canonical order.
    pub fn xpaths_and_labels(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .filter_map(|f| f.label.as_ref().map(|l| (f.xpath.clone(), l.clone())))
            .collect()
    }
}

impl FieldOrdering for FormSchema {
    fn order(&self, keys: &[String]) -> Result<Vec<String>, OrderingError> {
        if self.fields.is_empty() {
            return Err(OrderingError::SchemaUnavailable(format!(
                "form '{}' has no fields",
                self.form_id
            )));
        }
        let mut known: Vec<(usize, &String)> = keys
            .iter()
            .filter_map(|k| self.position(k).map(|p| (p, k)))
            .collect();
        known.sort_by_key(|(p, _)| *p);
        Ok(known.into_iter().map(|(_, k)| k.clone()).collect())
    }

    fn labels_for(&self, keys: &[String]) -> Vec<(String, String)> {
        keys.iter()
            .filter_map(|k| self.label(k).map(|l| (k.clone(), l.to_string())))
            .collect()
    }

    fn known_keys(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.fields
            .iter()
            .filter(|f| seen.insert(f.xpath.as_str()))
            .map(|f| f.xpath.clone())
            .collect()
    }
}

// ============================================================================
// COLUMN ORDERER
// ============================================================================

/// Orders a discovered key set into column sequence.
///
/// Without an authority the keys are sorted lexicographically. With one, the
/// authority's order is used, and keys it does not place are appended after
/// the known keys in lexicographic order. If the authority fails, the result
/// is the lexicographic order. The output is always a permutation of `keys`.
pub fn order_columns(keys: &HashSet<String>, ordering: Option<&dyn FieldOrdering>) -> Vec<String> {
    let mut sorted: Vec<String> = keys.iter().cloned().collect();
    sorted.sort();

    let authority = match ordering {
        Some(authority) => authority,
        None => return sorted,
    };

    let ordered = match authority.order(&sorted) {
        Ok(ordered) => ordered,
        Err(e) => {
            warn!("Ordering authority failed, using lexicographic order: {}", e);
            return sorted;
        }
    };

    let mut placed: HashSet<&str> = HashSet::with_capacity(sorted.len());
    let mut result = Vec::with_capacity(sorted.len());
    for key in &ordered {
        // Drop invented keys and duplicates from the authority
        if keys.contains(key) && placed.insert(key.as_str()) {
            result.push(key.clone());
        }
    }

    let unknown: Vec<String> = sorted
        .iter()
        .filter(|k| !placed.contains(k.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        debug!("{} keys unknown to ordering authority appended", unknown.len());
    }
    result.extend(unknown);
    result
}
