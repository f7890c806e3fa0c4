//! FILENAME: core/engine/src/source.rs
//! PURPOSE: Seams to the upstream stores: submission records and form schemas.
//! CONTEXT: The engine never queries a database itself. Callers plug in a
//! `RecordSource` and a `SchemaRegistry`; the in-memory versions here back the
//! tests and small batch jobs.

use std::collections::HashMap;

use crate::error::SourceError;
use crate::ordering::FormSchema;
use crate::record::Record;
use crate::value::FieldValue;

/// Field carrying the id string of the form a submission belongs to.
pub const ID_STRING: &str = "_xform_id_string";

/// Predicate a record source applies when fetching.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordFilter {
    All,
    /// Records that carry the named field.
    HasField(String),
    /// Records whose named field equals the given value.
    FieldEquals { field: String, value: FieldValue },
}

impl RecordFilter {
    pub fn field_equals(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        RecordFilter::FieldEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        match self {
            RecordFilter::All => true,
            RecordFilter::HasField(field) => record.contains_key(field),
            RecordFilter::FieldEquals { field, value } => record.get(field) == Some(value),
        }
    }
}

/// Upstream store of submissions.
pub trait RecordSource {
    fn fetch(&self, filter: &RecordFilter) -> Result<Vec<Record>, SourceError>;
}

/// Upstream store of form definitions. A form without a schema yields `None`.
pub trait SchemaRegistry {
    fn schema_for(&self, form_id: &str) -> Option<FormSchema>;
}

// ============================================================================
// IN-MEMORY IMPLEMENTATIONS
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Vec<Record>,
}

impl InMemorySource {
    pub fn new(records: Vec<Record>) -> Self {
        InMemorySource { records }
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordSource for InMemorySource {
    fn fetch(&self, filter: &RecordFilter) -> Result<Vec<Record>, SourceError> {
        Ok(self
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormRegistry {
    schemas: HashMap<String, FormSchema>,
}

impl FormRegistry {
    pub fn new() -> Self {
        FormRegistry {
            schemas: HashMap::new(),
        }
    }

    pub fn register(&mut self, schema: FormSchema) {
        self.schemas.insert(schema.form_id.clone(), schema);
    }
}

impl SchemaRegistry for FormRegistry {
    fn schema_for(&self, form_id: &str) -> Option<FormSchema> {
        self.schemas.get(form_id).cloned()
    }
}
