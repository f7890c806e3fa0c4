//! FILENAME: core/engine/src/export.rs
//! PURPOSE: End-to-end export of one form's submissions into a `Table`.
//! CONTEXT: Wires the record source and the schema registry into the
//! tabulation builder. The schema is optional; a form without one still
//! exports, with lexicographic columns and no dictionary sheet.

use std::collections::HashMap;

use log::debug;

use crate::error::EngineError;
use crate::ordering::FieldOrdering;
use crate::record::Record;
use crate::source::{RecordFilter, RecordSource, SchemaRegistry, ID_STRING};
use crate::table::{build_table_with_options, Table, TabulationOptions};

// Fields surfaced on the submissions map
pub const DATE_TIME_START: &str = "start";
pub const SURVEYOR_NAME: &str = "_surveyor_name";
pub const INSTANCE_DOC_NAME: &str = "_name";
pub const DISTRICT_ID: &str = "_district_id";
pub const GPS: &str = "_geolocation";

pub const MAP_FIELDS: [&str; 5] = [DATE_TIME_START, SURVEYOR_NAME, INSTANCE_DOC_NAME, DISTRICT_ID, GPS];

pub struct SubmissionExporter<'a> {
    source: &'a dyn RecordSource,
    schemas: &'a dyn SchemaRegistry,
    options: TabulationOptions,
}

impl<'a> SubmissionExporter<'a> {
    pub fn new(source: &'a dyn RecordSource, schemas: &'a dyn SchemaRegistry) -> Self {
        SubmissionExporter {
            source,
            schemas,
            options: TabulationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TabulationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &TabulationOptions {
        &self.options
    }

    /// Fetches the submissions of `form_id` and tabulates them.
    pub fn worksheets(&self, form_id: &str) -> Result<Table, EngineError> {
        let records = self
            .source
            .fetch(&RecordFilter::field_equals(ID_STRING, form_id))?;
        let schema = self.schemas.schema_for(form_id);
        debug!(
            "Exporting {} submissions of '{}' (schema: {})",
            records.len(),
            form_id,
            schema.is_some()
        );

        match schema {
            Some(schema) => {
                let labels: HashMap<String, String> =
                    schema.xpaths_and_labels().into_iter().collect();
                build_table_with_options(
                    &records,
                    Some(&schema as &dyn FieldOrdering),
                    Some(&labels),
                    &self.options,
                )
            }
            None => build_table_with_options(&records, None, None, &self.options),
        }
    }
}

/// Fetches every submission with a GPS fix, reduced to the fields the map needs.
/// A record keeps only the map fields it actually has.
pub fn map_data_points(source: &dyn RecordSource) -> Result<Vec<Record>, EngineError> {
    let records = source.fetch(&RecordFilter::HasField(GPS.to_string()))?;
    Ok(records
        .iter()
        .map(|record| {
            MAP_FIELDS
                .iter()
                .filter_map(|field| record.get(field).map(|v| (*field, v.clone())))
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::ordering::FormSchema;
    use crate::source::{FormRegistry, InMemorySource};

    struct OfflineSource;

    impl RecordSource for OfflineSource {
        fn fetch(&self, _filter: &RecordFilter) -> Result<Vec<Record>, SourceError> {
            Err(SourceError::Unavailable("connection refused".to_string()))
        }
    }

    fn household_source() -> InMemorySource {
        InMemorySource::new(vec![
            Record::from_pairs([(ID_STRING, "household"), ("hh/name", "Ada"), ("hh/size", "4")]),
            Record::from_pairs([(ID_STRING, "household"), ("hh/name", "Bola")]),
            Record::from_pairs([(ID_STRING, "school"), ("school/name", "Central")]),
        ])
    }

    #[test]
    fn test_export_without_schema() {
        let source = household_source();
        let registry = FormRegistry::new();
        let table = SubmissionExporter::new(&source, &registry)
            .worksheets("household")
            .unwrap();

        assert_eq!(table.sheets.len(), 1);
        let data = table.data_sheet().unwrap();
        assert_eq!(data.header(), &[ID_STRING, "hh/name", "hh/size"]);
        assert_eq!(data.data_rows()[1], vec!["household", "Bola", "n/a"]);
    }

    #[test]
    fn test_export_with_schema() {
        let source = household_source();
        let mut registry = FormRegistry::new();
        registry.register(FormSchema::from_labels(
            "household",
            [("hh/size", "Household size"), ("hh/name", "Head of household")],
        ));

        let table = SubmissionExporter::new(&source, &registry)
            .worksheets("household")
            .unwrap();

        let data = table.sheet("Data").unwrap();
        assert_eq!(data.header(), &["hh/size", "hh/name", ID_STRING]);
        let dictionary = table.sheet("Dictionary").unwrap();
        assert_eq!(dictionary.rows[1], vec!["hh/size", "Household size"]);
        assert_eq!(dictionary.rows[3], vec![ID_STRING, "n/a"]);
    }

    #[test]
    fn test_source_failure_propagates() {
        let registry = FormRegistry::new();
        let err = SubmissionExporter::new(&OfflineSource, &registry)
            .worksheets("household")
            .unwrap_err();
        assert!(matches!(err, EngineError::Source(SourceError::Unavailable(_))));
    }

    #[test]
    fn test_map_data_points_projects_fields() {
        let source = InMemorySource::new(vec![
            Record::from_pairs([(GPS, "9.1 7.4 0 0"), (SURVEYOR_NAME, "Musa"), ("hh/name", "Ada")]),
            Record::from_pairs([("hh/name", "Bola")]),
        ]);

        let points = map_data_points(&source).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].len(), 2);
        assert!(points[0].contains_key(GPS));
        assert!(!points[0].contains_key("hh/name"));
    }
}
