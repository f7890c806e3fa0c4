//! FILENAME: core/persistence/src/lib.rs
//! Persistence Module
//!
//! Downstream consumers of the tabulation engine: renders export tables as
//! XLSX workbooks, serializes cross-tabs as JSON, and reads submissions from
//! JSON files and XForm instance XML.

mod error;
mod json;
mod xlsx_reader;
mod xlsx_writer;
mod xml_instance;

pub use error::PersistenceError;
pub use json::{crosstab_to_json, load_records_json, records_from_json, JsonFileSource};
pub use xlsx_reader::load_table_xlsx;
pub use xlsx_writer::{save_table_xlsx, table_to_xlsx_bytes};
pub use xml_instance::parse_instance_xml;

use engine::{SubmissionExporter, Table};
use serde::Serialize;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

// ============================================================================
// EXPORT ARTIFACT
// ============================================================================

/// A rendered workbook plus what a transport layer needs to deliver it.
#[derive(Debug, Clone, Serialize)]
pub struct ExportArtifact {
    pub file_name: String,
    pub content_type: &'static str,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Value for a `Content-Disposition` header.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.file_name)
    }
}

/// Renders `table` as an XLSX workbook named after `name` (usually the form id).
pub fn export_artifact(table: &Table, name: &str) -> Result<ExportArtifact, PersistenceError> {
    let bytes = table_to_xlsx_bytes(table)?;
    Ok(ExportArtifact {
        file_name: format!("{}.xlsx", name),
        content_type: XLSX_CONTENT_TYPE,
        bytes,
    })
}

/// Tabulates one form's submissions and renders them as `{form_id}.xlsx`.
pub fn export_form(
    exporter: &SubmissionExporter<'_>,
    form_id: &str,
) -> Result<ExportArtifact, PersistenceError> {
    let table = exporter.worksheets(form_id)?;
    export_artifact(&table, form_id)
}
