//! FILENAME: core/persistence/src/xlsx_reader.rs
//! Reads an exported workbook back into a `Table`, every cell as display text.

use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use engine::{Sheet, Table};

use crate::PersistenceError;

pub fn load_table_xlsx(path: &Path) -> Result<Table, PersistenceError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet_names = workbook.sheet_names().to_vec();

    if sheet_names.is_empty() {
        return Err(PersistenceError::InvalidFormat(
            "Workbook contains no sheets".to_string(),
        ));
    }

    let mut sheets = Vec::with_capacity(sheet_names.len());

    for sheet_name in &sheet_names {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| PersistenceError::InvalidFormat(e.to_string()))?;

        // A range starts at its first used cell, not necessarily A1
        let (row_offset, col_offset) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Vec<String>> = vec![Vec::new(); row_offset as usize];

        for row in range.rows() {
            let mut cells = vec![String::new(); col_offset as usize];
            cells.extend(row.iter().map(cell_text));
            rows.push(cells);
        }

        if rows.is_empty() {
            rows.push(Vec::new());
        }

        sheets.push(Sheet {
            name: sheet_name.clone(),
            rows,
        });
    }

    Ok(Table { sheets })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        other => other.to_string(),
    }
}
