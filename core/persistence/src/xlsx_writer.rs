//! FILENAME: core/persistence/src/xlsx_writer.rs

use std::path::Path;

use engine::{Sheet, Table};
use log::debug;
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, Worksheet};

use crate::PersistenceError;

/// Excel caps worksheet names at 31 characters.
const MAX_SHEET_NAME_LEN: usize = 31;

pub fn save_table_xlsx(table: &Table, path: &Path) -> Result<(), PersistenceError> {
    let mut xlsx = build_workbook(table)?;
    xlsx.save(path)?;
    debug!("Saved {} sheets to {:?}", table.sheets.len(), path);
    Ok(())
}

pub fn table_to_xlsx_bytes(table: &Table) -> Result<Vec<u8>, PersistenceError> {
    let mut xlsx = build_workbook(table)?;
    Ok(xlsx.save_to_buffer()?)
}

fn build_workbook(table: &Table) -> Result<XlsxWorkbook, PersistenceError> {
    let mut xlsx = XlsxWorkbook::new();
    let formats = SheetFormats {
        header: Format::new().set_bold(),
        blank: Format::new().set_num_format("@"),
    };

    for sheet in &table.sheets {
        let worksheet = xlsx.add_worksheet();
        worksheet.set_name(sheet_name(&sheet.name))?;
        write_sheet(worksheet, sheet, &formats)?;
    }

    Ok(xlsx)
}

struct SheetFormats {
    header: Format,
    /// Unformatted empty strings are not stored by the writer, so empty
    /// cells are written as text-formatted blanks to keep every row in the
    /// sheet's used range.
    blank: Format,
}

fn write_sheet(
    worksheet: &mut Worksheet,
    sheet: &Sheet,
    formats: &SheetFormats,
) -> Result<(), PersistenceError> {
    for (row, cells) in sheet.rows.iter().enumerate() {
        let row = u32::try_from(row)
            .map_err(|_| PersistenceError::InvalidFormat(format!("sheet '{}' has too many rows", sheet.name)))?;
        for (col, text) in cells.iter().enumerate() {
            let col = u16::try_from(col).map_err(|_| {
                PersistenceError::InvalidFormat(format!("sheet '{}' has too many columns", sheet.name))
            })?;
            // Header row is bold; everything is written as text
            if row == 0 {
                if text.is_empty() {
                    worksheet.write_blank(row, col, &formats.header)?;
                } else {
                    worksheet.write_string_with_format(row, col, text, &formats.header)?;
                }
            } else if text.is_empty() {
                worksheet.write_blank(row, col, &formats.blank)?;
            } else {
                worksheet.write_string(row, col, text)?;
            }
        }
    }
    Ok(())
}

fn sheet_name(name: &str) -> String {
    name.chars().take(MAX_SHEET_NAME_LEN).collect()
}
