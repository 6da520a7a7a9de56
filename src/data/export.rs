use rust_xlsxwriter::Workbook;

use super::model::{CellValue, Table};
use crate::error::{DashboardError, Result};

/// Sheet name used for every workbook download.
pub const SHEET_NAME: &str = "Sheet1";

/// Comma-separated UTF-8 text with a header row and no index column.
pub fn to_delimited_text(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b',')
        .from_writer(Vec::new());

    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.values.iter().map(CellValue::to_field))?;
    }

    writer
        .into_inner()
        .map_err(|e| DashboardError::Export(e.to_string()))
}

/// Single-sheet `.xlsx` workbook with a header row and no index column.
/// Null cells are left blank.
pub fn to_spreadsheet(table: &Table) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string(0, sheet_col(col)?, name)?;
    }

    for (i, record) in table.rows.iter().enumerate() {
        let row = sheet_row(i + 1)?;
        for (j, value) in record.values.iter().enumerate() {
            let col = sheet_col(j)?;
            match value {
                CellValue::String(s) => {
                    worksheet.write_string(row, col, s)?;
                }
                CellValue::Integer(v) => {
                    worksheet.write_number(row, col, *v as f64)?;
                }
                CellValue::Float(v) => {
                    worksheet.write_number(row, col, *v)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
                CellValue::Null => {}
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn sheet_row(i: usize) -> Result<u32> {
    u32::try_from(i).map_err(|_| DashboardError::Export(format!("row {i} out of range")))
}

fn sheet_col(j: usize) -> Result<u16> {
    u16::try_from(j).map_err(|_| DashboardError::Export(format!("column {j} out of range")))
}
