use std::io::{Cursor, Read, Seek};

use calamine::{Data, Reader, Xls, Xlsx};

use super::model::{CellValue, Record, Table};
use crate::error::{DashboardError, Result};

/// Delimiter the campaign exports use.
pub const DEFAULT_DELIMITER: u8 = b';';

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Parse an uploaded payload whose format is not declared in advance.
///
/// Tried in order:
/// * delimited text with `delimiter` (`;` for the campaign files)
/// * comma-separated text, when the first attempt fails or yields a single
///   column whose header contains a comma (the dashboard's own CSV download)
/// * spreadsheet workbook (`.xlsx`, then legacy `.xls`), first sheet
///
/// Column headers are taken from the first row. Fails with
/// [`DashboardError::DataFormat`] if no parse succeeds.
pub fn load(bytes: &[u8], delimiter: u8) -> Result<Table> {
    let text = parse_delimited(bytes, delimiter);
    let text = match text {
        Ok(table) if !is_comma_separated(&table, delimiter) => Ok(table),
        other => match parse_delimited(bytes, COMMA) {
            Ok(table) if delimiter != COMMA && table.columns.len() > 1 => {
                log::debug!("parsed as comma-separated text instead");
                Ok(table)
            }
            _ => other,
        },
    };

    let text_err = match text {
        Ok(table) => {
            log::debug!("parsed {} rows as delimited text", table.len());
            return Ok(table);
        }
        Err(e) => e,
    };
    log::debug!("not delimited text ({text_err}), trying spreadsheet");

    parse_spreadsheet(bytes).map_err(|sheet_err| {
        DashboardError::DataFormat(format!(
            "neither delimited text ({text_err}) nor a spreadsheet ({sheet_err})"
        ))
    })
}

const COMMA: u8 = b',';

/// A one-column table whose header only makes sense split on commas.
fn is_comma_separated(table: &Table, delimiter: u8) -> bool {
    delimiter != COMMA && table.columns.len() == 1 && table.columns[0].contains(',')
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

/// Header row with column names, one record per line.
/// Every field is typed with [`CellValue::guess`].
pub fn parse_delimited(bytes: &[u8], delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(bytes);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| DashboardError::DataFormat(format!("reading header: {e}")))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if columns.iter().all(|c| c.is_empty()) {
        return Err(DashboardError::DataFormat("no header row".into()));
    }

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record =
            result.map_err(|e| DashboardError::DataFormat(format!("row {row_no}: {e}")))?;
        rows.push(Record::new(record.iter().map(CellValue::guess).collect()));
    }

    Ok(Table::new(columns, rows))
}

// ---------------------------------------------------------------------------
// Spreadsheet
// ---------------------------------------------------------------------------

/// Read the first sheet of an `.xlsx` or `.xls` workbook held in memory.
pub fn parse_spreadsheet(bytes: &[u8]) -> Result<Table> {
    let xlsx_err = match Xlsx::new(Cursor::new(bytes)) {
        Ok(workbook) => return first_sheet::<_, Cursor<&[u8]>>(workbook),
        Err(e) => e,
    };
    match Xls::new(Cursor::new(bytes)) {
        Ok(workbook) => first_sheet::<_, Cursor<&[u8]>>(workbook),
        Err(xls_err) => Err(DashboardError::DataFormat(format!(
            "not a workbook (xlsx: {xlsx_err}; xls: {xls_err})"
        ))),
    }
}

fn first_sheet<R, RS>(mut workbook: R) -> Result<Table>
where
    R: Reader<RS>,
    RS: Read + Seek,
    R::Error: std::fmt::Display,
{
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DashboardError::DataFormat("workbook has no sheets".into()))?
        .map_err(|e| DashboardError::DataFormat(format!("reading first sheet: {e}")))?;

    let mut sheet_rows = range.rows();
    let columns: Vec<String> = sheet_rows
        .next()
        .ok_or_else(|| DashboardError::DataFormat("first sheet is empty".into()))?
        .iter()
        .map(|cell| cell.to_string())
        .collect();

    let rows = sheet_rows
        .map(|cells| Record::new(cells.iter().map(cell_value).collect()))
        .collect();

    Ok(Table::new(columns, rows))
}

/// Map a workbook cell to a [`CellValue`].
///
/// Workbooks store every number as a float, so integral floats come back as
/// integers. Text is typed like a delimited field.
fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => CellValue::Integer(*f as i64),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) => CellValue::guess(s),
        other => CellValue::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANK_CSV: &str = "\"age\";\"job\";\"marital\";\"y\"\n\
                            56;\"housemaid\";\"married\";\"no\"\n\
                            37;\"services\";\"single\";\"yes\"\n";

    #[test]
    fn semicolon_text_is_parsed_with_typed_cells() {
        let table = load(BANK_CSV.as_bytes(), DEFAULT_DELIMITER).unwrap();
        assert_eq!(table.columns, vec!["age", "job", "marital", "y"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].values[0], CellValue::Integer(56));
        assert_eq!(table.rows[1].values[1], CellValue::from("services"));
    }

    #[test]
    fn ragged_text_falls_through_to_format_error() {
        let bytes = b"age;job\n30;admin.;extra\n";
        let err = load(bytes, DEFAULT_DELIMITER).unwrap_err();
        assert!(matches!(err, DashboardError::DataFormat(_)), "{err}");
    }

    #[test]
    fn binary_garbage_is_a_format_error() {
        let bytes = [0xffu8, 0xfe, 0x00, 0x01, 0x9c, 0x80, 0x00];
        assert!(matches!(
            load(&bytes, DEFAULT_DELIMITER),
            Err(DashboardError::DataFormat(_))
        ));
    }

    #[test]
    fn empty_payload_is_a_format_error() {
        assert!(matches!(
            load(b"", DEFAULT_DELIMITER),
            Err(DashboardError::DataFormat(_))
        ));
    }

    #[test]
    fn workbook_payload_falls_back_to_spreadsheet_parser() {
        let source = load(BANK_CSV.as_bytes(), DEFAULT_DELIMITER).unwrap();
        let bytes = crate::data::export::to_spreadsheet(&source).unwrap();
        let table = load(&bytes, DEFAULT_DELIMITER).unwrap();
        assert_eq!(table, source);
    }

    #[test]
    fn comma_download_loads_back_unchanged() {
        let source = load(BANK_CSV.as_bytes(), DEFAULT_DELIMITER).unwrap();
        let bytes = crate::data::export::to_delimited_text(&source).unwrap();
        assert_eq!(load(&bytes, DEFAULT_DELIMITER).unwrap(), source);
    }

    #[test]
    fn single_semicolon_column_is_not_reparsed() {
        let table = load(b"job\nadmin.\nretired\n", DEFAULT_DELIMITER).unwrap();
        assert_eq!(table.columns, vec!["job"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn integral_workbook_floats_become_integers() {
        assert_eq!(cell_value(&Data::Float(42.0)), CellValue::Integer(42));
        assert_eq!(cell_value(&Data::Float(4.857)), CellValue::Float(4.857));
        assert_eq!(cell_value(&Data::Empty), CellValue::Null);
        assert_eq!(cell_value(&Data::String("yes".into())), CellValue::from("yes"));
    }
}
