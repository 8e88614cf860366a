//! Spreadsheet loading and sheet materialization using calamine

use calamine::{Data, Range, Reader, Sheets, open_workbook_auto_from_rs};
use log::debug;
use std::io::Cursor;
use std::path::Path;

use crate::error::IngestError;

pub mod workbook;

pub use workbook::{CellValue, SheetData, Workbook, Worksheet};

/// MIME type accepted for upload to the conversion backend
pub const SPREADSHEET_MIME: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Whether a file name carries the spreadsheet extension accepted for upload
pub fn is_accepted_upload(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"))
}

/// Parse raw file bytes into a workbook
pub fn load_workbook(bytes: &[u8]) -> Result<Workbook, IngestError> {
    let mut sheets: Sheets<_> = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

    let sheet_names = sheets.sheet_names();
    if sheet_names.is_empty() {
        return Err(IngestError::FileFormat(
            "workbook contains no sheets".to_string(),
        ));
    }

    let mut worksheets = Vec::with_capacity(sheet_names.len());
    for name in sheet_names {
        let (range, read_error) = match sheets.worksheet_range(&name) {
            Ok(range) => (Some(range), None),
            Err(e) => (None, Some(e.to_string())),
        };
        debug!(
            "read sheet '{}' ({} rows)",
            name,
            range.as_ref().map_or(0, |r| r.height())
        );
        worksheets.push(Worksheet {
            name,
            range,
            read_error,
        });
    }

    Ok(Workbook::new(worksheets))
}

/// Read a workbook from a file path
pub fn read_workbook<P: AsRef<Path>>(path: P) -> Result<Workbook, IngestError> {
    let bytes = std::fs::read(path.as_ref())?;
    load_workbook(&bytes)
}

/// Materialize one sheet as header row plus data rows
pub fn materialize(workbook: &Workbook, sheet_name: &str) -> Result<SheetData, IngestError> {
    let sheet = workbook
        .get_sheet(sheet_name)
        .ok_or_else(|| IngestError::SheetLoad {
            sheet: sheet_name.to_string(),
            reason: "sheet not found in workbook".to_string(),
        })?;

    if let Some(reason) = &sheet.read_error {
        return Err(IngestError::SheetLoad {
            sheet: sheet_name.to_string(),
            reason: reason.clone(),
        });
    }

    let mut rows = sheet.range.as_ref().map(range_to_rows).unwrap_or_default();
    if rows.is_empty() {
        return Ok(SheetData::new(sheet_name, Vec::new(), Vec::new()));
    }

    let headers = rows.remove(0).iter().map(|c| c.to_string()).collect();
    debug!("materialized sheet '{}' with {} data rows", sheet_name, rows.len());

    Ok(SheetData::new(sheet_name, headers, rows))
}

/// Convert a used range into rows, dropping trailing empty cells of each row
fn range_to_rows(range: &Range<Data>) -> Vec<Vec<CellValue>> {
    if range.is_empty() {
        return Vec::new();
    }

    range
        .rows()
        .map(|row| {
            let mut cells: Vec<CellValue> = row.iter().map(CellValue::from).collect();
            while cells.last().is_some_and(|c| c.is_empty()) {
                cells.pop();
            }
            cells
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workbook_with(range: Option<Range<Data>>, read_error: Option<&str>) -> Workbook {
        Workbook::new(vec![Worksheet {
            name: "Laptops".to_string(),
            range,
            read_error: read_error.map(str::to_string),
        }])
    }

    #[test]
    fn test_garbage_bytes_are_file_format_error() {
        let result = load_workbook(b"definitely not a spreadsheet");
        assert!(matches!(result, Err(IngestError::FileFormat(_))));
    }

    #[test]
    fn test_missing_sheet() {
        let workbook = workbook_with(None, None);
        let result = materialize(&workbook, "Servers");
        match result {
            Err(IngestError::SheetLoad { sheet, .. }) => assert_eq!(sheet, "Servers"),
            other => panic!("Expected SheetLoad error, got {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_sheet() {
        let workbook = workbook_with(None, Some("bad xml"));
        assert!(matches!(
            materialize(&workbook, "Laptops"),
            Err(IngestError::SheetLoad { .. })
        ));
    }

    #[test]
    fn test_empty_sheet_has_no_rows() {
        let workbook = workbook_with(Some(Range::empty()), None);
        let sheet = materialize(&workbook, "Laptops").unwrap();
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_rows_are_trimmed() {
        let mut range = Range::new((0, 0), (2, 2));
        range.set_value((0, 0), Data::String("Product Number".to_string()));
        range.set_value((0, 1), Data::String("Description".to_string()));
        range.set_value((0, 2), Data::String("Price".to_string()));
        range.set_value((1, 0), Data::String("PN-001".to_string()));
        range.set_value((2, 0), Data::String("PN-002".to_string()));
        range.set_value((2, 2), Data::Float(1299.0));

        let workbook = workbook_with(Some(range), None);
        let sheet = materialize(&workbook, "Laptops").unwrap();

        assert_eq!(sheet.headers, vec!["Product Number", "Description", "Price"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].len(), 1);
        assert_eq!(sheet.rows[1].len(), 3);
        assert_eq!(sheet.cell(1, 2), &CellValue::Number(1299.0));
    }

    #[test]
    fn test_accepted_upload() {
        assert!(is_accepted_upload("prices.xlsx"));
        assert!(is_accepted_upload("PRICES.XLSX"));
        assert!(!is_accepted_upload("prices.pdf"));
        assert!(!is_accepted_upload("prices"));
    }
}
