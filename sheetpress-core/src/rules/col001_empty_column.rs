//! COL001: Columns with no data

use super::ColumnRule;
use crate::finding::{FindingKind, ValidationFinding};
use crate::reader::SheetData;
use anyhow::Result;

pub struct EmptyColumnRule;

impl ColumnRule for EmptyColumnRule {
    fn id(&self) -> &str {
        "COL001"
    }

    fn check(&self, sheet: &SheetData) -> Result<Vec<ValidationFinding>> {
        let mut findings = Vec::new();

        for (col, header) in sheet.headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            // A header with no data rows at all counts as empty too
            if sheet.column(col).all(|cell| cell.is_falsy()) {
                findings.push(ValidationFinding::new(
                    self.id(),
                    FindingKind::EmptyColumn,
                    header.clone(),
                    format!("Column \"{}\" is empty", header),
                ));
            }
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::CellValue;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_empty_columns() {
        let sheet = SheetData::new(
            "Laptops",
            vec!["Product Number".to_string(), "Notes".to_string(), "Stock".to_string()],
            vec![
                vec![text("PN-001"), CellValue::Empty, CellValue::Number(0.0)],
                vec![text("PN-002"), text("")],
                vec![text("PN-003")],
            ],
        );

        let findings = EmptyColumnRule.check(&sheet).unwrap();

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].column, "Notes");
        assert_eq!(findings[0].message, "Column \"Notes\" is empty");
        assert_eq!(findings[0].kind, FindingKind::EmptyColumn);
        // Zero is blank for this check
        assert_eq!(findings[1].column, "Stock");
    }

    #[test]
    fn test_no_empty_columns() {
        let sheet = SheetData::new(
            "Laptops",
            vec!["Product Number".to_string(), "Price".to_string()],
            vec![vec![text("PN-001"), CellValue::Number(1299.0)]],
        );

        assert!(EmptyColumnRule.check(&sheet).unwrap().is_empty());
    }

    #[test]
    fn test_header_only_sheet() {
        let sheet = SheetData::new(
            "Laptops",
            vec!["Product Number".to_string(), "Price".to_string()],
            Vec::new(),
        );

        let findings = EmptyColumnRule.check(&sheet).unwrap();
        assert_eq!(findings.len(), 2);
    }

    #[test]
    fn test_blank_header_is_skipped() {
        let sheet = SheetData::new(
            "Laptops",
            vec!["Product Number".to_string(), String::new(), "Price".to_string()],
            vec![
                vec![text("PN-001"), CellValue::Empty, CellValue::Number(1299.0)],
                vec![text("PN-002"), CellValue::Empty, CellValue::Number(199.0)],
            ],
        );

        assert!(EmptyColumnRule.check(&sheet).unwrap().is_empty());
    }

    #[test]
    fn test_error_only_column_is_empty() {
        let sheet = SheetData::new(
            "Laptops",
            vec!["Price".to_string(), "Notes".to_string()],
            vec![
                vec![CellValue::Number(10.0), CellValue::Error("#N/A".to_string())],
                vec![CellValue::Error("#VALUE!".to_string())],
            ],
        );

        let findings = EmptyColumnRule.check(&sheet).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].column, "Notes");
    }
}
