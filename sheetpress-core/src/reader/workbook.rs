//! Workbook data structures

use calamine::{Data, Range};
use serde::{Serialize, Serializer};
use std::fmt;

/// A parsed spreadsheet file
#[derive(Debug, Clone)]
pub struct Workbook {
    pub(crate) sheets: Vec<Worksheet>,
}

impl Workbook {
    pub(crate) fn new(sheets: Vec<Worksheet>) -> Self {
        Self { sheets }
    }

    /// Get all sheet names, in workbook order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Name of the first sheet
    pub fn first_sheet_name(&self) -> Option<&str> {
        self.sheets.first().map(|s| s.name.as_str())
    }

    /// Get a sheet by name
    pub fn get_sheet(&self, name: &str) -> Option<&Worksheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

/// One tab of a workbook, as read from the file
#[derive(Debug, Clone)]
pub struct Worksheet {
    pub name: String,
    pub(crate) range: Option<Range<Data>>,
    /// Error message if the sheet's cells could not be read
    pub read_error: Option<String>,
}

/// A sheet materialized as a header row plus data rows.
///
/// Rows are aligned to the header by column index but may be shorter than it;
/// use [`SheetData::cell`] to index defensively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetData {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetData {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// True when the sheet had no rows at all (not even a header)
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    /// Cell at the given data row and column; missing cells read as empty
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&CellValue::Empty)
    }

    /// Iterate the cells of one column across all data rows
    pub fn column(&self, col: usize) -> impl Iterator<Item = &CellValue> {
        self.rows
            .iter()
            .map(move |r| r.get(col).unwrap_or(&CellValue::Empty))
    }
}

/// Cell value types
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(String),
}

impl CellValue {
    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Blank in the loose sense used for empty-row and empty-column checks:
    /// absent, empty text, zero, NaN, `false`, or an error value.
    pub fn is_falsy(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(n) => *n == 0.0 || n.is_nan(),
            CellValue::Boolean(b) => !b,
            CellValue::Error(_) => true,
        }
    }

    /// Whether the value reads as a number under loose spreadsheet rules:
    /// surrounding whitespace is ignored, hex/octal/binary literals and
    /// `Infinity` are accepted, currency symbols and grouping commas are not.
    pub fn parses_as_number(&self) -> bool {
        match self {
            // Error values carry no data and are treated as absent
            CellValue::Empty | CellValue::Number(_) | CellValue::Boolean(_) | CellValue::Error(_) => {
                true
            }
            CellValue::Text(s) => text_parses_as_number(s),
        }
    }

    /// Get the text if this is a text cell
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) => f.write_str(&format_number(*n)),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Boolean(b) => write!(f, "{}", b),
            CellValue::Error(e) => f.write_str(e),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_none(),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Text(s) | CellValue::Error(s) => serializer.serialize_str(s),
            CellValue::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Bool(b) => CellValue::Boolean(*b),
            Data::Error(e) => CellValue::Error(e.to_string()),
            Data::Empty => CellValue::Empty,
            Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
            Data::DateTimeIso(s) => CellValue::Text(s.clone()),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
        }
    }
}

/// Integral values print without a fractional part ("1299", not "1299.0")
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn text_parses_as_number(s: &str) -> bool {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return true;
    }

    let radix = match trimmed.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        // Arbitrarily long literals are fine; they just lose precision
        let digits = &trimmed[2..];
        return !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix));
    }

    if matches!(trimmed, "Infinity" | "+Infinity" | "-Infinity") {
        return true;
    }

    // Overflow to infinity ("1e400") still counts as a number, but Rust's
    // own "inf"/"NaN" spellings do not
    trimmed.parse::<f64>().is_ok()
        && !trimmed
            .chars()
            .any(|c| matches!(c, 'i' | 'I' | 'n' | 'N'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falsy_values() {
        assert!(CellValue::Empty.is_falsy());
        assert!(CellValue::Text(String::new()).is_falsy());
        assert!(CellValue::Number(0.0).is_falsy());
        assert!(CellValue::Boolean(false).is_falsy());

        assert!(!CellValue::Text(" ".to_string()).is_falsy());
        assert!(!CellValue::Number(12.5).is_falsy());
        assert!(!CellValue::Boolean(true).is_falsy());
        assert!(CellValue::Error("#N/A".to_string()).is_falsy());
    }

    #[test]
    fn test_numeric_text() {
        for ok in [
            "12",
            " 1299.99 ",
            "-3",
            "1e3",
            "1e400",
            "0x1F",
            "0xFFFFFFFFFFFFFFFFFFFF",
            "Infinity",
            ".5",
        ] {
            assert!(
                CellValue::Text(ok.to_string()).parses_as_number(),
                "{ok:?} should parse"
            );
        }
        for bad in ["$12", "1,000", "abc", "inf", "infinity", "NaN", "12 USD", "0xZZ", "0x", "-0x10"] {
            assert!(
                !CellValue::Text(bad.to_string()).parses_as_number(),
                "{bad:?} should not parse"
            );
        }
        assert!(CellValue::Error("#VALUE!".to_string()).parses_as_number());
    }

    #[test]
    fn test_error_cells_read_as_blank() {
        let cell = CellValue::from(&Data::Error(calamine::CellErrorType::NA));
        assert!(cell.is_falsy());
        assert!(cell.parses_as_number());
        // Still shown in previews
        assert_eq!(cell.to_string(), "#N/A");
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Number(1299.0).to_string(), "1299");
        assert_eq!(CellValue::Number(12.5).to_string(), "12.5");
        assert_eq!(CellValue::Empty.to_string(), "");
        assert_eq!(CellValue::Text("PN-001".to_string()).to_string(), "PN-001");
    }

    #[test]
    fn test_defensive_indexing() {
        let sheet = SheetData::new(
            "Laptops",
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            vec![vec![CellValue::Text("x".to_string())]],
        );
        assert_eq!(sheet.cell(0, 2), &CellValue::Empty);
        assert_eq!(sheet.cell(5, 0), &CellValue::Empty);
        assert_eq!(sheet.column(1).count(), 1);
    }
}
