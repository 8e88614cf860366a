//! Column validation rule system

pub mod registry;

// Rule implementations
pub mod col001_empty_column;
pub mod col002_numeric_format;

use crate::finding::ValidationFinding;
use crate::reader::SheetData;
use anyhow::Result;

/// Trait that all column rules must implement
pub trait ColumnRule: Send + Sync {
    /// Unique rule identifier (e.g., "COL001")
    fn id(&self) -> &str;

    /// Check a materialized sheet, emitting findings in column order.
    /// Columns with a blank header are not checked.
    fn check(&self, sheet: &SheetData) -> Result<Vec<ValidationFinding>>;
}
