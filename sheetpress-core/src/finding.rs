//! Validation findings reported for a loaded sheet

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level of a finding, used for color-coding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Kind of data-quality issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Every data row is blank in this column
    EmptyColumn,
    /// A value could not be read the way the column requires
    FormatError,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::EmptyColumn => "empty",
            FindingKind::FormatError => "format",
        }
    }

    /// Default display severity for this kind
    pub fn severity(&self) -> Severity {
        match self {
            FindingKind::EmptyColumn => Severity::Warning,
            FindingKind::FormatError => Severity::Info,
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule id attached to findings synthesized from load failures
pub const LOAD_RULE_ID: &str = "LOAD";

/// A reported data-quality issue. Not a fatal error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFinding {
    /// Rule ID (e.g., "COL001")
    pub rule_id: String,
    pub kind: FindingKind,
    /// Header name of the offending column ("File"/"Sheet" for load failures)
    pub column: String,
    /// Human-readable message
    pub message: String,
    pub severity: Severity,
    /// 1-based data row indices, when the rule can point at specific rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_rows: Option<Vec<u32>>,
}

impl ValidationFinding {
    pub fn new(
        rule_id: impl Into<String>,
        kind: FindingKind,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            kind,
            column: column.into(),
            message: message.into(),
            severity: kind.severity(),
            affected_rows: None,
        }
    }

    pub fn with_rows(mut self, rows: Vec<u32>) -> Self {
        self.affected_rows = Some(rows);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Finding reported when the file bytes are not a readable spreadsheet
    pub fn unreadable_file() -> Self {
        Self::new(
            LOAD_RULE_ID,
            FindingKind::FormatError,
            "File",
            "Error reading Excel file",
        )
        .with_severity(Severity::Error)
    }

    /// Finding reported when a sheet cannot be materialized
    pub fn unloadable_sheet(sheet_name: &str) -> Self {
        Self::new(
            LOAD_RULE_ID,
            FindingKind::FormatError,
            "Sheet",
            format!("Error loading sheet: {}", sheet_name),
        )
        .with_severity(Severity::Error)
    }

    /// Whether the 1-based data row is flagged by this finding
    pub fn covers_row(&self, row: u32) -> bool {
        self.affected_rows
            .as_ref()
            .is_some_and(|rows| rows.contains(&row))
    }
}
