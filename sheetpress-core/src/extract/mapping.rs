//! Logical field to header-name mapping

use serde::{Deserialize, Serialize};

/// Candidate header names for each logical product field.
///
/// Matching is exact and case-sensitive; the first candidate present in the
/// header row wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub product_number: Vec<String>,
    pub description: Vec<String>,
    pub price: Vec<String>,
    pub warranty: Vec<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            product_number: vec!["Product Number".to_string()],
            description: vec!["Description".to_string()],
            price: vec!["Price".to_string()],
            warranty: vec!["Warranty".to_string()],
        }
    }
}

impl ColumnMapping {
    /// Resolve the mapping against one sheet's header row
    pub fn resolve(&self, headers: &[String]) -> ResolvedColumns {
        ResolvedColumns {
            product_number: find_column(headers, &self.product_number),
            description: find_column(headers, &self.description),
            price: find_column(headers, &self.price),
            warranty: find_column(headers, &self.warranty),
        }
    }
}

/// Column indices of the logical fields within one sheet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub product_number: Option<usize>,
    pub description: Option<usize>,
    pub price: Option<usize>,
    pub warranty: Option<usize>,
}

/// Duplicate header names collide; the rightmost column with the name wins.
fn find_column(headers: &[String], candidates: &[String]) -> Option<usize> {
    candidates.iter().find_map(|candidate| {
        if candidate.is_empty() {
            return None;
        }
        headers.iter().rposition(|h| h == candidate)
    })
}
