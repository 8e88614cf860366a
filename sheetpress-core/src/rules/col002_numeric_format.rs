//! COL002: Non-numeric values in price/amount columns

use super::ColumnRule;
use crate::config::PressConfig;
use crate::finding::{FindingKind, ValidationFinding};
use crate::reader::SheetData;
use anyhow::Result;
use std::collections::HashMap;

const KEYWORDS_PARAM: &str = "numeric_header_keywords";

pub struct NumericFormatRule {
    /// Lowercase substrings marking a header as numeric
    keywords: Vec<String>,
    sheet_keywords: HashMap<String, Vec<String>>,
}

impl NumericFormatRule {
    pub fn new(config: &PressConfig) -> Self {
        let keywords = config
            .get_param_array(KEYWORDS_PARAM, None)
            .map(lowercase_all)
            .unwrap_or_else(default_keywords);

        let sheet_keywords = config
            .sheets
            .iter()
            .filter(|(_, sheet)| sheet.params.contains_key(KEYWORDS_PARAM))
            .filter_map(|(name, _)| {
                let values = config.get_param_array(KEYWORDS_PARAM, Some(name))?;
                Some((name.clone(), lowercase_all(values)))
            })
            .collect();

        Self {
            keywords,
            sheet_keywords,
        }
    }

    fn keywords_for(&self, sheet_name: &str) -> &[String] {
        self.sheet_keywords
            .get(sheet_name)
            .unwrap_or(&self.keywords)
    }
}

fn default_keywords() -> Vec<String> {
    vec!["price".to_string(), "amount".to_string()]
}

fn lowercase_all(values: Vec<String>) -> Vec<String> {
    values.into_iter().map(|v| v.to_lowercase()).collect()
}

impl ColumnRule for NumericFormatRule {
    fn id(&self) -> &str {
        "COL002"
    }

    fn check(&self, sheet: &SheetData) -> Result<Vec<ValidationFinding>> {
        let mut findings = Vec::new();
        let keywords = self.keywords_for(&sheet.name);

        for (col, header) in sheet.headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let lowered = header.to_lowercase();
            if !keywords.iter().any(|k| lowered.contains(k.as_str())) {
                continue;
            }

            let bad_rows: Vec<u32> = sheet
                .column(col)
                .enumerate()
                .filter(|(_, cell)| !cell.is_falsy() && !cell.parses_as_number())
                .map(|(row, _)| row as u32 + 1)
                .collect();

            // One finding covers the whole column
            if !bad_rows.is_empty() {
                findings.push(
                    ValidationFinding::new(
                        self.id(),
                        FindingKind::FormatError,
                        header.clone(),
                        format!("Invalid format in column \"{}\"", header),
                    )
                    .with_rows(bad_rows),
                );
            }
        }

        Ok(findings)
    }
}
