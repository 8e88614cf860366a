//! Column validator running the enabled rules over a materialized sheet

use anyhow::Result;
use log::debug;

use crate::config::PressConfig;
use crate::finding::ValidationFinding;
use crate::reader::SheetData;
use crate::rules::{self, ColumnRule};

pub struct Validator {
    config: PressConfig,
    rules: Vec<Box<dyn ColumnRule>>,
}

impl Validator {
    /// Create a validator with default configuration
    pub fn new() -> Self {
        Self::with_config(PressConfig::default())
    }

    pub fn with_config(config: PressConfig) -> Self {
        let rules = rules::registry::create_enabled_rules(&config);
        Self { config, rules }
    }

    /// Validate one sheet.
    ///
    /// Findings come out in rule order and, within a rule, in column order.
    /// A sheet with no rows produces no findings.
    pub fn validate(&self, sheet: &SheetData) -> Result<Vec<ValidationFinding>> {
        let mut findings = Vec::new();
        if sheet.is_empty() {
            return Ok(findings);
        }

        for rule in &self.rules {
            if !self.config.is_rule_enabled_for_sheet(rule.id(), &sheet.name) {
                continue;
            }
            findings.extend(rule.check(sheet)?);
        }

        debug!(
            "validated sheet '{}': {} finding(s)",
            sheet.name,
            findings.len()
        );
        Ok(findings)
    }

    /// Validate and hand the result to `on_validation_complete`, which is
    /// called even when the list is empty.
    pub fn validate_and_report<F>(
        &self,
        sheet: &SheetData,
        mut on_validation_complete: F,
    ) -> Result<Vec<ValidationFinding>>
    where
        F: FnMut(&[ValidationFinding]),
    {
        let findings = self.validate(sheet)?;
        on_validation_complete(&findings);
        Ok(findings)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
