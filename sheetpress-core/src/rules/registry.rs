//! Rule registry for managing and creating rule instances

use super::*;
use crate::config::PressConfig;
use std::collections::HashSet;

/// Get all valid configuration tokens (Rule IDs, Category Prefixes, "ALL")
pub fn get_all_valid_tokens() -> HashSet<String> {
    let mut tokens = HashSet::new();
    tokens.insert("ALL".to_string());
    tokens.insert("COL".to_string());

    let config = PressConfig::default();
    for rule in create_all_rules(&config) {
        tokens.insert(rule.id().to_string());
    }

    tokens
}

/// Create all enabled rules based on configuration.
///
/// Registry order is the order findings are reported in: every empty-column
/// finding precedes every format finding.
pub fn create_enabled_rules(config: &PressConfig) -> Vec<Box<dyn ColumnRule>> {
    create_all_rules(config)
        .into_iter()
        .filter(|rule| config.is_rule_enabled(rule.id()))
        .collect()
}

/// Create instances of all available rules
fn create_all_rules(config: &PressConfig) -> Vec<Box<dyn ColumnRule>> {
    vec![
        Box::new(col001_empty_column::EmptyColumnRule),
        Box::new(col002_numeric_format::NumericFormatRule::new(config)),
    ]
}
