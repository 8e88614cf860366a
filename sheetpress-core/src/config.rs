//! Configuration system for validation rules, column mapping and collaborators

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::extract::ColumnMapping;
use crate::policy::GatePolicy;

/// Default file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "sheetpress.toml";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PressConfig {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub sheets: HashMap<String, SheetConfig>,
    #[serde(default)]
    pub columns: ColumnMapping,
    #[serde(default)]
    pub gate: GatePolicy,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

impl PressConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: PressConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Check if a rule is enabled globally
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        if self
            .global
            .disabled_rules
            .iter()
            .any(|selector| matches_rule_selector(selector, rule_id))
        {
            return false;
        }

        // Nothing listed means everything is enabled
        if self.global.enabled_rules.is_empty() {
            return true;
        }

        self.global
            .enabled_rules
            .iter()
            .any(|selector| matches_rule_selector(selector, rule_id))
    }

    /// Check if a rule is enabled for a specific sheet
    pub fn is_rule_enabled_for_sheet(&self, rule_id: &str, sheet_name: &str) -> bool {
        if !self.is_rule_enabled(rule_id) {
            return false;
        }

        if let Some(sheet_config) = self.sheets.get(sheet_name) {
            if sheet_config
                .disabled_rules
                .iter()
                .any(|selector| matches_rule_selector(selector, rule_id))
            {
                return false;
            }
        }

        true
    }

    /// Validate the configuration against a set of valid tokens
    pub fn validate_rules(&self, valid_tokens: &HashSet<String>) -> Result<()> {
        // "ALL" would silence every check, which is not a valid global disable
        for rule in &self.global.disabled_rules {
            if rule == "ALL" {
                anyhow::bail!("Configuration error: 'ALL' is not allowed in global disabled_rules");
            }
            if !valid_tokens.contains(rule) {
                anyhow::bail!(
                    "Configuration error: Unknown rule or category '{}' in global disabled_rules",
                    rule
                );
            }
        }

        for rule in &self.global.enabled_rules {
            if !valid_tokens.contains(rule) {
                anyhow::bail!(
                    "Configuration error: Unknown rule or category '{}' in global enabled_rules",
                    rule
                );
            }
        }

        for (sheet_name, sheet_config) in &self.sheets {
            for rule in &sheet_config.disabled_rules {
                if !valid_tokens.contains(rule) {
                    anyhow::bail!(
                        "Configuration error: Unknown rule or category '{}' in sheet '{}' disabled_rules",
                        rule,
                        sheet_name
                    );
                }
            }
        }

        if self.history.capacity == 0 {
            anyhow::bail!("Configuration error: history capacity must be at least 1");
        }

        Ok(())
    }

    /// Get a parameter value as array with fallback chain: sheet -> global
    pub fn get_param_array(&self, key: &str, sheet_name: Option<&str>) -> Option<Vec<String>> {
        if let Some(sheet) = sheet_name.and_then(|name| self.sheets.get(name)) {
            if let Some(arr) = sheet.params.get(key).and_then(string_array) {
                return Some(arr);
            }
        }

        self.global.params.get(key).and_then(string_array)
    }
}

fn string_array(value: &toml::Value) -> Option<Vec<String>> {
    value.as_array().map(|arr| {
        arr.iter()
            .filter_map(|item| item.as_str().map(|s| s.to_string()))
            .collect()
    })
}

/// Global configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// List of enabled rules (empty means all enabled)
    #[serde(default)]
    pub enabled_rules: HashSet<String>,
    /// List of disabled rules
    #[serde(default)]
    pub disabled_rules: HashSet<String>,
    #[serde(flatten)]
    pub params: HashMap<String, toml::Value>,
}

/// Sheet-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Rules disabled for this sheet
    #[serde(default)]
    pub disabled_rules: HashSet<String>,
    #[serde(flatten)]
    pub params: HashMap<String, toml::Value>,
}

/// Conversion/publishing backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:5000/api/convert".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Publish history persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Directory of the key-value store holding the history snapshot
    #[serde(default = "default_history_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            dir: default_history_dir(),
            capacity: default_history_capacity(),
        }
    }
}

fn default_history_dir() -> PathBuf {
    PathBuf::from(".sheetpress")
}

fn default_history_capacity() -> usize {
    crate::history::DEFAULT_CAPACITY
}

fn matches_rule_selector(selector: &str, rule_id: &str) -> bool {
    if selector == "ALL" {
        return true;
    }
    rule_id == selector || rule_id.starts_with(selector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::FindingKind;

    #[test]
    fn test_rule_matching() {
        assert!(matches_rule_selector("ALL", "COL001"));
        assert!(matches_rule_selector("COL", "COL001"));
        assert!(matches_rule_selector("COL001", "COL001"));
        assert!(!matches_rule_selector("COL002", "COL001"));
    }

    #[test]
    fn test_config_activation() {
        let mut config = PressConfig::default();
        assert!(config.is_rule_enabled("COL001"));

        config.global.disabled_rules.insert("COL002".to_string());
        assert!(!config.is_rule_enabled("COL002"));
        assert!(config.is_rule_enabled("COL001"));

        config.global.disabled_rules.clear();
        config.global.enabled_rules.insert("COL001".to_string());
        assert!(config.is_rule_enabled("COL001"));
        assert!(!config.is_rule_enabled("COL002"));
    }

    #[test]
    fn test_sheet_override() {
        let mut config = PressConfig::default();
        let mut sheet_config = SheetConfig::default();
        sheet_config.disabled_rules.insert("COL001".to_string());
        config.sheets.insert("Accessories".to_string(), sheet_config);

        assert!(!config.is_rule_enabled_for_sheet("COL001", "Accessories"));
        assert!(config.is_rule_enabled_for_sheet("COL001", "Laptops"));
        assert!(config.is_rule_enabled_for_sheet("COL002", "Accessories"));
    }

    #[test]
    fn test_validation() {
        let config = PressConfig::default();
        let mut tokens = HashSet::new();
        tokens.insert("ALL".to_string());
        tokens.insert("COL".to_string());
        tokens.insert("COL001".to_string());

        assert!(config.validate_rules(&tokens).is_ok());

        let mut bad_config = config.clone();
        bad_config.global.disabled_rules.insert("ALL".to_string());
        assert!(bad_config.validate_rules(&tokens).is_err());

        let mut bad_config = config.clone();
        bad_config.global.enabled_rules.insert("XYZ".to_string());
        assert!(bad_config.validate_rules(&tokens).is_err());

        let mut bad_config = config.clone();
        let mut sheet_config = SheetConfig::default();
        sheet_config.disabled_rules.insert("ABC".to_string());
        bad_config.sheets.insert("Sheet1".to_string(), sheet_config);
        assert!(bad_config.validate_rules(&tokens).is_err());

        let mut bad_config = config.clone();
        bad_config.history.capacity = 0;
        assert!(bad_config.validate_rules(&tokens).is_err());
    }

    #[test]
    fn test_from_toml() {
        let config = PressConfig::from_toml(
            r#"
[global]
disabled_rules = ["COL002"]
numeric_header_keywords = ["price", "cost"]

[sheets."Accessories"]
disabled_rules = ["COL001"]
numeric_header_keywords = ["msrp"]

[columns]
product_number = ["Product Number", "SKU"]

[gate]
block_on = ["format_error"]

[backend]
endpoint = "https://converter.example.com/api/convert"

[history]
capacity = 10
"#,
        )
        .unwrap();

        assert!(!config.is_rule_enabled("COL002"));
        assert_eq!(
            config.get_param_array("numeric_header_keywords", None),
            Some(vec!["price".to_string(), "cost".to_string()])
        );
        assert_eq!(
            config.get_param_array("numeric_header_keywords", Some("Accessories")),
            Some(vec!["msrp".to_string()])
        );
        assert_eq!(config.columns.product_number, vec!["Product Number", "SKU"]);
        // Unlisted logical fields keep their default header names
        assert_eq!(config.columns.description, vec!["Description"]);
        assert_eq!(config.gate.block_on, vec![FindingKind::FormatError]);
        assert_eq!(config.backend.endpoint, "https://converter.example.com/api/convert");
        assert_eq!(config.backend.timeout_secs, 60);
        assert_eq!(config.history.capacity, 10);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = PressConfig::from_toml("").unwrap();
        assert_eq!(config.history.capacity, 50);
        assert_eq!(config.columns.price, vec!["Price"]);
        assert_eq!(config.gate.block_on.len(), 2);
    }
}
