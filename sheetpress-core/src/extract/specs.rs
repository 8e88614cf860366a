//! Specification mining over free-text product descriptions
//!
//! Best-effort pattern matching: misses and coincidental matches are
//! expected. Each key is present only when its pattern matched.

use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::sync::OnceLock;

/// Mined specification value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SpecValue {
    Text(String),
    List(Vec<String>),
}

/// Specification key → value map, in mining order: pattern keys in table
/// order, then `features`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Specifications(Vec<(String, SpecValue)>);

impl Specifications {
    pub fn get(&self, key: &str) -> Option<&SpecValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Text value of a pattern key
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(SpecValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Matched feature keywords, in vocabulary order
    pub fn features(&self) -> &[String] {
        match self.get(FEATURES_KEY) {
            Some(SpecValue::List(list)) => list,
            _ => &[],
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SpecValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }
}

impl Serialize for Specifications {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

pub const FEATURES_KEY: &str = "features";

/// Feature vocabulary, in output order
pub const FEATURE_KEYWORDS: [&str; 8] = [
    "Fingerprint",
    "Backlit",
    "Bluetooth",
    "Wi-Fi",
    "USB",
    "HDMI",
    "DisplayPort",
    "Thunderbolt",
];

/// Specification keys and their patterns. Keys are evaluated independently;
/// for each key the patterns are tried in order and the first one that
/// matches anywhere supplies the value.
const SPEC_PATTERNS: &[(&str, &[&str])] = &[
    ("processor", &[r"(?i)Intel|AMD|Core|Ryzen|i\d|i\d-\d{4}[A-Z]?"]),
    ("ram", &[r"(?i)\d+GB(?:\s+RAM)?"]),
    // A drive-qualified size is preferred over the first bare size, which is
    // usually the memory
    ("storage", &[r"(?i)\d+GB\s+(?:SSD|HDD)", r"(?i)\d+GB(?:\s+SSD|\s+HDD)?"]),
    ("display", &[r#"(?i)\d+(?:\.\d+)?["'](?:\s+FHD|\s+UHD|\s+4K)?"#]),
    ("os", &[r"(?i)Windows\s+\d+(?:\s+Pro)?|Linux|macOS"]),
    ("warranty", &[r"(?i)\d+\s+Year(?:\s+on-site)?"]),
];

fn compiled_patterns() -> &'static [(&'static str, Vec<Regex>)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Vec<Regex>)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        SPEC_PATTERNS
            .iter()
            .map(|(key, patterns)| {
                let compiled = patterns
                    .iter()
                    .map(|p| Regex::new(p).expect("specification patterns are valid"))
                    .collect();
                (*key, compiled)
            })
            .collect()
    })
}

/// Mine a description for hardware and feature specifications
pub fn mine_specifications(description: &str) -> Specifications {
    let mut specs = Vec::new();

    for (key, patterns) in compiled_patterns() {
        if let Some(found) = patterns.iter().find_map(|re| re.find(description)) {
            specs.push((key.to_string(), SpecValue::Text(found.as_str().to_string())));
        }
    }

    let lowered = description.to_lowercase();
    let features: Vec<String> = FEATURE_KEYWORDS
        .iter()
        .filter(|keyword| lowered.contains(&keyword.to_lowercase()))
        .map(|keyword| keyword.to_string())
        .collect();
    if !features.is_empty() {
        specs.push((FEATURES_KEY.to_string(), SpecValue::List(features)));
    }

    Specifications(specs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAPTOP: &str = "Intel Core i5-1135G7, 16GB RAM, 512GB SSD, 14\" FHD, Windows 11 Pro, 2 Year on-site, Fingerprint, Wi-Fi";

    #[test]
    fn test_full_laptop_description() {
        let specs = mine_specifications(LAPTOP);

        let processor = specs.text("processor").unwrap();
        assert!(processor == "Intel" || processor == "Core");
        assert_eq!(specs.text("ram"), Some("16GB RAM"));
        assert!(specs.text("storage").unwrap().contains("512GB"));
        assert_eq!(specs.text("display"), Some("14\" FHD"));
        assert_eq!(specs.text("os"), Some("Windows 11 Pro"));
        assert_eq!(specs.text("warranty"), Some("2 Year on-site"));
        assert_eq!(specs.features(), &["Fingerprint", "Wi-Fi"]);
    }

    #[test]
    fn test_absent_keys_are_omitted() {
        let specs = mine_specifications("Rack mount kit");
        assert!(specs.is_empty());
        assert!(specs.features().is_empty());
        assert!(!specs.contains_key(FEATURES_KEY));
    }

    #[test]
    fn test_first_match_wins() {
        let specs = mine_specifications("AMD Ryzen 7, macOS or Linux");
        assert_eq!(specs.text("processor"), Some("AMD"));
        assert_eq!(specs.text("os"), Some("macOS"));
    }

    #[test]
    fn test_model_token_and_case() {
        let specs = mine_specifications("thinkpad with I7-1260P, 15.6' uhd");
        assert_eq!(specs.text("processor"), Some("I7"));
        assert_eq!(specs.text("display"), Some("15.6' uhd"));
    }

    #[test]
    fn test_storage_falls_back_to_bare_size() {
        let specs = mine_specifications("Memory upgrade 32GB");
        assert_eq!(specs.text("ram"), Some("32GB"));
        assert_eq!(specs.text("storage"), Some("32GB"));
    }

    #[test]
    fn test_features_in_vocabulary_order() {
        let specs = mine_specifications("thunderbolt dock with hdmi, usb-c and bluetooth");
        assert_eq!(specs.features(), &["Bluetooth", "USB", "HDMI", "Thunderbolt"]);
    }

    #[test]
    fn test_keys_in_table_order() {
        let specs = mine_specifications(LAPTOP);
        let keys: Vec<_> = specs.keys().collect();
        assert_eq!(
            keys,
            vec!["processor", "ram", "storage", "display", "os", "warranty", "features"]
        );

        let json = serde_json::to_string(&specs).unwrap();
        let processor = json.find("\"processor\"").unwrap();
        let display = json.find("\"display\"").unwrap();
        let features = json.find("\"features\"").unwrap();
        assert!(processor < display && display < features);
    }

    #[test]
    fn test_json_shape() {
        let specs = mine_specifications("Linux server, USB");
        let json = serde_json::to_value(&specs).unwrap();
        assert_eq!(json["os"], "Linux");
        assert_eq!(json["features"][0], "USB");
    }
}
