// src/extractors/items.rs
use std::fs;
use std::path::Path;

use regex::Regex;

use crate::utils::error::ConfigError;

/// One canonical item label with its description and a compiled,
/// case-insensitive matcher for the literal label text.
#[derive(Debug, Clone)]
pub struct SectionKey {
    pub label: String,
    pub description: String,
    matcher: Regex,
}

impl SectionKey {
    pub fn new(label: &str, description: &str) -> Result<Self, regex::Error> {
        let matcher = Regex::new(&format!("(?i){}", regex::escape(label)))?;
        Ok(Self {
            label: label.to_string(),
            description: description.to_string(),
            matcher,
        })
    }

    /// Byte offsets of every non-overlapping occurrence of the label.
    pub fn positions(&self, text: &str) -> Vec<usize> {
        self.matcher.find_iter(text).map(|m| m.start()).collect()
    }
}

/// Ordered item key map. File order defines segmentation adjacency.
#[derive(Debug, Clone)]
pub struct ItemMap {
    keys: Vec<SectionKey>,
}

impl ItemMap {
    /// Loads a JSON object of `"Item 1A": "Risk Factors"` pairs, keeping file order.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let map = Self::from_json(&raw).map_err(|reason| ConfigError::Malformed {
            path: path.to_path_buf(),
            reason,
        })?;
        tracing::info!("Loaded {} item keys from {}", map.len(), path.display());
        Ok(map)
    }

    pub fn from_json(raw: &str) -> Result<Self, String> {
        let object: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(raw).map_err(|e| e.to_string())?;
        let pairs = object
            .iter()
            .map(|(label, value)| match value.as_str() {
                Some(description) => Ok((label.as_str(), description)),
                None => Err(format!("description for {label} is not a string")),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_pairs(&pairs)
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Result<Self, String> {
        if pairs.is_empty() {
            return Err("item map is empty".to_string());
        }
        let keys = pairs
            .iter()
            .map(|(label, description)| {
                SectionKey::new(label, description).map_err(|e| format!("bad key {label}: {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { keys })
    }

    pub fn keys(&self) -> &[SectionKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_order_is_preserved() {
        let map = ItemMap::from_json(r#"{"Item 7": "MD&A", "Item 1": "Business", "Item 1A": "Risk Factors"}"#)
            .unwrap();
        let labels: Vec<_> = map.keys().iter().map(|k| k.label.as_str()).collect();
        assert_eq!(labels, vec!["Item 7", "Item 1", "Item 1A"]);
        assert_eq!(map.keys()[2].description, "Risk Factors");
    }

    #[test]
    fn positions_are_case_insensitive_and_literal() {
        let key = SectionKey::new("Item 1A.", "Risk Factors").unwrap();
        let text = "ITEM 1A. toc item 1a. body Item 1Ax";
        assert_eq!(key.positions(text), vec![0, 13]);
    }

    #[test]
    fn rejects_empty_and_non_string_maps() {
        assert!(ItemMap::from_json("{}").is_err());
        assert!(ItemMap::from_json(r#"{"Item 1": 3}"#).is_err());
        assert!(ItemMap::from_json("[1, 2]").is_err());
    }

    #[test]
    fn bundled_reference_file_loads() {
        let map = ItemMap::load(concat!(env!("CARGO_MANIFEST_DIR"), "/data/form-10k-items.json")).unwrap();
        assert_eq!(map.keys()[0].label, "Item 1");
        assert!(map.keys().iter().any(|k| k.label == "Item 7A"));
    }
}
