// src/catalog.rs

use std::{collections::HashMap, path::Path};

use serde::Deserialize;
use thiserror::Error;

use crate::config::DEFAULT_POINTS;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog contains no questions")]
    Empty,

    #[error("duplicate question key '{0}'")]
    DuplicateKey(String),

    #[error("question '{0}' has negative points")]
    NegativePoints(String),
}

/// One quiz question with its canonical answer.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub key: String,
    pub prompt: String,
    pub answer: String,
    #[serde(default = "default_points")]
    pub points: i64,
}

fn default_points() -> i64 {
    DEFAULT_POINTS
}

/// Immutable question catalog and answer key.
///
/// Loaded once at start-up and shared read-only between requests.
#[derive(Debug)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(text)?;
        Self::from_entries(entries)
    }

    pub fn from_entries(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = HashMap::with_capacity(entries.len());
        for (pos, entry) in entries.iter().enumerate() {
            if entry.points < 0 {
                return Err(CatalogError::NegativePoints(entry.key.clone()));
            }
            if index.insert(entry.key.clone(), pos).is_some() {
                return Err(CatalogError::DuplicateKey(entry.key.clone()));
            }
        }

        Ok(Self { entries, index })
    }

    /// The asphalt lab questions shipped with the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Loads the catalog from `path`, or the built-in one when no path is configured.
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                Self::from_json(&text)
            }
            None => Self::builtin(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CatalogEntry> {
        self.index.get(key).map(|&pos| &self.entries[pos])
    }

    /// Question keys in catalog order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_eleven_questions() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.len(), 11);
        assert_eq!(catalog.keys()[0], "Gesteinsraum");
        assert!(catalog.get("ÖNORM EN 12697-8").is_some());
    }

    #[test]
    fn builtin_answers_are_kept_verbatim() {
        let catalog = Catalog::builtin().unwrap();
        let entry = catalog.get("Raumdichte").unwrap();
        assert!(entry.answer.ends_with("SSD "));
        assert_eq!(entry.points, 10);
    }

    #[test]
    fn points_default_when_omitted() {
        let catalog = Catalog::from_json(r#"[{"key": "A", "prompt": "?", "answer": "a"}]"#).unwrap();
        assert_eq!(catalog.get("A").unwrap().points, DEFAULT_POINTS);
    }

    #[test]
    fn rejects_duplicate_keys() {
        let json = r#"[
            {"key": "A", "prompt": "?", "answer": "a"},
            {"key": "A", "prompt": "!", "answer": "b"}
        ]"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::DuplicateKey(k)) if k == "A"
        ));
    }

    #[test]
    fn rejects_empty_and_negative_catalogs() {
        assert!(matches!(Catalog::from_json("[]"), Err(CatalogError::Empty)));

        let json = r#"[{"key": "A", "prompt": "?", "answer": "a", "points": -1}]"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::NegativePoints(_))
        ));
    }
}
