use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// One placeholder → JSON-path binding from the mapping file.
#[derive(Clone, Debug, Deserialize)]
pub struct Mapping {
    #[serde(default)]
    pub placeholder: String,
    #[serde(rename = "jsonPath", default)]
    pub json_path: String,
}

#[derive(Clone, Debug, Deserialize)]
struct MappingFile {
    mappings: Vec<Mapping>,
}

/// The placeholder table the whole transform is keyed on. Loaded once,
/// immutable afterwards. A missing or malformed file is a hard error, not an
/// empty table.
#[derive(Clone, Debug)]
pub struct MappingTable {
    mappings: Vec<Mapping>,
}

impl MappingTable {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read mapping file: {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("parse mapping file: {}", path.display()))
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let file: MappingFile = serde_json::from_str(text).context("mapping file structure")?;
        Ok(Self {
            mappings: file.mappings,
        })
    }

    pub fn from_mappings(mappings: Vec<Mapping>) -> Self {
        Self { mappings }
    }

    /// Declared placeholder names, duplicates collapsed, file order kept.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut seen: HashSet<&str> = HashSet::new();
        self.mappings
            .iter()
            .map(|m| m.placeholder.as_str())
            .filter(|p| !p.is_empty() && seen.insert(p))
            .collect()
    }

    /// JSON path for a placeholder: exact match first, then a
    /// case-insensitive trimmed comparison. Empty paths count as unmapped.
    pub fn path_for(&self, placeholder: &str) -> Option<&str> {
        let exact = self
            .mappings
            .iter()
            .find(|m| m.placeholder == placeholder)
            .map(|m| m.json_path.as_str());
        let path = exact.or_else(|| {
            let wanted = placeholder.trim().to_lowercase();
            self.mappings
                .iter()
                .find(|m| m.placeholder.trim().to_lowercase() == wanted)
                .map(|m| m.json_path.as_str())
        })?;
        if path.is_empty() {
            None
        } else {
            Some(path)
        }
    }

    pub fn contains(&self, placeholder: &str) -> bool {
        self.mappings.iter().any(|m| m.placeholder == placeholder)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_file() {
        let table = MappingTable::from_json(
            r#"{"mappings": [
                {"placeholder": "title", "jsonPath": "formData.title"},
                {"placeholder": "title", "jsonPath": "formData.title"},
                {"placeholder": "owner", "jsonPath": "formData.owner"}
            ]}"#,
        )
        .expect("parse");
        assert_eq!(table.placeholders(), vec!["title", "owner"]);
        assert_eq!(table.path_for("title"), Some("formData.title"));
        assert!(table.contains("owner"));
        assert!(!table.contains("missing"));
    }

    #[test]
    fn malformed_structure_is_an_error() {
        assert!(MappingTable::from_json(r#"{"mappings": "nope"}"#).is_err());
        assert!(MappingTable::from_json(r#"{"other": []}"#).is_err());
        assert!(MappingTable::from_json("not json").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(MappingTable::load(Path::new("/nonexistent/mapping.json")).is_err());
    }

    #[test]
    fn lookup_falls_back_to_case_insensitive() {
        let table = MappingTable::from_json(
            r#"{"mappings": [{"placeholder": " System_Title ", "jsonPath": "formData.system_title"}]}"#,
        )
        .expect("parse");
        assert_eq!(table.path_for("system_title"), Some("formData.system_title"));
        assert_eq!(table.path_for("SYSTEM_TITLE"), Some("formData.system_title"));
        assert_eq!(table.path_for("unrelated"), None);
    }

    #[test]
    fn empty_path_counts_as_unmapped() {
        let table = MappingTable::from_json(
            r#"{"mappings": [{"placeholder": "decorative", "jsonPath": ""}]}"#,
        )
        .expect("parse");
        assert_eq!(table.path_for("decorative"), None);
        assert!(table.contains("decorative"));
    }
}
