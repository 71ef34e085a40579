//! Nested survey JSON to the flat placeholder map the template consumes.
//!
//! The mapping file's placeholder list is the ground truth: every declared
//! placeholder is resolved against the raw document, dispatched through the
//! rule registry, and assembled into one flat map. Names without a registered
//! rule fall through suffix handling to a digit-localizing passthrough.

mod dataform;
mod infrastructure;
mod process;
mod rules;
mod service;
mod system;

pub use rules::{RuleFn, RuleInput};

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::digits::localize_value;
use crate::mapping::MappingTable;
use crate::resolve::{resolve_path, truthy};

/// Placeholder rules keyed by name. The family modules contribute their
/// entries once, at first use.
pub struct Registry {
    rules: HashMap<&'static str, RuleFn>,
}

impl Registry {
    fn new() -> Self {
        Registry {
            rules: HashMap::new(),
        }
    }

    pub fn rule(&mut self, name: &'static str, f: RuleFn) {
        self.rules.insert(name, f);
    }

    fn get(&self, name: &str) -> Option<RuleFn> {
        self.rules.get(name).copied()
    }
}

static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let mut reg = Registry::new();
    process::register(&mut reg);
    service::register(&mut reg);
    system::register(&mut reg);
    infrastructure::register(&mut reg);
    dataform::register(&mut reg);
    reg
});

/// Runs the placeholder transformation for one mapping table.
pub struct Transformer {
    mappings: MappingTable,
}

impl Transformer {
    pub fn new(mappings: MappingTable) -> Self {
        Transformer { mappings }
    }

    /// Loads the mapping table from disk. A missing or malformed mapping
    /// file fails here instead of producing an empty transformation later.
    pub fn load(mapping_path: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(MappingTable::load(mapping_path)?))
    }

    pub fn mappings(&self) -> &MappingTable {
        &self.mappings
    }

    /// Builds the flat placeholder map for one raw document. Rules never
    /// fail; a placeholder either gets a value or stays unset.
    pub fn transform(&self, raw: &Value) -> Map<String, Value> {
        let placeholders = self.mappings.placeholders();
        let mut result = Map::new();
        for placeholder in &placeholders {
            let name = placeholder.trim();
            let path = self.mappings.path_for(name);
            let resolved = match path {
                Some(p) => resolve_path(raw, p),
                None => Value::String(String::new()),
            };
            let input = RuleInput {
                name,
                value: &resolved,
                raw,
                mappings: &self.mappings,
            };
            let out = match REGISTRY.get(name) {
                Some(rule) => rule(&input),
                None => fallback(&input, path.is_some()),
            };
            if let Some(value) = out {
                // Description fields get localized no matter which rule
                // produced them; localization is idempotent.
                let value = if is_description(name) {
                    localize_value(&value)
                } else {
                    value
                };
                result.insert(name.to_string(), value);
            }
        }
        info!(
            "transformed {} of {} placeholders",
            result.len(),
            placeholders.len()
        );
        result
    }

    /// Debug copy of the transformed map: mapped keys only, sorted, 2-space
    /// indent. Best effort; a failed write is logged and swallowed.
    pub fn write_side_file(&self, result: &Map<String, Value>, path: &Path) {
        let mapped: HashSet<&str> = self
            .mappings
            .placeholders()
            .into_iter()
            .map(str::trim)
            .collect();
        let sorted: BTreeMap<&String, &Value> = result
            .iter()
            .filter(|(key, _)| mapped.contains(key.as_str()))
            .collect();
        if let Err(err) = write_pretty_json(path, &sorted) {
            warn!("side file write to {} failed: {err:#}", path.display());
        }
    }
}

fn write_pretty_json<T: serde::Serialize>(path: &Path, data: &T) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    fs::write(path, serde_json::to_string_pretty(data)?)?;
    Ok(())
}

fn is_description(name: &str) -> bool {
    name.to_lowercase().ends_with("_description")
}

/// Suffix fallbacks for names without a registered rule, then the generic
/// digit-localizing passthrough. A name with no mapping entry at all stays
/// unset so the template's own empty handling applies.
fn fallback(input: &RuleInput, has_path: bool) -> Option<Value> {
    if is_description(input.name) {
        return Some(if has_path {
            rules::text_or(input.value, "")
        } else {
            Value::String(String::new())
        });
    }
    if input.name.ends_with("_used_features") {
        if !has_path {
            return Some(Value::Array(Vec::new()));
        }
        return Some(match input.value {
            Value::Array(items) => Value::Array(items.clone()),
            v if truthy(v) => Value::Array(vec![v.clone()]),
            _ => Value::Array(Vec::new()),
        });
    }
    if has_path {
        Some(localize_value(input.value))
    } else {
        debug!("no mapping entry for placeholder {}", input.name);
        None
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::mapping::Mapping;
    use serde_json::json;

    pub(crate) fn run_rule_on(name: &str, value: Value, raw: &Value) -> Option<Value> {
        let mappings = MappingTable::from_mappings(Vec::new());
        let input = RuleInput {
            name,
            value: &value,
            raw,
            mappings: &mappings,
        };
        let rule = REGISTRY.get(name).unwrap_or_else(|| panic!("no rule named {name}"));
        rule(&input)
    }

    pub(crate) fn run_rule(name: &str, value: Value) -> Option<Value> {
        run_rule_on(name, value, &json!({}))
    }

    fn table(entries: &[(&str, &str)]) -> MappingTable {
        MappingTable::from_mappings(
            entries
                .iter()
                .map(|(placeholder, json_path)| Mapping {
                    placeholder: (*placeholder).to_string(),
                    json_path: (*json_path).to_string(),
                })
                .collect(),
        )
    }

    #[test]
    fn title_passes_through() {
        let t = Transformer::new(table(&[("title", "formData.title")]));
        let out = t.transform(&json!({"formData": {"title": "فرآیند صدور مجوز"}}));
        assert_eq!(out["title"], json!("فرآیند صدور مجوز"));
    }

    #[test]
    fn unknown_placeholder_without_mapping_stays_unset() {
        let t = Transformer::new(table(&[("mystery_field", "")]));
        let out = t.transform(&json!({"formData": {}}));
        assert!(!out.contains_key("mystery_field"));
    }

    #[test]
    fn generic_placeholder_localizes_digits() {
        let t = Transformer::new(table(&[("fax", "formData.fax")]));
        let out = t.transform(&json!({"formData": {"fax": "021-88776655"}}));
        assert_eq!(out["fax"], json!("۰۲۱-۸۸۷۷۶۶۵۵"));
    }

    #[test]
    fn description_suffix_defaults_to_empty_and_localizes() {
        let t = Transformer::new(table(&[
            ("room_description", "formData.room"),
            ("site_description", "formData.missing"),
            ("free_description", ""),
        ]));
        let out = t.transform(&json!({"formData": {"room": "سالن 12"}}));
        assert_eq!(out["room_description"], json!("سالن 12"));
        assert_eq!(out["site_description"], json!(""));
        assert_eq!(out["free_description"], json!(""));
    }

    #[test]
    fn used_features_coerces_to_array() {
        let t = Transformer::new(table(&[
            ("a_used_features", "formData.a"),
            ("b_used_features", "formData.b"),
            ("c_used_features", "formData.c"),
        ]));
        let raw = json!({"formData": {"a": ["x", "y"], "b": "solo", "c": null}});
        let out = t.transform(&raw);
        assert_eq!(out["a_used_features"], json!(["x", "y"]));
        assert_eq!(out["b_used_features"], json!(["solo"]));
        assert_eq!(out["c_used_features"], json!([]));
    }

    #[test]
    fn registered_rule_beats_fallback() {
        let t = Transformer::new(table(&[("system_type", "formData.system_type")]));
        let out = t.transform(&json!({"formData": {"system_type": "Specialized"}}));
        assert_eq!(
            out["system_type"],
            json!([{"specialized": true, "non-specialized": false, "out-of-scope": false}])
        );
    }

    #[test]
    fn placeholder_names_are_trimmed_for_lookup() {
        let t = Transformer::new(table(&[(" title ", "formData.title")]));
        let out = t.transform(&json!({"formData": {"title": "x"}}));
        assert_eq!(out["title"], json!("x"));
    }

    #[test]
    fn malformed_mapping_file_is_an_error() {
        assert!(MappingTable::from_json("{\"mappings\": 3}").is_err());
        assert!(MappingTable::from_json("not json").is_err());
    }

    #[test]
    fn side_file_is_sorted_and_filtered() {
        let dir = std::env::temp_dir().join("sanadsaz-side-file-test");
        let path = dir.join("nested").join("out.json");
        let _ = fs::remove_dir_all(&dir);

        let t = Transformer::new(table(&[("b", "formData.b"), ("a", "formData.a")]));
        let mut result = Map::new();
        result.insert("b".to_string(), json!("2"));
        result.insert("a".to_string(), json!("1"));
        result.insert("stray".to_string(), json!("x"));
        t.write_side_file(&result, &path);

        let text = fs::read_to_string(&path).expect("side file written");
        let a = text.find("\"a\"").expect("a present");
        let b = text.find("\"b\"").expect("b present");
        assert!(a < b);
        assert!(!text.contains("stray"));
        assert!(text.contains("  \"a\""));
        let _ = fs::remove_dir_all(&dir);
    }
}
