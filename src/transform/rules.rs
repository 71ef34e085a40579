use serde_json::{Map, Value};

use crate::digits::localize_value;
use crate::mapping::MappingTable;
use crate::resolve::{deep_get, truthy};

/// Everything a placeholder rule may look at. `value` is the result of
/// resolving the placeholder's own JSON path; `raw` is the whole document for
/// the few rules that re-resolve other paths.
pub struct RuleInput<'a> {
    pub name: &'a str,
    pub value: &'a Value,
    pub raw: &'a Value,
    pub mappings: &'a MappingTable,
}

/// A rule returns `Some(value)` to set its placeholder or `None` to leave it
/// unset. Rules never fail: malformed input degrades to the field's default.
pub type RuleFn = fn(&RuleInput) -> Option<Value>;

/// Sentinel cell content. A single space, never an empty string, so the
/// renderer's falsy handling does not drop the cell.
pub const SPACE: &str = " ";

/// Borrowable absent value so helpers taking `&Value` can treat missing
/// fields uniformly.
pub static NULL: Value = Value::Null;

pub fn get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.as_object().and_then(|m| m.get(key))
}

/// Sub-field reference, `Null` when absent.
pub fn sub<'a>(item: &'a Value, key: &str) -> &'a Value {
    get(item, key).unwrap_or(&NULL)
}

pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    deep_get(value, path)
}

/// `item?.key || default`: the field when present and truthy, else the
/// default string.
pub fn field_or(item: &Value, key: &str, default: &str) -> Value {
    match get(item, key) {
        Some(v) if truthy(v) => v.clone(),
        _ => Value::String(default.to_string()),
    }
}

/// `item?.a?.b || default` over a dotted sub-path.
pub fn field_path_or(item: &Value, path: &str, default: &str) -> Value {
    match get_path(item, path) {
        Some(v) if truthy(v) => v.clone(),
        _ => Value::String(default.to_string()),
    }
}

/// `item?.key ?? default`: only a missing or null field takes the default;
/// empty strings, zeros and `false` pass through.
pub fn field_or_null(item: &Value, key: &str, default: &str) -> Value {
    match get(item, key) {
        Some(Value::Null) | None => Value::String(default.to_string()),
        Some(v) => v.clone(),
    }
}

/// `field_or` plus digit localization, for phone-style fields.
pub fn persian_field_or(item: &Value, key: &str, default: &str) -> Value {
    localize_value(&field_or(item, key, default))
}

/// `value || default` on the resolved value itself.
pub fn text_or(value: &Value, default: &str) -> Value {
    if truthy(value) {
        value.clone()
    } else {
        Value::String(default.to_string())
    }
}

/// The selected option of a choice field, which arrives either as a bare
/// string or as `{option: string}`.
pub fn option_str(field: &Value) -> Option<&str> {
    match field {
        Value::String(s) => Some(s),
        Value::Object(_) => get(field, "option").and_then(Value::as_str),
        _ => None,
    }
}

/// Prefix match against the selected option; falsy input never matches.
pub fn is_chosen(field: &Value, text: &str) -> bool {
    if !truthy(field) {
        return false;
    }
    option_str(field).map(|s| s.starts_with(text)).unwrap_or(false)
}

/// Exact match against the selected option.
pub fn eq_chosen(field: &Value, literal: &str) -> bool {
    option_str(field).map(|s| s == literal).unwrap_or(false)
}

/// Single-choice flags with exact option matching. Emits every key; at most
/// one is true.
pub fn choice_exact(field: &Value, options: &[(&str, &str)]) -> Value {
    let mut out = Map::new();
    for (key, literal) in options {
        out.insert((*key).to_string(), Value::Bool(eq_chosen(field, literal)));
    }
    Value::Object(out)
}

/// Single-choice flags with prefix matching (option literals in the form
/// data are long sentences; templates key on their stable openings).
pub fn choice_starts(field: &Value, options: &[(&str, &str)]) -> Value {
    let mut out = Map::new();
    for (key, literal) in options {
        out.insert((*key).to_string(), Value::Bool(is_chosen(field, literal)));
    }
    Value::Object(out)
}

/// Prefix-classifier that propagates absence: a missing or falsy field emits
/// nothing rather than an all-false object.
pub fn count_object(field: Option<&Value>, options: &[(&str, &str)]) -> Option<Value> {
    let field = field?;
    if !truthy(field) {
        return None;
    }
    Some(choice_starts(field, options))
}

/// `{no, partially, yes}` prefix classifier. A missing field emits nothing;
/// any present value (matching or not) emits the full key set.
pub fn tri_state(field: Option<&Value>) -> Option<Value> {
    let field = field?;
    Some(choice_starts(
        field,
        &[("no", "No"), ("partially", "Partially"), ("yes", "Yes")],
    ))
}

/// Sub-field coerced to a boolean, JS truthiness, missing = false.
pub fn flag(field: &Value, key: &str) -> bool {
    get(field, key).map(truthy).unwrap_or(false)
}

/// Strict checkbox sub-field: only a literal `true` counts.
pub fn checked(field: &Value, key: &str) -> bool {
    matches!(get(field, key), Some(Value::Bool(true)))
}

/// Inserts only present values; absent classifier results drop their key
/// instead of writing null, the JSON-serialization treatment of undefined.
pub fn set_opt(map: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(v) = value {
        map.insert(key.to_string(), v);
    }
}

/// `choice_exact` with a catch-all: when no option matches, the default key
/// is set instead.
pub fn choice_exact_or_default(field: &Value, options: &[(&str, &str)], default_key: &str) -> Value {
    let mut out = Map::new();
    let mut any = false;
    for (key, literal) in options {
        let hit = eq_chosen(field, literal);
        any |= hit;
        out.insert((*key).to_string(), Value::Bool(hit));
    }
    out.insert(default_key.to_string(), Value::Bool(!any));
    Value::Object(out)
}

/// Copies named sub-fields as booleans, JS truthiness, missing = false.
pub fn bool_copy(field: &Value, keys: &[&str]) -> Value {
    let mut out = Map::new();
    for key in keys {
        out.insert((*key).to_string(), Value::Bool(flag(field, key)));
    }
    Value::Object(out)
}

/// Exclusive yes/no pair keyed `{stem}_no` / `{stem}_yes`.
pub fn yes_no(field: &Value, no_key: &str, yes_key: &str) -> Value {
    let mut out = Map::new();
    out.insert(no_key.to_string(), Value::Bool(eq_chosen(field, "No")));
    out.insert(yes_key.to_string(), Value::Bool(eq_chosen(field, "Yes")));
    Value::Object(out)
}

/// One-element array, the shape template conditionals iterate over.
pub fn wrapped(value: Value) -> Value {
    Value::Array(vec![value])
}

/// Maps array elements into fixed-shape rows; an empty or non-array source
/// becomes exactly one sentinel row.
pub fn rows<F, S>(value: &Value, row: F, sentinel: S) -> Value
where
    F: Fn(&Value) -> Value,
    S: Fn() -> Value,
{
    match value {
        Value::Array(items) if !items.is_empty() => {
            Value::Array(items.iter().map(row).collect())
        }
        _ => Value::Array(vec![sentinel()]),
    }
}

/// Maps array elements without a sentinel: empty stays empty.
pub fn list<F>(value: &Value, item: F) -> Value
where
    F: Fn(&Value) -> Value,
{
    match value {
        Value::Array(items) => Value::Array(items.iter().map(item).collect()),
        _ => Value::Array(Vec::new()),
    }
}

/// Maps array elements and drops falsy results, the `.map().filter(Boolean)`
/// shape used by title lists.
pub fn list_truthy<F>(value: &Value, item: F) -> Value
where
    F: Fn(&Value) -> Value,
{
    match value {
        Value::Array(items) => {
            Value::Array(items.iter().map(item).filter(truthy).collect())
        }
        _ => Value::Array(Vec::new()),
    }
}
