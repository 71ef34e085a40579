use serde_json::Value;

/// Resolves a dotted/bracket path against nested JSON. The literal segment
/// `[]` flattens over an array: the remainder path is resolved against each
/// element, results are flattened one level and falsy entries dropped. Plain
/// paths are a safe deep-get returning `""` when any segment is missing.
/// Never fails; absence is always `""` or `[]`.
pub fn resolve_path(data: &Value, path: &str) -> Value {
    if path.is_empty() {
        return Value::String(String::new());
    }

    if let Some(idx) = path.find("[]") {
        let base_path = path[..idx].trim_end_matches('.');
        let rest_path = path[idx + 2..].trim_start_matches('.');

        let base = match deep_get(data, base_path) {
            Some(Value::Array(items)) => items,
            _ => return Value::Array(Vec::new()),
        };

        let mut out: Vec<Value> = Vec::new();
        for item in base {
            let resolved = if rest_path.is_empty() {
                item.clone()
            } else if rest_path.contains("[]") {
                resolve_path(item, rest_path)
            } else {
                deep_get(item, rest_path)
                    .cloned()
                    .unwrap_or_else(|| Value::String(String::new()))
            };
            // Flatten one level, then keep only truthy entries.
            match resolved {
                Value::Array(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        out.retain(truthy);
        return Value::Array(out);
    }

    deep_get(data, path)
        .cloned()
        .unwrap_or_else(|| Value::String(String::new()))
}

/// Walks `a.b[2].c`-style paths. `None` when any segment is absent or the
/// value cannot be descended into.
pub fn deep_get<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(data);
    }
    let mut cur = data;
    for seg in split_segments(path) {
        cur = match cur {
            Value::Object(map) => map.get(seg.as_str())?,
            Value::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(cur)
}

fn split_segments(path: &str) -> Vec<String> {
    let mut segs: Vec<String> = Vec::new();
    for part in path.split('.') {
        if part.is_empty() {
            continue;
        }
        let mut rest = part;
        while let Some(open) = rest.find('[') {
            if !rest[..open].is_empty() {
                segs.push(rest[..open].to_string());
            }
            match rest[open..].find(']') {
                Some(close) => {
                    segs.push(rest[open + 1..open + close].to_string());
                    rest = &rest[open + close + 1..];
                }
                None => {
                    segs.push(rest[open + 1..].to_string());
                    rest = "";
                }
            }
        }
        if !rest.is_empty() {
            segs.push(rest.to_string());
        }
    }
    segs
}

/// JS truthiness over JSON values: `null`, `false`, `""` and numeric zero are
/// falsy; arrays and objects (even empty ones) are truthy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flatten_extracts_fields() {
        let data = json!({"a": {"b": [{"c": 1}, {"c": 2}]}});
        assert_eq!(resolve_path(&data, "a.b[].c"), json!([1, 2]));
    }

    #[test]
    fn flatten_missing_leaf_filters_to_empty() {
        let data = json!({"a": {"b": [{"c": 1}, {"c": 2}]}});
        assert_eq!(resolve_path(&data, "a.b[].missing"), json!([]));
    }

    #[test]
    fn missing_base_behaviour() {
        let data = json!({"a": 1});
        assert_eq!(resolve_path(&data, "x.y"), json!(""));
        assert_eq!(resolve_path(&data, "x[].y"), json!([]));
    }

    #[test]
    fn flatten_on_non_array_is_empty() {
        let data = json!({"a": {"b": "scalar"}});
        assert_eq!(resolve_path(&data, "a.b[]"), json!([]));
    }

    #[test]
    fn bare_flatten_returns_elements() {
        let data = json!({"xs": ["one", "", null, "two", 0]});
        assert_eq!(resolve_path(&data, "xs[]"), json!(["one", "two"]));
    }

    #[test]
    fn bracket_indices() {
        let data = json!({"a": {"b": [{"c": 1}, {"c": 2}]}});
        assert_eq!(resolve_path(&data, "a.b[1].c"), json!(2));
        assert_eq!(resolve_path(&data, "a.b.0.c"), json!(1));
        assert_eq!(resolve_path(&data, "a.b[9].c"), json!(""));
    }

    #[test]
    fn nested_flatten_recurses() {
        let data = json!({"g": [
            {"items": [{"t": "a"}, {"t": ""}]},
            {"items": [{"t": "b"}]}
        ]});
        assert_eq!(resolve_path(&data, "g[].items[].t"), json!(["a", "b"]));
    }

    #[test]
    fn empty_containers_survive_filtering() {
        let data = json!({"xs": [{}, null, [], false]});
        assert_eq!(resolve_path(&data, "xs[]"), json!([{}, []]));
    }

    #[test]
    fn null_leaf_passes_through() {
        let data = json!({"a": null});
        assert_eq!(resolve_path(&data, "a"), Value::Null);
    }

    #[test]
    fn empty_path_is_empty_string() {
        assert_eq!(resolve_path(&json!({"a": 1}), ""), json!(""));
    }
}
