use serde_json::Value;

use crate::fonts::FontConfig;
use crate::lang;
use crate::markers;

/// Wraps every string leaf of a transformed-data tree in language or
/// special-font markers, preserving the array/object structure around it.
/// Must run before rendering so the markers travel inside the substituted
/// text and come out in the rendered document's text nodes.
pub fn wrap(data: &Value, fonts: &FontConfig) -> Value {
    wrap_value(data, None, fonts)
}

fn wrap_value(value: &Value, key: Option<&str>, fonts: &FontConfig) -> Value {
    match value {
        Value::String(s) => Value::String(wrap_str(s, key, fonts)),
        // Arrays keep the enclosing key so title lists still get the
        // heading font.
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| wrap_value(item, key, fonts))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), wrap_value(v, Some(k), fonts)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn wrap_str(text: &str, key: Option<&str>, fonts: &FontConfig) -> String {
    let special = key.and_then(|k| fonts.special_for(k));
    text.split('\n')
        .map(|line| {
            // Blank lines stay unwrapped so blank-line layout survives.
            if line.trim().is_empty() {
                return line.to_string();
            }
            match special.as_ref() {
                Some(sp) => format!(
                    "{}{line}{}",
                    markers::special_start(&sp.name, sp.size),
                    markers::SPECIAL_END
                ),
                None => {
                    let language = lang::detect_language(line);
                    format!("{}{line}{}", markers::lang_start(language), markers::LANG_END)
                }
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fonts() -> FontConfig {
        FontConfig::default()
    }

    #[test]
    fn mixed_line_wraps_as_persian() {
        let out = wrap(&json!("درود Hello"), &fonts());
        assert_eq!(out, json!("___LANG_START___persian|درود Hello___LANG_END___"));
    }

    #[test]
    fn latin_line_wraps_as_english() {
        let out = wrap(&json!("Hello"), &fonts());
        assert_eq!(out, json!("___LANG_START___english|Hello___LANG_END___"));
    }

    #[test]
    fn lines_are_classified_independently() {
        let out = wrap(&json!("Hello\n\nدرود جهان"), &fonts());
        assert_eq!(
            out,
            json!(
                "___LANG_START___english|Hello___LANG_END___\n\n___LANG_START___persian|درود جهان___LANG_END___"
            )
        );
    }

    #[test]
    fn special_key_gets_heading_markers() {
        let data = json!({"title_1": "سامانه"});
        let out = wrap(&data, &fonts());
        assert_eq!(
            out["title_1"],
            json!("___SPECIAL_START___B Titr|26|سامانه___SPECIAL_END___")
        );
    }

    #[test]
    fn arrays_keep_key_context() {
        let data = json!({"system_title_1": ["الف", "ب"]});
        let out = wrap(&data, &fonts());
        assert_eq!(
            out["system_title_1"][0],
            json!("___SPECIAL_START___B Titr|26|الف___SPECIAL_END___")
        );
        assert_eq!(
            out["system_title_1"][1],
            json!("___SPECIAL_START___B Titr|26|ب___SPECIAL_END___")
        );
    }

    #[test]
    fn non_strings_pass_through() {
        let data = json!({"rows": [{"n": 3, "ok": true, "none": null}]});
        let out = wrap(&data, &fonts());
        assert_eq!(out["rows"][0]["n"], 3);
        assert_eq!(out["rows"][0]["ok"], true);
        assert_eq!(out["rows"][0]["none"], Value::Null);
    }

    #[test]
    fn nested_object_fields_switch_context() {
        let data = json!({"row": {"title_1": "X", "other": "Y"}});
        let out = wrap(&data, &fonts());
        assert_eq!(
            out["row"]["title_1"],
            json!("___SPECIAL_START___B Titr|26|X___SPECIAL_END___")
        );
        assert_eq!(out["row"]["other"], json!("___LANG_START___english|Y___LANG_END___"));
    }
}
