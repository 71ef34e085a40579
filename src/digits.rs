use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

// Digits plus the separators seen in phone numbers, dates and numeric IDs.
// Free text containing letters must not match, so only these exact classes.
static NUMERICAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9\s\-/:.()+]+$").expect("numerical regex"));

const PERSIAN_DIGITS: [char; 10] = ['۰', '۱', '۲', '۳', '۴', '۵', '۶', '۷', '۸', '۹'];

/// Maps ASCII digits 0-9 to Persian digits, leaving everything else untouched.
/// Idempotent: Persian digits are outside the ASCII range and never re-match.
pub fn to_persian_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '0'..='9' => PERSIAN_DIGITS[c as usize - '0' as usize],
            _ => c,
        })
        .collect()
}

/// True for strings made of digits and number punctuation only (phone numbers,
/// dates, times, numeric codes). Empty or whitespace-only strings are not numeric.
pub fn is_purely_numerical(text: &str) -> bool {
    NUMERICAL_RE.is_match(text.trim())
}

pub fn localize_str(text: &str) -> String {
    if is_purely_numerical(text) {
        to_persian_digits(text)
    } else {
        text.to_string()
    }
}

/// Recursively localizes digits inside a JSON value. Strings are converted only
/// when purely numerical; numbers are stringified and converted unconditionally;
/// arrays/objects recurse; null/bool pass through.
pub fn localize_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(localize_str(s)),
        Value::Number(n) => Value::String(to_persian_digits(&n.to_string())),
        Value::Array(items) => Value::Array(items.iter().map(localize_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), localize_value(v)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn phone_number_is_localized() {
        assert_eq!(to_persian_digits("021-12345"), "۰۲۱-۱۲۳۴۵");
        assert!(is_purely_numerical("021-12345"));
        assert_eq!(localize_str("021-12345"), "۰۲۱-۱۲۳۴۵");
    }

    #[test]
    fn free_text_with_digits_is_left_alone() {
        assert!(!is_purely_numerical("abc-123"));
        assert_eq!(localize_str("abc-123"), "abc-123");
    }

    #[test]
    fn empty_and_whitespace_are_not_numerical() {
        assert!(!is_purely_numerical(""));
        assert!(!is_purely_numerical("   "));
    }

    #[test]
    fn localization_is_idempotent() {
        let once = localize_str("0912 345 6789");
        let twice = localize_str(&once);
        assert_eq!(once, twice);
        assert_eq!(once, "۰۹۱۲ ۳۴۵ ۶۷۸۹");
    }

    #[test]
    fn date_like_strings_match() {
        assert!(is_purely_numerical("1402/07/15"));
        assert!(is_purely_numerical("12:30"));
        assert!(is_purely_numerical("+98 (21) 1234"));
    }

    #[test]
    fn values_recurse() {
        let v = json!({
            "phone": "09123456789",
            "count": 42,
            "note": "about 3 things",
            "list": ["021", "abc"],
            "flag": true,
            "none": null
        });
        let out = localize_value(&v);
        assert_eq!(out["phone"], "۰۹۱۲۳۴۵۶۷۸۹");
        assert_eq!(out["count"], "۴۲");
        assert_eq!(out["note"], "about 3 things");
        assert_eq!(out["list"][0], "۰۲۱");
        assert_eq!(out["list"][1], "abc");
        assert_eq!(out["flag"], true);
        assert_eq!(out["none"], Value::Null);
    }
}
