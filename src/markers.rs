use once_cell::sync::Lazy;
use regex::Regex;

// Literal ASCII tokens. They must survive the rendering step embedded in
// ordinary text nodes, so they use no XML-significant characters.
pub const LANG_START: &str = "___LANG_START___";
pub const LANG_END: &str = "___LANG_END___";
pub const SPECIAL_START: &str = "___SPECIAL_START___";
pub const SPECIAL_END: &str = "___SPECIAL_END___";

pub fn lang_start(language: &str) -> String {
    format!("{LANG_START}{language}|")
}

pub fn special_start(font_name: &str, font_size: u32) -> String {
    format!("{SPECIAL_START}{font_name}|{font_size}|")
}

/// Opening language marker with its payload: `___LANG_START___persian|`.
pub static LANG_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"___LANG_START___([a-z]+)\|").expect("lang start regex"));

/// Opening special-font marker: `___SPECIAL_START___B Titr|26|`.
pub static SPECIAL_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"___SPECIAL_START___([^|]+)\|([0-9]+)\|").expect("special start regex"));

/// Any marker token, payload or not. Used to detect leakage after rewriting.
pub static ANY_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"___(?:LANG_START|LANG_END|SPECIAL_START|SPECIAL_END)___").expect("marker regex")
});

pub fn contains_marker(text: &str) -> bool {
    ANY_MARKER_RE.is_match(text)
}
