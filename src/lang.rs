use once_cell::sync::Lazy;
use regex::Regex;

pub const PERSIAN: &str = "persian";
pub const ENGLISH: &str = "english";

// Arabic/Persian block only. Extended blocks (presentation forms) do not
// occur in form input, which arrives NFC-normalized from the browser.
static PERSIAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[؀-ۿ]").expect("persian"));

/// Classifies a line of text by dominant script: `persian` when more than 30%
/// of its non-whitespace characters fall in the Arabic/Persian block, else
/// `english`. Empty input is `english`.
pub fn detect_language(text: &str) -> &'static str {
    if text.trim().is_empty() {
        return ENGLISH;
    }
    let persian = PERSIAN_RE.find_iter(text).count();
    let total = text.chars().filter(|c| !c.is_whitespace()).count();
    if total == 0 {
        return ENGLISH;
    }
    if persian as f64 / total as f64 > 0.3 {
        PERSIAN
    } else {
        ENGLISH
    }
}
