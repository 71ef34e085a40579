use regex::Captures;
use tracing::warn;

use crate::fonts::FontConfig;
use crate::lang;
use crate::markers;

// Close the styled run and reopen an unstyled one carrying the template's
// inherited formatting.
const RUN_RESET: &str = r#"</w:t></w:r><w:r><w:rPr></w:rPr><w:t xml:space="preserve">"#;

/// Rewrites marker tokens in one rendered XML part into run boundaries with
/// explicit font attributes. Special-font markers are resolved first; their
/// payload grammar overlaps the language markers and must not be consumed by
/// the generic scan.
pub fn apply_font_styles(xml: &str, fonts: &FontConfig) -> String {
    let out = markers::SPECIAL_START_RE.replace_all(xml, |caps: &Captures| {
        let font = &caps[1];
        let half_points = caps[2].parse::<u64>().unwrap_or(0).saturating_mul(2);
        format!(
            r#"</w:t></w:r><w:r><w:rPr><w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}" w:eastAsia="{font}"/><w:sz w:val="{half_points}"/><w:szCs w:val="{half_points}"/></w:rPr><w:t xml:space="preserve">"#
        )
    });
    let out = out.replace(markers::SPECIAL_END, RUN_RESET);

    let out = markers::LANG_START_RE.replace_all(&out, |caps: &Captures| {
        let language = &caps[1];
        let font = fonts.for_language(language);
        let rtl = if language == lang::PERSIAN { "<w:rtl/>" } else { "" };
        format!(
            r#"</w:t></w:r><w:r><w:rPr><w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}" w:eastAsia="{font}"/>{rtl}</w:rPr><w:t xml:space="preserve">"#
        )
    });
    out.replace(markers::LANG_END, RUN_RESET)
}

/// `apply_font_styles` plus leak detection: any marker still present after
/// rewriting means the renderer split it across text nodes and the raw token
/// would show up in the document.
pub fn rewrite_part(part_name: &str, xml: &str, fonts: &FontConfig) -> String {
    let out = apply_font_styles(xml, fonts);
    let leaked = residual_marker_count(&out);
    if leaked > 0 {
        warn!(
            "{leaked} marker token(s) survived font rewriting in {part_name}; a marker was split across text nodes"
        );
    }
    out
}

pub fn residual_marker_count(xml: &str) -> usize {
    markers::ANY_MARKER_RE.find_iter(xml).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fonts() -> FontConfig {
        FontConfig::default()
    }

    #[test]
    fn persian_run_gets_rtl_and_persian_font() {
        let xml = "<w:t>___LANG_START___persian|درود___LANG_END___</w:t>";
        let out = apply_font_styles(xml, &fonts());
        assert!(out.contains(r#"<w:rFonts w:ascii="B Nazanin" w:hAnsi="B Nazanin" w:cs="B Nazanin" w:eastAsia="B Nazanin"/>"#));
        assert!(out.contains("<w:rtl/>"));
        assert!(out.contains("درود"));
        assert_eq!(residual_marker_count(&out), 0);
    }

    #[test]
    fn english_run_has_no_rtl() {
        let xml = "<w:t>___LANG_START___english|Hello___LANG_END___</w:t>";
        let out = apply_font_styles(xml, &fonts());
        assert!(out.contains(r#"w:ascii="Times New Roman""#));
        assert!(!out.contains("<w:rtl/>"));
    }

    #[test]
    fn unknown_language_falls_back_to_default_font() {
        let xml = "<w:t>___LANG_START___arabic|نص___LANG_END___</w:t>";
        let out = apply_font_styles(xml, &fonts());
        assert!(out.contains(r#"w:ascii="Times New Roman""#));
        assert!(!out.contains("<w:rtl/>"));
    }

    #[test]
    fn special_marker_sets_font_and_half_point_size() {
        let xml = "<w:t>___SPECIAL_START___B Titr|26|عنوان___SPECIAL_END___</w:t>";
        let out = apply_font_styles(xml, &fonts());
        assert!(out.contains(r#"w:ascii="B Titr""#));
        assert!(out.contains(r#"<w:sz w:val="52"/>"#));
        assert!(out.contains(r#"<w:szCs w:val="52"/>"#));
        assert_eq!(residual_marker_count(&out), 0);
    }

    #[test]
    fn special_is_resolved_before_language_markers() {
        let xml = concat!(
            "<w:t>___SPECIAL_START___B Titr|26|عنوان___SPECIAL_END___</w:t>",
            "<w:t>___LANG_START___english|Body___LANG_END___</w:t>"
        );
        let out = apply_font_styles(xml, &fonts());
        assert!(out.contains(r#"w:ascii="B Titr""#));
        assert!(out.contains(r#"w:ascii="Times New Roman""#));
        assert_eq!(residual_marker_count(&out), 0);
    }

    #[test]
    fn runs_are_closed_and_reopened_around_styled_text() {
        let xml = "<w:r><w:rPr></w:rPr><w:t>___LANG_START___english|Hi___LANG_END___</w:t></w:r>";
        let out = apply_font_styles(xml, &fonts());
        assert!(out.contains(r#"</w:t></w:r><w:r><w:rPr>"#));
        assert!(out.contains(r#"<w:t xml:space="preserve">Hi</w:t></w:r>"#));
    }

    #[test]
    fn leaked_marker_is_counted() {
        // A start token split across nodes never matches the payload regex.
        let xml = "<w:t>___LANG_START___per</w:t><w:t>sian|text___LANG_END___</w:t>";
        let out = apply_font_styles(xml, &fonts());
        assert!(residual_marker_count(&out) > 0);
    }
}
