use serde::Deserialize;

use crate::lang;

pub const DEFAULT_PERSIAN_FONT: &str = "B Nazanin";
pub const DEFAULT_ENGLISH_FONT: &str = "Times New Roman";
pub const DEFAULT_HEADING_FONT: &str = "B Titr";
pub const HEADING_SIZE: u32 = 26;

/// Fonts applied per detected language, plus the heading font used by the
/// first-page title placeholders.
#[derive(Clone, Debug, Deserialize)]
pub struct FontConfig {
    pub persian: String,
    pub english: String,
    pub default: String,
    #[serde(default)]
    pub system_title_first: Option<String>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            persian: DEFAULT_PERSIAN_FONT.to_string(),
            english: DEFAULT_ENGLISH_FONT.to_string(),
            default: DEFAULT_ENGLISH_FONT.to_string(),
            system_title_first: None,
        }
    }
}

/// Partial override set; unset fields keep their current value.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FontOverrides {
    #[serde(default)]
    pub persian: Option<String>,
    #[serde(default)]
    pub english: Option<String>,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub system_title_first: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpecialFont {
    pub name: String,
    pub size: u32,
}

impl FontConfig {
    pub fn merge(&mut self, overrides: &FontOverrides) {
        if let Some(f) = overrides.persian.as_ref() {
            self.persian = f.clone();
        }
        if let Some(f) = overrides.english.as_ref() {
            self.english = f.clone();
        }
        if let Some(f) = overrides.default.as_ref() {
            self.default = f.clone();
        }
        if let Some(f) = overrides.system_title_first.as_ref() {
            self.system_title_first = Some(f.clone());
        }
    }

    pub fn for_language(&self, language: &str) -> &str {
        match language {
            lang::PERSIAN => &self.persian,
            lang::ENGLISH => &self.english,
            _ => &self.default,
        }
    }

    /// Title placeholders on the cover page carry a distinct heading font.
    pub fn special_for(&self, key: &str) -> Option<SpecialFont> {
        match key {
            "title_1" | "system_title_1" => Some(SpecialFont {
                name: self
                    .system_title_first
                    .clone()
                    .unwrap_or_else(|| DEFAULT_HEADING_FONT.to_string()),
                size: HEADING_SIZE,
            }),
            _ => None,
        }
    }
}
