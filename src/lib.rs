//! Survey-export JSON to styled Word documents: placeholder
//! transformation, `.docx` template rendering, and per-language font
//! styling of the substituted runs.

pub mod config;
pub mod digits;
pub mod docx;
pub mod export;
pub mod fonts;
pub mod fontstyle;
pub mod generator;
pub mod jalali;
pub mod lang;
pub mod mapping;
pub mod markers;
pub mod resolve;
pub mod segment;
pub mod transform;
