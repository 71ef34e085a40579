use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::fonts::FontOverrides;

pub const CONFIG_FILENAME: &str = "sanadsaz.toml";
pub const CONFIG_ENV: &str = "SANADSAZ_CONFIG";

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub export: ExportSection,
    #[serde(default)]
    pub fonts: FontOverrides,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ExportSection {
    /// Template .docx used when --template is not passed.
    #[serde(default)]
    pub template: Option<PathBuf>,

    /// Placeholder mapping JSON used when --mapping is not passed.
    #[serde(default)]
    pub mapping: Option<PathBuf>,

    /// Output directory for batch exports (default: next to the input).
    #[serde(default)]
    pub out_dir: Option<PathBuf>,
}

pub fn find_file_upwards(start_dir: &Path, filename: &str, max_levels: usize) -> Option<PathBuf> {
    let mut dir = start_dir;
    for _ in 0..=max_levels {
        let candidate = dir.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
    None
}

pub fn find_default_config(workdir: &Path) -> Option<PathBuf> {
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(p) = find_file_upwards(&cwd, CONFIG_FILENAME, 8) {
            return Some(p);
        }
    }
    if let Some(p) = find_file_upwards(workdir, CONFIG_FILENAME, 8) {
        return Some(p);
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            if let Some(p) = find_file_upwards(dir, CONFIG_FILENAME, 10) {
                return Some(p);
            }
        }
    }
    None
}

/// Explicit path wins, then the env override, then the upward search.
pub fn resolve_config_file(explicit: Option<PathBuf>, workdir: &Path) -> Option<PathBuf> {
    explicit
        .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from))
        .or_else(|| find_default_config(workdir))
}

pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: AppConfig = toml::from_str(&text).context("parse config toml")?;
    Ok(cfg)
}

pub fn init_default_config(dir: &Path, force: bool) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create config dir: {}", dir.display()))?;
    let cfg_path = dir.join(CONFIG_FILENAME);
    if cfg_path.exists() && !force {
        return Ok(cfg_path);
    }

    let cfg_text = r#"[export]
# Defaults used when the matching flag is not passed on the command line.
# template = "template.docx"
# mapping = "mapping.json"
# out_dir = "exports"

[fonts]
persian = "B Nazanin"
english = "Times New Roman"
default = "Times New Roman"
# Heading font for the first-page title placeholders:
# system_title_first = "B Titr"
"#;

    std::fs::write(&cfg_path, cfg_text)
        .with_context(|| format!("write config: {}", cfg_path.display()))?;
    Ok(cfg_path)
}
