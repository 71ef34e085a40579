use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::fonts::{FontConfig, FontOverrides};
use crate::generator::DocumentGenerator;
use crate::transform::Transformer;

static INVALID_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("invalid chars regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static UNDERSCORE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_{2,}").expect("underscore regex"));

/// Transformer + template + fonts bundled for export calls.
pub struct Exporter {
    transformer: Transformer,
    template_path: PathBuf,
    fonts: FontConfig,
}

impl Exporter {
    pub fn new(mapping_path: &Path, template_path: &Path) -> anyhow::Result<Self> {
        Ok(Self::with_transformer(
            Transformer::load(mapping_path)?,
            template_path,
        ))
    }

    pub fn with_transformer(transformer: Transformer, template_path: &Path) -> Self {
        Self {
            transformer,
            template_path: template_path.to_path_buf(),
            fonts: FontConfig::default(),
        }
    }

    pub fn set_fonts(&mut self, overrides: &FontOverrides) {
        self.fonts.merge(overrides);
    }

    pub fn transformer(&self) -> &Transformer {
        &self.transformer
    }

    pub fn transform(&self, raw: &Value) -> Map<String, Value> {
        self.transformer.transform(raw)
    }

    /// Transform and render one document to an explicit output path.
    pub fn generate_document(&self, raw: &Value, output: &Path) -> anyhow::Result<()> {
        let data = self.transform(raw);
        self.generate_from(&data, output)
    }

    /// Render an already-transformed map to an explicit output path.
    pub fn generate_from(&self, data: &Map<String, Value>, output: &Path) -> anyhow::Result<()> {
        self.generator_for(output).generate(data)
    }

    /// Single export into a directory; the file is named after the document
    /// title.
    pub fn export_single(&self, raw: &Value, out_dir: &Path) -> anyhow::Result<PathBuf> {
        self.export_transformed(&self.transform(raw), out_dir)
    }

    pub fn export_transformed(
        &self,
        data: &Map<String, Value>,
        out_dir: &Path,
    ) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("create output dir: {}", out_dir.display()))?;
        let path = out_dir.join(format!("{}.docx", sanitize_filename(&document_title(data))));
        self.generator_for(&path).generate(data)?;
        Ok(path)
    }

    /// One document per input, packed into a ZIP. Duplicate titles get
    /// numeric suffixes.
    pub fn export_batch(
        &self,
        raws: &[Value],
        out_dir: &Path,
        zip_name: Option<&str>,
    ) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("create output dir: {}", out_dir.display()))?;
        let name = zip_name
            .map(str::to_string)
            .unwrap_or_else(default_batch_zip_name);
        let zip_path = out_dir.join(name);
        let file = fs::File::create(&zip_path)
            .with_context(|| format!("create batch zip: {}", zip_path.display()))?;
        let mut zip = ZipWriter::new(file);
        let opts = SimpleFileOptions::default();

        let mut used: HashMap<String, usize> = HashMap::new();
        for raw in raws {
            let data = self.transform(raw);
            let base = sanitize_filename(&document_title(&data));
            let filename = numbered_name(&mut used, &base);
            let bytes = self
                .generator_for(Path::new(&filename))
                .generate_bytes(&data)
                .with_context(|| format!("generate {filename}"))?;
            zip.start_file(&filename, opts)
                .with_context(|| format!("start zip member: {filename}"))?;
            zip.write_all(&bytes)
                .with_context(|| format!("write zip member: {filename}"))?;
            info!("added {filename} to batch");
        }
        zip.finish().context("finish batch zip")?;
        info!("batch written to {}", zip_path.display());
        Ok(zip_path)
    }

    fn generator_for(&self, output: &Path) -> DocumentGenerator {
        DocumentGenerator::new(&self.template_path, output).with_fonts(self.fonts.clone())
    }
}

/// Output stem for one document: its title placeholder, else a fixed
/// fallback.
pub fn document_title(data: &Map<String, Value>) -> String {
    for key in ["title", "system_title"] {
        if let Some(Value::String(s)) = data.get(key) {
            if !s.trim().is_empty() {
                return s.clone();
            }
        }
    }
    "document".to_string()
}

pub fn sanitize_filename(name: &str) -> String {
    let out = INVALID_CHARS_RE.replace_all(name, "_");
    let out = WHITESPACE_RE.replace_all(&out, "_");
    let out = UNDERSCORE_RUN_RE.replace_all(&out, "_");
    let capped: String = out.trim_matches('_').chars().take(100).collect();
    if capped.is_empty() {
        "document".to_string()
    } else {
        capped
    }
}

fn default_batch_zip_name() -> String {
    format!("batch_export_{}.zip", Local::now().format("%Y-%m-%d"))
}

fn numbered_name(used: &mut HashMap<String, usize>, base: &str) -> String {
    let n = used.entry(base.to_string()).or_insert(0);
    *n += 1;
    if *n == 1 {
        format!("{base}.docx")
    } else {
        format!("{base}_{n}.docx", n = *n)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::{Cursor, Write};
    use std::path::PathBuf;

    use serde_json::{json, Value};
    use zip::write::SimpleFileOptions;
    use zip::{ZipArchive, ZipWriter};

    use super::{
        default_batch_zip_name, document_title, numbered_name, sanitize_filename, Exporter,
    };
    use crate::mapping::MappingTable;
    use crate::transform::Transformer;

    #[test]
    fn sanitize_replaces_reserved_and_whitespace() {
        assert_eq!(sanitize_filename("a<b>c: d/e"), "a_b_c_d_e");
        assert_eq!(sanitize_filename("  lots   of spaces  "), "lots_of_spaces");
        assert_eq!(sanitize_filename("___"), "document");
        assert_eq!(sanitize_filename(""), "document");
        assert_eq!(sanitize_filename("سامانه ملی خدمات"), "سامانه_ملی_خدمات");

        let long = "x".repeat(300);
        assert_eq!(sanitize_filename(&long).chars().count(), 100);
    }

    #[test]
    fn title_prefers_title_then_system_title() {
        let both = json!({"title": "فرآیند", "system_title": "سامانه"});
        let Value::Object(both) = both else { unreachable!() };
        assert_eq!(document_title(&both), "فرآیند");

        let system = json!({"title": "  ", "system_title": "سامانه"});
        let Value::Object(system) = system else { unreachable!() };
        assert_eq!(document_title(&system), "سامانه");

        let neither = json!({"name": "x"});
        let Value::Object(neither) = neither else { unreachable!() };
        assert_eq!(document_title(&neither), "document");
    }

    #[test]
    fn numbered_names_suffix_duplicates() {
        let mut used = HashMap::new();
        assert_eq!(numbered_name(&mut used, "report"), "report.docx");
        assert_eq!(numbered_name(&mut used, "report"), "report_2.docx");
        assert_eq!(numbered_name(&mut used, "report"), "report_3.docx");
        assert_eq!(numbered_name(&mut used, "other"), "other.docx");
    }

    #[test]
    fn batch_zip_name_is_dated() {
        let name = default_batch_zip_name();
        assert!(name.starts_with("batch_export_"));
        assert!(name.ends_with(".zip"));
    }

    fn template_path(tag: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "sanadsaz_export_{}_{tag}.docx",
            std::process::id()
        ));
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let opts = SimpleFileOptions::default();
        zip.start_file("word/document.xml", opts).unwrap();
        zip.write_all("<w:document><w:body><w:p><w:r><w:t>{title}</w:t></w:r></w:p></w:body></w:document>".as_bytes())
            .unwrap();
        std::fs::write(&path, zip.finish().unwrap().into_inner()).unwrap();
        path
    }

    fn exporter(tag: &str) -> (Exporter, PathBuf) {
        let table = MappingTable::from_json(
            r#"{"mappings": [{"placeholder": "title", "jsonPath": "formData.title"}]}"#,
        )
        .unwrap();
        let template = template_path(tag);
        (
            Exporter::with_transformer(Transformer::new(table), &template),
            template,
        )
    }

    #[test]
    fn single_export_names_file_from_title() {
        let (exporter, template) = exporter("single");
        let out_dir = std::env::temp_dir().join(format!(
            "sanadsaz_export_single_{}",
            std::process::id()
        ));
        let raw = json!({"formData": {"title": "گزارش سالانه"}});
        let path = exporter.export_single(&raw, &out_dir).expect("export");
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("گزارش_سالانه.docx")
        );
        assert!(path.exists());

        let _ = std::fs::remove_dir_all(out_dir);
        let _ = std::fs::remove_file(template);
    }

    #[test]
    fn batch_export_suffixes_duplicate_titles() {
        let (exporter, template) = exporter("batch");
        let out_dir = std::env::temp_dir().join(format!(
            "sanadsaz_export_batch_{}",
            std::process::id()
        ));
        let raws = vec![
            json!({"formData": {"title": "سند"}}),
            json!({"formData": {"title": "سند"}}),
        ];
        let zip_path = exporter
            .export_batch(&raws, &out_dir, Some("pack.zip"))
            .expect("batch");
        assert!(zip_path.ends_with("pack.zip"));

        let bytes = std::fs::read(&zip_path).unwrap();
        let zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<_> = zip.file_names().collect();
        assert!(names.contains(&"سند.docx"));
        assert!(names.contains(&"سند_2.docx"));

        let _ = std::fs::remove_dir_all(out_dir);
        let _ = std::fs::remove_file(template);
    }
}
