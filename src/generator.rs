use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::docx::package::DocxPackage;
use crate::docx::render;
use crate::docx::xml::{parse_xml_part, write_xml_part};
use crate::fonts::{FontConfig, FontOverrides};
use crate::fontstyle;
use crate::segment;

/// One-document pipeline: template package in, placeholder data substituted,
/// fonts applied per detected language, `.docx` out.
pub struct DocumentGenerator {
    template_path: PathBuf,
    output_path: PathBuf,
    fonts: FontConfig,
}

impl DocumentGenerator {
    pub fn new(template_path: &Path, output_path: &Path) -> Self {
        Self {
            template_path: template_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            fonts: FontConfig::default(),
        }
    }

    pub fn with_fonts(mut self, fonts: FontConfig) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn set_fonts(&mut self, overrides: &FontOverrides) {
        self.fonts.merge(overrides);
    }

    pub fn fonts(&self) -> &FontConfig {
        &self.fonts
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Renders and writes the document to the configured output path.
    pub fn generate(&self, data: &Map<String, Value>) -> anyhow::Result<()> {
        let bytes = self.generate_bytes(data)?;
        fs::write(&self.output_path, bytes)
            .with_context(|| format!("write document: {}", self.output_path.display()))?;
        info!("document written to {}", self.output_path.display());
        Ok(())
    }

    /// Renders the document in memory; batch export streams these bytes
    /// straight into its ZIP.
    pub fn generate_bytes(&self, data: &Map<String, Value>) -> anyhow::Result<Vec<u8>> {
        let package = DocxPackage::read(&self.template_path)?;
        // Markers go in before rendering so they come out inside the
        // substituted text nodes.
        let wrapped = segment::wrap(&Value::Object(data.clone()), &self.fonts);

        let mut replacements: HashMap<String, Vec<u8>> = HashMap::new();
        let mut rendered_parts = 0usize;
        for ent in package.xml_entries() {
            let part = parse_xml_part(&ent.name, &ent.data)?;
            let has_tags = render::part_has_tags(&part);
            let part = if has_tags {
                rendered_parts += 1;
                debug!("rendering part {}", ent.name);
                render::render_part(&part, &wrapped)?
            } else {
                part
            };
            let xml = String::from_utf8(write_xml_part(&part)?)
                .with_context(|| format!("utf-8 xml part: {}", ent.name))?;
            let styled = fontstyle::rewrite_part(&ent.name, &xml, &self.fonts);
            // Untouched members keep their original bytes.
            if has_tags || styled != xml {
                replacements.insert(ent.name.clone(), styled.into_bytes());
            }
        }
        info!(
            "rendered {rendered_parts} template part(s) from {}",
            self.template_path.display()
        );
        package.to_bytes(&replacements)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read, Write};
    use std::path::PathBuf;

    use serde_json::{json, Map, Value};
    use zip::write::SimpleFileOptions;
    use zip::{ZipArchive, ZipWriter};

    use super::DocumentGenerator;

    const DOC_XML: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        "<w:document><w:body>",
        "<w:p><w:r><w:t>{system_title}</w:t></w:r></w:p>",
        "<w:tbl><w:tr>",
        "<w:tc><w:p><w:r><w:t>{#system_owner}{name}</w:t></w:r></w:p></w:tc>",
        "<w:tc><w:p><w:r><w:t>{mobile}{/system_owner}</w:t></w:r></w:p></w:tc>",
        "</w:tr></w:tbl>",
        "</w:body></w:document>"
    );

    fn template_bytes() -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let opts = SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", opts).unwrap();
        zip.write_all(br#"<?xml version="1.0"?><Types/>"#).unwrap();
        zip.start_file("word/document.xml", opts).unwrap();
        zip.write_all(DOC_XML.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sanadsaz_{}_{name}", std::process::id()))
    }

    fn document_xml(docx: &[u8]) -> String {
        let mut zip = ZipArchive::new(Cursor::new(docx.to_vec())).unwrap();
        let mut file = zip.by_name("word/document.xml").unwrap();
        let mut s = String::new();
        file.read_to_string(&mut s).unwrap();
        s
    }

    fn data() -> Map<String, Value> {
        let Value::Object(map) = json!({
            "system_title": "سامانه آزمون",
            "system_owner": [
                {"name": "رضا احمدی", "mobile": "۰۹۱۲۱۲۳۴۵۶۷"},
                {"name": "Sara Lee", "mobile": " "},
            ],
        }) else {
            unreachable!()
        };
        map
    }

    #[test]
    fn markers_round_trip_into_styled_runs() {
        let template = temp_path("markers.docx");
        std::fs::write(&template, template_bytes()).unwrap();

        let generator = DocumentGenerator::new(&template, &temp_path("unused.docx"));
        let docx = generator.generate_bytes(&data()).expect("generate");
        let doc = document_xml(&docx);

        assert!(doc.contains("سامانه آزمون"));
        assert!(doc.contains(r#"w:ascii="B Nazanin""#));
        assert!(doc.contains("<w:rtl/>"));
        assert!(doc.contains(r#"w:ascii="Times New Roman""#));
        assert!(!doc.contains("___"));
        assert!(!doc.contains("{system_title}"));
        assert_eq!(doc.matches("<w:tr>").count(), 2);

        let _ = std::fs::remove_file(template);
    }

    #[test]
    fn generate_writes_the_output_file() {
        let template = temp_path("write_template.docx");
        let output = temp_path("write_output.docx");
        std::fs::write(&template, template_bytes()).unwrap();

        let generator = DocumentGenerator::new(&template, &output);
        generator.generate(&data()).expect("generate");
        let bytes = std::fs::read(&output).expect("output exists");
        assert!(document_xml(&bytes).contains("سامانه آزمون"));

        let _ = std::fs::remove_file(template);
        let _ = std::fs::remove_file(output);
    }
}
