use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use anyhow::Context;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// A `.docx` template held as its raw zip entries. Entries keep their
/// compression method and timestamps so untouched members round-trip
/// byte-for-byte.
pub struct DocxPackage {
    pub entries: Vec<DocxEntry>,
}

pub struct DocxEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub compression: CompressionMethod,
    pub last_modified: zip::DateTime,
    pub unix_mode: Option<u32>,
    pub is_dir: bool,
}

impl DocxPackage {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let f = File::open(path).with_context(|| format!("open template: {}", path.display()))?;
        Self::read_from(f).with_context(|| format!("read template: {}", path.display()))
    }

    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        Self::read_from(Cursor::new(bytes))
    }

    fn read_from<R: Read + Seek>(reader: R) -> anyhow::Result<Self> {
        let mut zip = ZipArchive::new(reader).context("read zip")?;
        let mut entries = Vec::new();
        for i in 0..zip.len() {
            let mut file = zip.by_index(i).context("zip entry")?;
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data).context("read zip entry")?;
            entries.push(DocxEntry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                last_modified: file.last_modified().unwrap_or_default(),
                unix_mode: file.unix_mode(),
                is_dir: file.is_dir(),
            });
        }
        Ok(Self { entries })
    }

    /// Writes the package with some members replaced by freshly rendered
    /// bytes; everything else is copied through unchanged.
    pub fn write_with_replacements(
        &self,
        output_path: &Path,
        replacements: &HashMap<String, Vec<u8>>,
    ) -> anyhow::Result<()> {
        let f = File::create(output_path)
            .with_context(|| format!("create output docx: {}", output_path.display()))?;
        self.write_to(f, replacements)
    }

    pub fn to_bytes(&self, replacements: &HashMap<String, Vec<u8>>) -> anyhow::Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor, replacements)?;
        Ok(cursor.into_inner())
    }

    fn write_to<W: Write + Seek>(
        &self,
        writer: W,
        replacements: &HashMap<String, Vec<u8>>,
    ) -> anyhow::Result<()> {
        let mut zout = ZipWriter::new(writer);
        for ent in &self.entries {
            let data = replacements
                .get(&ent.name)
                .map(|d| d.as_slice())
                .unwrap_or(&ent.data);
            let mut opts = SimpleFileOptions::default()
                .compression_method(ent.compression)
                .last_modified_time(ent.last_modified);
            if let Some(mode) = ent.unix_mode {
                opts = opts.unix_permissions(mode);
            }
            if ent.is_dir || ent.name.ends_with('/') {
                zout.add_directory(&ent.name, opts)
                    .with_context(|| format!("add zip dir: {}", ent.name))?;
            } else {
                zout.start_file(&ent.name, opts)
                    .with_context(|| format!("start zip file: {}", ent.name))?;
                zout.write_all(data)
                    .with_context(|| format!("write zip file: {}", ent.name))?;
            }
        }
        zout.finish().context("finish zip")?;
        Ok(())
    }

    /// The XML members, template parts and plumbing alike. Headers and
    /// footers carry placeholder tags too, so rendering walks all of them.
    pub fn xml_entries(&self) -> Vec<&DocxEntry> {
        self.entries
            .iter()
            .filter(|e| e.name.to_lowercase().ends_with(".xml"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    use super::DocxPackage;

    fn tiny_package() -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let opts = SimpleFileOptions::default();
        zip.start_file("word/document.xml", opts).unwrap();
        zip.write_all(b"<w:document/>").unwrap();
        zip.start_file("word/media/image1.png", opts).unwrap();
        zip.write_all(&[0x89, 0x50, 0x4e, 0x47]).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn replacement_swaps_one_member_and_keeps_the_rest() {
        let package = DocxPackage::from_bytes(&tiny_package()).expect("read");
        let mut replacements = HashMap::new();
        replacements.insert(
            "word/document.xml".to_string(),
            b"<w:document>done</w:document>".to_vec(),
        );
        let out = package.to_bytes(&replacements).expect("write");

        let round = DocxPackage::from_bytes(&out).expect("reread");
        let doc = round
            .entries
            .iter()
            .find(|e| e.name == "word/document.xml")
            .expect("document entry");
        assert_eq!(doc.data, b"<w:document>done</w:document>");
        let img = round
            .entries
            .iter()
            .find(|e| e.name == "word/media/image1.png")
            .expect("image entry");
        assert_eq!(img.data, vec![0x89, 0x50, 0x4e, 0x47]);
    }

    #[test]
    fn xml_entries_filters_by_extension() {
        let package = DocxPackage::from_bytes(&tiny_package()).expect("read");
        let names: Vec<_> = package.xml_entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["word/document.xml"]);
    }
}
