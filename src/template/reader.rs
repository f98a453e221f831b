//! Template container access
//!
//! This module opens a `.docx` template, extracts its style registry and page
//! geometry, and keeps the raw `word/styles.xml` bytes so the assembler can
//! graft them into generated documents.

use log::{debug, info};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zip::ZipArchive;

use super::builtin;
use super::styles::{self, PageSettings, StyleDefinition, StyleKind, StyleRef};
use crate::error::TemplateError;

/// Upper bound on the buffer reserved from a zip entry's declared size
const MAX_PART_PREALLOC: u64 = 1024 * 1024;

pub(crate) const STYLES_PART: &str = "word/styles.xml";
pub(crate) const DOCUMENT_PART: &str = "word/document.xml";

/// Read-only view of a template's styles and page geometry
#[derive(Debug, Clone)]
pub struct TemplateReader {
    source: Option<PathBuf>,
    styles: Vec<StyleRef>,
    index: HashMap<String, usize>,
    page_settings: Option<PageSettings>,
    style_resource: Option<Vec<u8>>,
}

impl TemplateReader {
    /// Open and parse a template file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = Self::from_archive(ZipArchive::new(file)?)?;
        reader.source = Some(path.to_path_buf());

        info!(
            "Loaded template {} with {} styles",
            path.display(),
            reader.styles.len()
        );
        Ok(reader)
    }

    /// Parse a template held in memory
    pub fn from_bytes(data: &[u8]) -> Result<Self, TemplateError> {
        Self::from_archive(ZipArchive::new(Cursor::new(data))?)
    }

    /// Standard Word-like styles with no template behind them.
    ///
    /// Documents built from this registry carry their styles inline instead
    /// of a grafted `styles.xml`.
    pub fn builtin() -> Self {
        Self::from_parts(None, builtin::styles(), None, None)
    }

    /// Registry built from already-parsed definitions, with no container behind it
    pub fn from_definitions(definitions: Vec<StyleDefinition>) -> Self {
        Self::from_parts(None, definitions, None, None)
    }

    /// Whether a template file exists at `path`
    pub fn exists(path: impl AsRef<Path>) -> bool {
        path.as_ref().is_file()
    }

    fn from_archive<R: Read + Seek>(mut archive: ZipArchive<R>) -> Result<Self, TemplateError> {
        let styles_xml = read_part(&mut archive, STYLES_PART)?.ok_or(TemplateError::MissingStyles)?;
        let styles = styles::parse_styles(&styles_xml)?;

        let page_settings = match read_part(&mut archive, DOCUMENT_PART)? {
            Some(document_xml) => styles::parse_page_settings(&document_xml),
            None => None,
        };
        if page_settings.is_none() {
            debug!("Template has no usable page settings");
        }

        Ok(Self::from_parts(None, styles, page_settings, Some(styles_xml)))
    }

    fn from_parts(
        source: Option<PathBuf>,
        definitions: Vec<StyleDefinition>,
        page_settings: Option<PageSettings>,
        style_resource: Option<Vec<u8>>,
    ) -> Self {
        let mut styles: Vec<StyleRef> = Vec::with_capacity(definitions.len());
        let mut index = HashMap::new();

        // Later definitions with the same id replace earlier ones in place
        for definition in definitions {
            match index.get(&definition.id) {
                Some(&slot) => styles[slot] = Arc::new(definition),
                None => {
                    index.insert(definition.id.clone(), styles.len());
                    styles.push(Arc::new(definition));
                }
            }
        }

        TemplateReader {
            source,
            styles,
            index,
            page_settings,
            style_resource,
        }
    }

    pub fn get_style(&self, id: &str) -> Option<StyleRef> {
        self.index.get(id).map(|&slot| Arc::clone(&self.styles[slot]))
    }

    /// Find a style by display name, ignoring case and surrounding whitespace
    pub fn get_style_by_name(&self, name: &str) -> Option<StyleRef> {
        let wanted = name.trim().to_lowercase();
        self.styles
            .iter()
            .find(|style| style.name.trim().to_lowercase() == wanted)
            .cloned()
    }

    pub fn all_styles(&self) -> &[StyleRef] {
        &self.styles
    }

    pub fn paragraph_styles(&self) -> Vec<StyleRef> {
        self.styles_of(StyleKind::Paragraph)
    }

    pub fn character_styles(&self) -> Vec<StyleRef> {
        self.styles_of(StyleKind::Character)
    }

    pub fn table_styles(&self) -> Vec<StyleRef> {
        self.styles_of(StyleKind::Table)
    }

    fn styles_of(&self, kind: StyleKind) -> Vec<StyleRef> {
        self.styles
            .iter()
            .filter(|style| style.kind == kind)
            .cloned()
            .collect()
    }

    pub fn page_settings(&self) -> Option<&PageSettings> {
        self.page_settings.as_ref()
    }

    /// Raw bytes of the template's `word/styles.xml`
    pub fn style_resource(&self) -> Option<&[u8]> {
        self.style_resource.as_deref()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>, TemplateError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut data = Vec::with_capacity(capacity_hint(entry.size()));
    entry.read_to_end(&mut data)?;
    Ok(Some(data))
}

/// Preallocation for a part whose header declares `declared` bytes
fn capacity_hint(declared: u64) -> usize {
    declared.min(MAX_PART_PREALLOC) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn container(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            for (name, body) in parts {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(body.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    const STYLES: &str = r#"<w:styles xmlns:w="x">
        <w:style w:type="paragraph" w:styleId="1"><w:name w:val="Normal"/></w:style>
        <w:style w:type="paragraph" w:styleId="2"><w:name w:val="heading 1"/></w:style>
        <w:style w:type="character" w:styleId="9"><w:name w:val="Strong"/></w:style>
        <w:style w:type="paragraph" w:styleId="2"><w:name w:val=" Heading One "/></w:style>
    </w:styles>"#;

    #[test]
    fn test_missing_styles_part() {
        let data = container(&[(DOCUMENT_PART, "<w:document/>")]);
        let err = TemplateReader::from_bytes(&data).unwrap_err();
        assert!(matches!(err, TemplateError::MissingStyles));
        assert_eq!(err.to_string(), "styles.xml not found in template");
    }

    #[test]
    fn test_not_a_zip() {
        let err = TemplateReader::from_bytes(b"plain text").unwrap_err();
        assert!(matches!(err, TemplateError::Zip(_)));
    }

    #[test]
    fn test_duplicate_ids_overwrite() {
        let data = container(&[(STYLES_PART, STYLES)]);
        let reader = TemplateReader::from_bytes(&data).unwrap();

        assert_eq!(reader.all_styles().len(), 3);
        assert_eq!(reader.get_style("2").unwrap().name, " Heading One ");
        assert!(reader.get_style_by_name("heading 1").is_none());
        assert_eq!(reader.get_style_by_name("HEADING ONE").unwrap().id, "2");
    }

    #[test]
    fn test_filters_by_kind_and_keeps_resource() {
        let data = container(&[(STYLES_PART, STYLES)]);
        let reader = TemplateReader::from_bytes(&data).unwrap();

        assert_eq!(reader.paragraph_styles().len(), 2);
        assert_eq!(reader.character_styles().len(), 1);
        assert!(reader.table_styles().is_empty());
        assert_eq!(reader.style_resource(), Some(STYLES.as_bytes()));
        assert!(reader.page_settings().is_none());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.docx");
        std::fs::write(&path, container(&[(STYLES_PART, STYLES)])).unwrap();

        assert!(TemplateReader::exists(&path));
        let reader = TemplateReader::load(&path).unwrap();
        assert_eq!(reader.source(), Some(path.as_path()));
        assert!(!TemplateReader::exists(dir.path().join("missing.docx")));
    }

    #[test]
    fn test_builtin_has_no_resource() {
        let reader = TemplateReader::builtin();
        assert!(reader.style_resource().is_none());
        assert!(reader.get_style_by_name("Normal").is_some());
    }

    #[test]
    fn test_declared_part_size_is_capped() {
        assert_eq!(capacity_hint(512), 512);
        assert_eq!(capacity_hint(u64::MAX), MAX_PART_PREALLOC as usize);
    }
}
