//! `.docx` assembly
//!
//! Serializes a built [`Document`] with docx-rs and then grafts the
//! template's own `word/styles.xml` into the package, so every style the
//! paragraphs reference resolves to the template's definition.

mod graft;
mod numbering;
mod writer;

use log::{debug, info};
use std::io::Cursor;

use crate::document::Document;
use crate::error::AssembleError;
use crate::template::TemplateReader;

const STYLES_PART: &str = "word/styles.xml";

#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentAssembler;

impl DocumentAssembler {
    pub fn new() -> Self {
        DocumentAssembler
    }

    /// Produce `.docx` bytes for `document` styled by `reader`'s template
    pub fn assemble(
        &self,
        document: &Document,
        reader: &TemplateReader,
    ) -> Result<Vec<u8>, AssembleError> {
        let packed = pack(document, reader)?;

        match reader.style_resource() {
            Some(styles) => {
                debug!("Grafting template styles ({} bytes)", styles.len());
                graft::replace_part(&packed, STYLES_PART, styles)
            }
            None => {
                info!("Template has no style resource, keeping generated styles");
                Ok(packed)
            }
        }
    }
}

fn pack(document: &Document, reader: &TemplateReader) -> Result<Vec<u8>, AssembleError> {
    let mut buffer = Vec::new();
    writer::render(document, reader)
        .build()
        .pack(&mut Cursor::new(&mut buffer))
        .map_err(|e| AssembleError::Pack(e.to_string()))?;
    Ok(buffer)
}
