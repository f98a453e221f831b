//! markdocx: Markdown to template-styled .docx conversion
//!
//! This library reads the styles of an existing Word template, maps Markdown
//! elements onto them and assembles a `.docx` whose paragraphs reference the
//! template's own style definitions.

pub mod assemble;
pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod i18n;
pub mod security;
pub mod template;
pub mod upload;

// Re-export commonly used types
pub use assemble::DocumentAssembler;
pub use config::Config;
pub use convert::Converter;
pub use document::{Document, DocumentElement, ImageFetcher, MarkdownDocumentBuilder};
pub use error::{
    AssembleError, ConvertError, ImageError, SecurityError, StyleError, TemplateError, UploadError,
};
pub use i18n::Language;
pub use security::SecurityFilter;
pub use template::{ElementType, StyleMapper, TemplateCache, TemplateReader};
pub use upload::{LocalDirSink, UploadReceipt, UploadSink};
