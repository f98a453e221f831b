//! Template reading and style mapping
//!
//! This module extracts style definitions and page geometry from `.docx`
//! templates and resolves Markdown element kinds to those styles.

pub(crate) mod builtin;
pub mod cache;
pub mod mapper;
pub mod reader;
pub mod styles;

pub use cache::TemplateCache;
pub use mapper::{ElementType, MapperOptions, MappingReport, MappedStyle, StyleMapper};
pub use reader::TemplateReader;
pub use styles::{
    PageSettings, StyleAlignment, StyleDefinition, StyleFont, StyleIndent, StyleKind, StyleRef,
    StyleSpacing, TWIPS_PER_CHAR,
};
