//! Markdown document building and data structures
//!
//! This module turns sanitized Markdown into an ordered list of styled
//! elements ready for assembly.

pub mod builder;
pub mod images;
pub mod models;
pub(crate) mod parsing;

pub use builder::MarkdownDocumentBuilder;
pub use images::{HttpImageFetcher, ImageFetcher, fit_within};
pub use models::*;
