//! Error types
//!
//! Each pipeline stage has its own error enum; [`ConvertError`] wraps them
//! for callers of the high-level converter.

use std::fmt;
use thiserror::Error;

use crate::i18n::{Language, Message};

/// Failures while opening or reading a template container.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read template: {0}")]
    Io(#[from] std::io::Error),

    #[error("template is not a valid zip container: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("styles.xml not found in template")]
    MissingStyles,

    #[error("malformed XML in {part}: {message}")]
    Xml { part: &'static str, message: String },
}

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("fallback style '{0}' is not defined by the template")]
    MissingFallback(String),
}

/// Reasons raw Markdown is refused before any parsing happens.
///
/// `Display` is the English text; [`SecurityError::localized`] renders the
/// same message in another language.
#[derive(Debug, PartialEq, Eq)]
pub enum SecurityError {
    EmptyInput,
    TooLarge { size: usize, limit: usize },
    TooManyImages { count: usize, limit: usize },
    TooManyTables { count: usize, limit: usize },
}

impl SecurityError {
    fn message(&self) -> Message<'static> {
        match *self {
            SecurityError::EmptyInput => Message::EmptyInput,
            SecurityError::TooLarge { size, limit } => Message::TooLarge { size, limit },
            SecurityError::TooManyImages { count, limit } => Message::TooManyImages { count, limit },
            SecurityError::TooManyTables { count, limit } => Message::TooManyTables { count, limit },
        }
    }

    pub fn localized(&self, language: Language) -> String {
        language.text(&self.message()).into_owned()
    }
}

impl fmt::Display for SecurityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Language::En.text(&self.message()))
    }
}

impl std::error::Error for SecurityError {}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server answered {0}")]
    Status(u16),

    #[error("malformed data URL")]
    InvalidDataUrl,

    #[error("unsupported URL scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
}

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("failed to serialize document: {0}")]
    Pack(String),

    #[error("failed to rewrite container: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("failed to rewrite container: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("upload failed: {0}")]
    Rejected(String),
}

/// Top-level error returned by [`crate::Converter`].
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Security(#[from] SecurityError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Style(#[from] StyleError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("failed to set up image fetching: {0}")]
    Image(#[from] ImageError),

    #[error("Upload failed: No access URL in result")]
    MissingAccessUrl,
}

impl ConvertError {
    /// Message for the user in `language`; internal failures stay English
    pub fn localized(&self, language: Language) -> String {
        match self {
            ConvertError::Security(e) => e.localized(language),
            ConvertError::MissingAccessUrl => language.text(&Message::MissingAccessUrl).into_owned(),
            other => other.to_string(),
        }
    }
}
