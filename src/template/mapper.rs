//! Semantic style resolution
//!
//! This module maps Markdown element kinds onto the styles a template
//! defines. The mapping is computed once per template; any element kind the
//! template has no style for resolves to a single fallback style.

use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::reader::TemplateReader;
use super::styles::StyleRef;
use crate::error::StyleError;

/// Markdown element kinds that receive a template style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementType {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Paragraph,
    ListBullet,
    ListOrdered,
    TableHeader,
    TableCell,
    Code,
    Blockquote,
}

impl ElementType {
    pub const ALL: [ElementType; 13] = [
        ElementType::H1,
        ElementType::H2,
        ElementType::H3,
        ElementType::H4,
        ElementType::H5,
        ElementType::H6,
        ElementType::Paragraph,
        ElementType::ListBullet,
        ElementType::ListOrdered,
        ElementType::TableHeader,
        ElementType::TableCell,
        ElementType::Code,
        ElementType::Blockquote,
    ];

    /// Style ids and names tried in order; each is looked up by id, then by name
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            ElementType::H1 => &["34", "Title"],
            ElementType::H2 => &["2", "heading 1"],
            ElementType::H3 => &["3", "heading 2"],
            ElementType::H4 => &["5", "heading 4"],
            ElementType::H5 => &["6", "heading 5"],
            ElementType::H6 => &["7", "heading 6"],
            ElementType::Paragraph => &["1", "Normal", "40", "正文无缩进"],
            ElementType::ListBullet => &["14", "List Bullet", "27", "List"],
            ElementType::ListOrdered => &["13", "List Number", "11", "List Number 2"],
            ElementType::TableHeader => &["41", "表格表头", "1", "Normal"],
            ElementType::TableCell => &["42", "表格内容", "1", "Normal"],
            ElementType::Code => &["HTMLPreformatted", "1", "Normal"],
            ElementType::Blockquote => &["Quote", "1", "Normal"],
        }
    }

    pub fn heading(level: u8) -> Self {
        match level {
            0 | 1 => ElementType::H1,
            2 => ElementType::H2,
            3 => ElementType::H3,
            4 => ElementType::H4,
            5 => ElementType::H5,
            _ => ElementType::H6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ElementType::H1 => "h1",
            ElementType::H2 => "h2",
            ElementType::H3 => "h3",
            ElementType::H4 => "h4",
            ElementType::H5 => "h5",
            ElementType::H6 => "h6",
            ElementType::Paragraph => "paragraph",
            ElementType::ListBullet => "list-bullet",
            ElementType::ListOrdered => "list-ordered",
            ElementType::TableHeader => "table-header",
            ElementType::TableCell => "table-cell",
            ElementType::Code => "code",
            ElementType::Blockquote => "blockquote",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MapperOptions {
    /// Style id used for unmapped elements; `None` tries "1" then "Normal"
    pub fallback_style: Option<String>,
    pub log_mappings: bool,
}

/// Outcome of [`StyleMapper::validate_mappings`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingReport {
    pub is_valid: bool,
    pub missing: Vec<ElementType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappedStyle {
    pub id: String,
    pub name: String,
    /// False when the element resolves to the fallback style
    pub native: bool,
}

#[derive(Debug)]
pub struct StyleMapper {
    reader: Arc<TemplateReader>,
    mappings: BTreeMap<ElementType, Option<StyleRef>>,
    fallback: Result<StyleRef, String>,
    log_mappings: bool,
}

impl StyleMapper {
    pub fn new(reader: Arc<TemplateReader>, options: MapperOptions) -> Self {
        let mut mappings = BTreeMap::new();
        for element in ElementType::ALL {
            let style = find_best_match(&reader, element.candidates());
            if options.log_mappings {
                match &style {
                    Some(style) => debug!(
                        "Mapped {element} to '{}' (id {})",
                        style.name,
                        style.reference()
                    ),
                    None => warn!("No template style for {element}, using fallback"),
                }
            }
            mappings.insert(element, style);
        }

        let fallback = match &options.fallback_style {
            Some(id) => reader.get_style(id).ok_or_else(|| id.clone()),
            None => find_best_match(&reader, &["1", "Normal"]).ok_or_else(|| "1".to_string()),
        };

        StyleMapper {
            reader,
            mappings,
            fallback,
            log_mappings: options.log_mappings,
        }
    }

    /// Resolve the style for an element kind, using the fallback when unmapped
    pub fn style_for_element(&self, element: ElementType) -> Result<StyleRef, StyleError> {
        if let Some(Some(style)) = self.mappings.get(&element) {
            return Ok(Arc::clone(style));
        }

        let fallback = self.fallback_style()?;
        if self.log_mappings {
            debug!("Using fallback style '{}' for {element}", fallback.name);
        }
        Ok(fallback)
    }

    pub fn fallback_style(&self) -> Result<StyleRef, StyleError> {
        match &self.fallback {
            Ok(style) => Ok(Arc::clone(style)),
            Err(id) => Err(StyleError::MissingFallback(id.clone())),
        }
    }

    /// Heading levels above 6 use the level-6 style; level 0 is treated as 1
    pub fn heading_style(&self, level: u8) -> Result<StyleRef, StyleError> {
        self.style_for_element(ElementType::heading(level))
    }

    pub fn paragraph_style(&self) -> Result<StyleRef, StyleError> {
        self.style_for_element(ElementType::Paragraph)
    }

    pub fn list_style(&self, ordered: bool) -> Result<StyleRef, StyleError> {
        self.style_for_element(if ordered {
            ElementType::ListOrdered
        } else {
            ElementType::ListBullet
        })
    }

    pub fn table_cell_style(&self, is_header: bool) -> Result<StyleRef, StyleError> {
        self.style_for_element(if is_header {
            ElementType::TableHeader
        } else {
            ElementType::TableCell
        })
    }

    pub fn code_style(&self) -> Result<StyleRef, StyleError> {
        self.style_for_element(ElementType::Code)
    }

    pub fn blockquote_style(&self) -> Result<StyleRef, StyleError> {
        self.style_for_element(ElementType::Blockquote)
    }

    /// Whether the template has a native style for this element kind
    pub fn has_style(&self, element: ElementType) -> bool {
        matches!(self.mappings.get(&element), Some(Some(_)))
    }

    pub fn validate_mappings(&self) -> MappingReport {
        let missing: Vec<ElementType> = ElementType::ALL
            .into_iter()
            .filter(|element| !self.has_style(*element))
            .collect();

        MappingReport {
            is_valid: missing.is_empty(),
            missing,
        }
    }

    /// Element kind to resolved style; elements without any style are omitted
    pub fn mapping_summary(&self) -> BTreeMap<ElementType, MappedStyle> {
        ElementType::ALL
            .into_iter()
            .filter_map(|element| {
                let native = self.has_style(element);
                let style = self.style_for_element(element).ok()?;
                Some((
                    element,
                    MappedStyle {
                        id: style.reference().to_string(),
                        name: style.name.clone(),
                        native,
                    },
                ))
            })
            .collect()
    }

    pub fn reader(&self) -> &Arc<TemplateReader> {
        &self.reader
    }
}

fn find_best_match(reader: &TemplateReader, candidates: &[&str]) -> Option<StyleRef> {
    candidates.iter().find_map(|candidate| {
        reader
            .get_style(candidate)
            .or_else(|| reader.get_style_by_name(candidate))
    })
}
