//! Core data structures for document representation
//!
//! This module defines the styled element tree produced from Markdown and
//! consumed by the assembler: elements, runs and their formatting.

use serde::Serialize;

use crate::template::{StyleDefinition, StyleRef};

pub type TableRows = Vec<Vec<StyledParagraph>>;

/// Ordered element list produced by one conversion
#[derive(Debug, Clone, Default)]
pub struct Document {
    elements: Vec<DocumentElement>,
}

impl Document {
    pub(crate) fn new(elements: Vec<DocumentElement>) -> Self {
        Document { elements }
    }

    pub fn elements(&self) -> &[DocumentElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct StyledParagraph {
    pub style: StyleRef,
    pub runs: Vec<FormattedRun>,
}

impl StyledParagraph {
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

#[derive(Debug, Clone)]
pub enum DocumentElement {
    Heading {
        level: u8,
        style: StyleRef,
        runs: Vec<FormattedRun>,
    },
    Paragraph(StyledParagraph),
    ListItem {
        ordered: bool,
        /// Nesting depth, 0 for top-level items
        level: u8,
        style: StyleRef,
        runs: Vec<FormattedRun>,
    },
    Table {
        rows: TableRows,
    },
    CodeLine {
        text: String,
        is_first: bool,
        is_last: bool,
        style: StyleRef,
    },
    Image {
        /// PNG-encoded image data
        data: Vec<u8>,
        /// Display size in pixels
        width: u32,
        height: u32,
    },
}

impl DocumentElement {
    /// Plain text of the element; empty for images
    pub fn text(&self) -> String {
        match self {
            DocumentElement::Heading { runs, .. } | DocumentElement::ListItem { runs, .. } => {
                runs.iter().map(|run| run.text.as_str()).collect()
            }
            DocumentElement::Paragraph(paragraph) => paragraph.text(),
            DocumentElement::Table { rows } => rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(StyledParagraph::text)
                        .collect::<Vec<_>>()
                        .join("\t")
                })
                .collect::<Vec<_>>()
                .join("\n"),
            DocumentElement::CodeLine { text, .. } => text.clone(),
            DocumentElement::Image { .. } => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TextFormatting {
    pub bold: bool,
    pub italic: bool,
    pub font: Option<String>,
    /// Size in points
    pub font_size: Option<f32>,
    pub color: Option<String>,
}

impl TextFormatting {
    /// Character formatting a style implies for its runs
    pub fn from_style(style: &StyleDefinition) -> Self {
        TextFormatting {
            bold: style.bold.unwrap_or(false),
            italic: style.italic.unwrap_or(false),
            font: style.font.as_ref().map(|_| {
                style
                    .font_family()
                    .unwrap_or("Times New Roman")
                    .to_string()
            }),
            font_size: style.font_size.filter(|size| *size > 0.0),
            color: style.color.clone(),
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FormattedRun {
    pub text: String,
    pub formatting: TextFormatting,
}

impl FormattedRun {
    pub fn new(text: impl Into<String>, formatting: TextFormatting) -> Self {
        FormattedRun {
            text: text.into(),
            formatting,
        }
    }

    /// Consolidate adjacent runs with identical formatting into single runs
    pub fn consolidate_runs(runs: Vec<FormattedRun>) -> Vec<FormattedRun> {
        let mut consolidated: Vec<FormattedRun> = Vec::with_capacity(runs.len());

        for run in runs {
            match consolidated.last_mut() {
                Some(current) if current.formatting == run.formatting => {
                    current.text.push_str(&run.text);
                }
                _ => consolidated.push(run),
            }
        }

        consolidated
    }

    /// Whether any run carries visible text
    pub fn has_text(runs: &[FormattedRun]) -> bool {
        runs.iter().any(|run| !run.text.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{StyleFont, StyleKind};

    #[test]
    fn test_consolidate_runs() {
        let plain = TextFormatting::default();
        let bold = TextFormatting::default().bold();
        let runs = vec![
            FormattedRun::new("a", plain.clone()),
            FormattedRun::new("b", plain.clone()),
            FormattedRun::new("c", bold.clone()),
            FormattedRun::new("d", plain.clone()),
        ];

        let merged = FormattedRun::consolidate_runs(runs);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].text, "ab");
        assert_eq!(merged[1].formatting, bold);
        assert!(FormattedRun::consolidate_runs(Vec::new()).is_empty());
    }

    #[test]
    fn test_formatting_from_style() {
        let mut style = StyleDefinition::new("1", "Normal", StyleKind::Paragraph);
        style.font = Some(StyleFont {
            east_asia: Some("SimSun".to_string()),
            ascii: Some("Arial".to_string()),
        });
        style.font_size = Some(10.5);
        style.bold = Some(true);

        let formatting = TextFormatting::from_style(&style).italic().color("FF0000");
        assert!(formatting.bold);
        assert!(formatting.italic);
        assert_eq!(formatting.font.as_deref(), Some("SimSun"));
        assert_eq!(formatting.font_size, Some(10.5));
        assert_eq!(formatting.color.as_deref(), Some("FF0000"));
    }

    #[test]
    fn test_formatting_without_font() {
        let style = StyleDefinition::new("1", "Normal", StyleKind::Paragraph);
        let formatting = TextFormatting::from_style(&style);
        assert_eq!(formatting, TextFormatting::default());
    }

    #[test]
    fn test_has_text() {
        let plain = TextFormatting::default();
        assert!(!FormattedRun::has_text(&[FormattedRun::new("  ", plain.clone())]));
        assert!(FormattedRun::has_text(&[FormattedRun::new(" x ", plain)]));
    }
}
