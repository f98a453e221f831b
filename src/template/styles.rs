//! Style and page geometry extraction
//!
//! This module walks `word/styles.xml` and `word/document.xml` with a
//! streaming XML reader and turns the properties markdocx cares about into
//! [`StyleDefinition`] and [`PageSettings`] values. Every property is taken
//! from the first element inside the style that carries it; a missing or
//! unparsable attribute leaves the field unset.

use log::debug;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::TemplateError;

/// Shared handle to a style definition
pub type StyleRef = Arc<StyleDefinition>;

/// Twips per character unit used for indentation
pub const TWIPS_PER_CHAR: f32 = 420.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKind {
    Paragraph,
    Character,
    Table,
}

impl StyleKind {
    fn from_attr(value: &str) -> Option<Self> {
        match value {
            "paragraph" => Some(StyleKind::Paragraph),
            "character" => Some(StyleKind::Character),
            "table" => Some(StyleKind::Table),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleAlignment {
    Left,
    Center,
    Right,
    Justify,
    Distribute,
}

impl StyleAlignment {
    fn from_attr(value: &str) -> Option<Self> {
        match value {
            "left" | "start" => Some(StyleAlignment::Left),
            "center" => Some(StyleAlignment::Center),
            "right" | "end" => Some(StyleAlignment::Right),
            "both" => Some(StyleAlignment::Justify),
            "distribute" => Some(StyleAlignment::Distribute),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleFont {
    pub east_asia: Option<String>,
    pub ascii: Option<String>,
}

/// Paragraph spacing in points, line spacing as a multiple of single spacing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleSpacing {
    pub before: Option<f32>,
    pub after: Option<f32>,
    pub line: Option<f32>,
}

/// Indentation in character units
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleIndent {
    pub first_line: Option<i32>,
    pub left: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDefinition {
    pub id: String,
    /// Identifier written into `w:pStyle` when it differs from `id`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    pub name: String,
    pub kind: StyleKind,
    pub font: Option<StyleFont>,
    /// Font size in points
    pub font_size: Option<f32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    /// Hex color without the leading '#'
    pub color: Option<String>,
    pub alignment: Option<StyleAlignment>,
    pub spacing: Option<StyleSpacing>,
    pub indent: Option<StyleIndent>,
}

impl StyleDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: StyleKind) -> Self {
        StyleDefinition {
            id: id.into(),
            reference_id: None,
            name: name.into(),
            kind,
            font: None,
            font_size: None,
            bold: None,
            italic: None,
            color: None,
            alignment: None,
            spacing: None,
            indent: None,
        }
    }

    /// The identifier documents should reference this style by
    pub fn reference(&self) -> &str {
        self.reference_id.as_deref().unwrap_or(&self.id)
    }

    /// Preferred font family: east-Asian name, then Latin name
    pub fn font_family(&self) -> Option<&str> {
        let font = self.font.as_ref()?;
        font.east_asia.as_deref().or(font.ascii.as_deref())
    }
}

/// Page geometry in whole millimetres
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSettings {
    pub width: u32,
    pub height: u32,
    pub margin_top: u32,
    pub margin_right: u32,
    pub margin_bottom: u32,
    pub margin_left: u32,
}

pub(crate) fn twips_to_mm(twips: u32) -> u32 {
    (twips as f64 / 1440.0 * 25.4).round() as u32
}

fn attr(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn attr_u32(element: &BytesStart<'_>, key: &[u8]) -> Option<u32> {
    attr(element, key).and_then(|v| v.trim().parse().ok())
}

/// `w:b`/`w:i` style toggles: present means on unless the value says otherwise
fn toggle(element: &BytesStart<'_>) -> bool {
    match attr(element, b"w:val") {
        Some(v) => v != "0" && !v.eq_ignore_ascii_case("false"),
        None => true,
    }
}

/// Accumulates one `w:style` block
struct StyleBuilder {
    style: StyleDefinition,
    seen_name: bool,
    seen_fonts: bool,
    sz: Option<u32>,
    sz_cs: Option<u32>,
    seen_bold: bool,
    seen_italic: bool,
    seen_color: bool,
    seen_jc: bool,
    before: Option<u32>,
    after: Option<u32>,
    seen_line: bool,
    line: Option<u32>,
    first_line: Option<u32>,
    seen_left: bool,
    left: Option<u32>,
}

impl StyleBuilder {
    fn new(id: String, kind: StyleKind) -> Self {
        let name = format!("Style {id}");
        StyleBuilder {
            style: StyleDefinition::new(id, name, kind),
            seen_name: false,
            seen_fonts: false,
            sz: None,
            sz_cs: None,
            seen_bold: false,
            seen_italic: false,
            seen_color: false,
            seen_jc: false,
            before: None,
            after: None,
            seen_line: false,
            line: None,
            first_line: None,
            seen_left: false,
            left: None,
        }
    }

    fn visit(&mut self, e: &BytesStart<'_>) {
        match e.name().as_ref() {
            b"w:name" if !self.seen_name => {
                if let Some(name) = attr(e, b"w:val") {
                    self.style.name = name;
                    self.seen_name = true;
                }
            }
            b"w:rFonts" if !self.seen_fonts => {
                self.seen_fonts = true;
                let east_asia = attr(e, b"w:eastAsia");
                let ascii = attr(e, b"w:ascii");
                if east_asia.is_some() || ascii.is_some() {
                    self.style.font = Some(StyleFont { east_asia, ascii });
                }
            }
            b"w:sz" if self.sz.is_none() => self.sz = attr_u32(e, b"w:val"),
            b"w:szCs" if self.sz_cs.is_none() => self.sz_cs = attr_u32(e, b"w:val"),
            b"w:b" if !self.seen_bold => {
                self.seen_bold = true;
                self.style.bold = Some(toggle(e));
            }
            b"w:i" if !self.seen_italic => {
                self.seen_italic = true;
                self.style.italic = Some(toggle(e));
            }
            b"w:color" if !self.seen_color => {
                if let Some(color) = attr(e, b"w:val") {
                    self.seen_color = true;
                    if !color.is_empty() && color != "auto" {
                        self.style.color = Some(color);
                    }
                }
            }
            b"w:jc" if !self.seen_jc => {
                if let Some(value) = attr(e, b"w:val") {
                    self.seen_jc = true;
                    self.style.alignment = StyleAlignment::from_attr(&value);
                }
            }
            b"w:spacing" => {
                if self.before.is_none() {
                    self.before = attr_u32(e, b"w:before");
                }
                if self.after.is_none() {
                    self.after = attr_u32(e, b"w:after");
                }
                if !self.seen_line {
                    if let (Some(line), Some(rule)) =
                        (attr_u32(e, b"w:line"), attr(e, b"w:lineRule"))
                    {
                        self.seen_line = true;
                        if rule == "auto" {
                            self.line = Some(line);
                        }
                    }
                }
            }
            b"w:ind" => {
                if self.first_line.is_none() {
                    self.first_line = attr_u32(e, b"w:firstLine");
                }
                if !self.seen_left {
                    if let Some(left) = attr_u32(e, b"w:left") {
                        self.seen_left = true;
                        if left != 0 {
                            self.left = Some(left);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> StyleDefinition {
        if let Some(half_points) = self.sz.or(self.sz_cs) {
            self.style.font_size = Some(half_points as f32 / 2.0);
        }

        if self.before.is_some() || self.after.is_some() || self.line.is_some() {
            self.style.spacing = Some(StyleSpacing {
                before: self.before.map(|v| v as f32 / 20.0),
                after: self.after.map(|v| v as f32 / 20.0),
                line: self.line.map(|v| v as f32 / 240.0),
            });
        }

        if self.first_line.is_some() || self.left.is_some() {
            let chars = |twips: u32| (twips as f32 / TWIPS_PER_CHAR).round() as i32;
            self.style.indent = Some(StyleIndent {
                first_line: self.first_line.map(chars),
                left: self.left.map(chars),
            });
        }

        self.style
    }
}

/// Extract every paragraph, character and table style from `styles.xml`,
/// in document order.
pub(crate) fn parse_styles(xml: &[u8]) -> Result<Vec<StyleDefinition>, TemplateError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut styles = Vec::new();
    let mut current: Option<StyleBuilder> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"w:style" => {
                let kind = attr(e, b"w:type").and_then(|t| StyleKind::from_attr(&t));
                current = match kind {
                    Some(kind) => {
                        let id = attr(e, b"w:styleId").unwrap_or_else(|| "unknown".to_string());
                        Some(StyleBuilder::new(id, kind))
                    }
                    None => None,
                };
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"w:style" => {
                if let Some(builder) = current.take() {
                    styles.push(builder.finish());
                }
            }
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if let Some(builder) = current.as_mut() {
                    builder.visit(e);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(TemplateError::Xml {
                    part: "word/styles.xml",
                    message: e.to_string(),
                });
            }
            _ => {}
        }
        buf.clear();
    }

    debug!("Parsed {} styles from styles.xml", styles.len());
    Ok(styles)
}

/// Read page size and margins from `document.xml`.
///
/// Returns `None` unless both a complete `w:pgSz` and a complete `w:pgMar`
/// are present. Malformed XML also yields `None`.
pub(crate) fn parse_page_settings(xml: &[u8]) -> Option<PageSettings> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut size: Option<(u32, u32)> = None;
    let mut margins: Option<(u32, u32, u32, u32)> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"w:pgSz" if size.is_none() => {
                    if let (Some(w), Some(h)) = (attr_u32(e, b"w:w"), attr_u32(e, b"w:h")) {
                        size = Some((w, h));
                    }
                }
                b"w:pgMar" if margins.is_none() => {
                    if let (Some(top), Some(right), Some(bottom), Some(left)) = (
                        attr_u32(e, b"w:top"),
                        attr_u32(e, b"w:right"),
                        attr_u32(e, b"w:bottom"),
                        attr_u32(e, b"w:left"),
                    ) {
                        margins = Some((top, right, bottom, left));
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!("Stopped reading page settings: {e}");
                break;
            }
            _ => {}
        }
        if size.is_some() && margins.is_some() {
            break;
        }
        buf.clear();
    }

    let (width, height) = size?;
    let (top, right, bottom, left) = margins?;
    Some(PageSettings {
        width: twips_to_mm(width),
        height: twips_to_mm(height),
        margin_top: twips_to_mm(top),
        margin_right: twips_to_mm(right),
        margin_bottom: twips_to_mm(bottom),
        margin_left: twips_to_mm(left),
    })
}
