//! Markdown event walkers
//!
//! This module turns the flat pulldown-cmark event list into styled
//! elements. Each block walker takes the index of its opening event and
//! returns the index just past its closing event.

pub(crate) mod code;
pub(crate) mod formatting;
pub(crate) mod heading;
pub(crate) mod list;
pub(crate) mod table;

use log::{debug, warn};
use pulldown_cmark::{Event, Tag};

use super::models::*;
use crate::error::StyleError;
use crate::i18n::{Language, Message};
use crate::security::SecurityFilter;
use crate::template::{StyleMapper, StyleRef};
use formatting::{Inline, collect_inline};

pub(crate) const ERROR_COLOR: &str = "FF0000";
pub(crate) const WARNING_COLOR: &str = "666666";

/// One position in the output: a finished element or an image to fetch
#[derive(Debug)]
pub(crate) enum Slot {
    Ready(DocumentElement),
    PendingImage { url: String, alt: String },
}

pub(crate) struct Context<'c> {
    pub mapper: &'c StyleMapper,
    pub filter: &'c SecurityFilter,
    pub language: Language,
    pub slots: Vec<Slot>,
    quote_depth: usize,
}

impl<'c> Context<'c> {
    pub fn new(mapper: &'c StyleMapper, filter: &'c SecurityFilter, language: Language) -> Self {
        Context {
            mapper,
            filter,
            language,
            slots: Vec::new(),
            quote_depth: 0,
        }
    }

    pub fn push(&mut self, element: DocumentElement) {
        self.slots.push(Slot::Ready(element));
    }

    /// Queue an image, or its placeholder when the URL is refused
    pub fn push_image(&mut self, url: String, alt: String) -> Result<(), StyleError> {
        if self.filter.validate_image_url(&url) {
            self.slots.push(Slot::PendingImage { url, alt });
        } else {
            warn!("Image URL failed validation, skipping: {url}");
            let notice = placeholder(
                self.mapper,
                self.language,
                &Message::ImageBlocked,
                ERROR_COLOR,
            )?;
            self.push(notice);
        }
        Ok(())
    }
}

/// Italic colored `[message]` notice in the paragraph style
pub(crate) fn placeholder(
    mapper: &StyleMapper,
    language: Language,
    message: &Message<'_>,
    color: &str,
) -> Result<DocumentElement, StyleError> {
    let style = mapper.paragraph_style()?;
    let formatting = TextFormatting::from_style(&style).italic().color(color);
    let text = format!("[{}]", language.text(message));
    Ok(DocumentElement::Paragraph(StyledParagraph {
        style,
        runs: vec![FormattedRun::new(text, formatting)],
    }))
}

/// Index of the event closing the container opened at `start`
pub(crate) fn block_end(events: &[Event<'_>], start: usize) -> usize {
    let mut depth = 0usize;
    for (i, event) in events.iter().enumerate().skip(start) {
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
        if depth == 0 {
            return i;
        }
    }
    events.len().saturating_sub(1)
}

/// Walk the block-level events in `[start, end)`
pub(crate) fn walk_blocks(
    cx: &mut Context<'_>,
    events: &[Event<'_>],
    start: usize,
    end: usize,
) -> Result<(), StyleError> {
    let mut i = start;

    while i < end {
        i = match &events[i] {
            Event::Start(Tag::Heading { level, .. }) => {
                heading::walk(cx, events, i, *level as u8)?
            }
            Event::Start(Tag::Paragraph) => walk_paragraph(cx, events, i)?,
            Event::Start(Tag::List(first)) => list::walk(cx, events, i, first.is_some(), 0)?,
            Event::Start(Tag::Table(_)) => table::walk(cx, events, i)?,
            Event::Start(Tag::CodeBlock(_)) => code::walk(cx, events, i)?,
            Event::Start(Tag::BlockQuote(_)) => {
                let close = block_end(events, i);
                cx.quote_depth += 1;
                walk_blocks(cx, events, i + 1, close)?;
                cx.quote_depth -= 1;
                close + 1
            }
            Event::Start(Tag::HtmlBlock) => walk_html_block(cx, events, i)?,
            Event::Start(_) => {
                debug!("Skipping unsupported block {:?}", events[i]);
                block_end(events, i) + 1
            }
            // Loose inline content outside a paragraph
            Event::Text(_) | Event::Code(_) | Event::Html(_) | Event::InlineHtml(_) => {
                let style = cx.mapper.paragraph_style()?;
                let base = TextFormatting::from_style(&style);
                let (pieces, next) = collect_inline(events, i, &base);
                emit_paragraph(cx, style, pieces)?;
                next.max(i + 1)
            }
            _ => i + 1,
        };
    }

    Ok(())
}

fn walk_paragraph(
    cx: &mut Context<'_>,
    events: &[Event<'_>],
    start: usize,
) -> Result<usize, StyleError> {
    let style = if cx.quote_depth > 0 {
        cx.mapper.blockquote_style()?
    } else {
        cx.mapper.paragraph_style()?
    };

    let (pieces, _) = collect_inline(events, start + 1, &TextFormatting::from_style(&style));
    emit_paragraph(cx, style, pieces)?;
    Ok(block_end(events, start) + 1)
}

/// Paragraph text first, then the images it referenced
fn emit_paragraph(
    cx: &mut Context<'_>,
    style: StyleRef,
    pieces: Vec<Inline>,
) -> Result<(), StyleError> {
    let mut runs = Vec::new();
    let mut images = Vec::new();

    for piece in pieces {
        match piece {
            Inline::Run(run) => runs.push(run),
            Inline::Image { url, alt } => images.push((url, alt)),
        }
    }

    if FormattedRun::has_text(&runs) {
        cx.push(DocumentElement::Paragraph(StyledParagraph {
            style,
            runs: FormattedRun::consolidate_runs(runs),
        }));
    }

    for (url, alt) in images {
        cx.push_image(url, alt)?;
    }
    Ok(())
}

/// Raw HTML blocks are kept as literal paragraph text
fn walk_html_block(
    cx: &mut Context<'_>,
    events: &[Event<'_>],
    start: usize,
) -> Result<usize, StyleError> {
    let close = block_end(events, start);
    let text: String = events[start + 1..close]
        .iter()
        .filter_map(|event| match event {
            Event::Html(html) | Event::Text(html) => Some(html.as_ref()),
            _ => None,
        })
        .collect();

    let text = text.trim();
    if !text.is_empty() {
        let style = cx.mapper.paragraph_style()?;
        let formatting = TextFormatting::from_style(&style);
        cx.push(DocumentElement::Paragraph(StyledParagraph {
            style,
            runs: vec![FormattedRun::new(text.replace('\n', " "), formatting)],
        }));
    }

    Ok(close + 1)
}
