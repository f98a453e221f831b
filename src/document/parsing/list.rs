//! List processing
//!
//! Lists are flattened into one `ListItem` element per item, each carrying
//! its ordered flag and nesting level. An item's text is emitted before any
//! list nested inside it, so elements keep the order they appear in.

use pulldown_cmark::{Event, Tag, TagEnd};

use super::super::models::*;
use super::formatting::{Inline, collect_inline};
use super::{Context, block_end};
use crate::error::StyleError;
use crate::template::StyleRef;

/// Text and images gathered for the current item
struct ItemBuffer {
    runs: Vec<FormattedRun>,
    images: Vec<(String, String)>,
}

impl ItemBuffer {
    fn new() -> Self {
        ItemBuffer {
            runs: Vec::new(),
            images: Vec::new(),
        }
    }

    fn absorb(&mut self, pieces: Vec<Inline>, base: &TextFormatting) {
        // Separate the item's paragraphs with a space
        if FormattedRun::has_text(&self.runs) {
            self.runs.push(FormattedRun::new(" ", base.clone()));
        }
        for piece in pieces {
            match piece {
                Inline::Run(run) => self.runs.push(run),
                Inline::Image { url, alt } => self.images.push((url, alt)),
            }
        }
    }

    fn flush(
        &mut self,
        cx: &mut Context<'_>,
        ordered: bool,
        level: u8,
        style: &StyleRef,
    ) -> Result<(), StyleError> {
        let runs = std::mem::take(&mut self.runs);
        if FormattedRun::has_text(&runs) {
            cx.push(DocumentElement::ListItem {
                ordered,
                level,
                style: style.clone(),
                runs: FormattedRun::consolidate_runs(runs),
            });
        }
        for (url, alt) in std::mem::take(&mut self.images) {
            cx.push_image(url, alt)?;
        }
        Ok(())
    }
}

/// Walk the list opened at `start`, splicing nested lists in place
pub(crate) fn walk(
    cx: &mut Context<'_>,
    events: &[Event<'_>],
    start: usize,
    ordered: bool,
    level: u8,
) -> Result<usize, StyleError> {
    let close = block_end(events, start);
    let mut i = start + 1;

    while i < close {
        if matches!(events[i], Event::Start(Tag::Item)) {
            i = walk_item(cx, events, i, ordered, level)?;
        } else {
            i += 1;
        }
    }

    Ok(close + 1)
}

fn walk_item(
    cx: &mut Context<'_>,
    events: &[Event<'_>],
    start: usize,
    ordered: bool,
    level: u8,
) -> Result<usize, StyleError> {
    let style = cx.mapper.list_style(ordered)?;
    let base = TextFormatting::from_style(&style);
    let close = block_end(events, start);
    let mut buffer = ItemBuffer::new();
    let mut i = start + 1;

    while i < close {
        i = match &events[i] {
            Event::Start(Tag::Paragraph) => {
                let (pieces, _) = collect_inline(events, i + 1, &base);
                buffer.absorb(pieces, &base);
                block_end(events, i) + 1
            }
            Event::Start(Tag::List(first)) => {
                buffer.flush(cx, ordered, level, &style)?;
                walk(cx, events, i, first.is_some(), level.saturating_add(1))?
            }
            // Code blocks, quotes and tables inside items are not rendered
            Event::Start(_) if !is_inline_start(&events[i]) => block_end(events, i) + 1,
            Event::End(TagEnd::Item) => i + 1,
            _ => {
                // Tight lists put inline content directly inside the item
                let (pieces, next) = collect_inline(events, i, &base);
                buffer.absorb(pieces, &base);
                next.max(i + 1)
            }
        };
    }

    buffer.flush(cx, ordered, level, &style)?;
    Ok(close + 1)
}

fn is_inline_start(event: &Event<'_>) -> bool {
    matches!(
        event,
        Event::Start(
            Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link { .. } | Tag::Image { .. }
        )
    )
}
