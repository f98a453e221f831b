//! Inline text and formatting extraction
//!
//! This module collects the inline events of a block into formatted runs
//! and image references, and scans literal text for leftover emphasis
//! markers the Markdown parser did not consume.

use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Tag, TagEnd};
use regex::Regex;

use super::super::models::*;

/// `**bold**`, `*italic*`, link-shaped text, or a run of anything else
static INLINE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\*\*.+?\*\*|\*.+?\*|\[.+?\]\(.+?\)|[^*\[\]]+)").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Inline {
    Run(FormattedRun),
    Image { url: String, alt: String },
}

/// Split literal text into runs, stripping `*`/`**` markers.
///
/// Link-shaped text is kept verbatim; stray `*`, `[` and `]` are dropped.
pub(crate) fn scan_inline(text: &str, base: &TextFormatting) -> Vec<FormattedRun> {
    let mut runs = Vec::new();

    for found in INLINE_PATTERN.find_iter(text) {
        let part = found.as_str();
        if part.len() >= 4 && part.starts_with("**") && part.ends_with("**") {
            runs.push(FormattedRun::new(&part[2..part.len() - 2], base.clone().bold()));
        } else if part.len() >= 2 && part.starts_with('*') && part.ends_with('*') {
            runs.push(FormattedRun::new(&part[1..part.len() - 1], base.clone().italic()));
        } else if !part.is_empty() {
            runs.push(FormattedRun::new(part, base.clone()));
        }
    }

    runs
}

fn is_inline(event: &Event<'_>) -> bool {
    match event {
        Event::Text(_)
        | Event::Code(_)
        | Event::Html(_)
        | Event::InlineHtml(_)
        | Event::SoftBreak
        | Event::HardBreak
        | Event::FootnoteReference(_)
        | Event::TaskListMarker(_)
        | Event::InlineMath(_)
        | Event::DisplayMath(_) => true,
        Event::Start(tag) => matches!(
            tag,
            Tag::Emphasis
                | Tag::Strong
                | Tag::Strikethrough
                | Tag::Link { .. }
                | Tag::Image { .. }
        ),
        Event::End(tag) => matches!(
            tag,
            TagEnd::Emphasis
                | TagEnd::Strong
                | TagEnd::Strikethrough
                | TagEnd::Link
                | TagEnd::Image
        ),
        _ => false,
    }
}

/// Plain text of the events in `[start, ..)` up to the end of the current
/// link or image, and the index of that end event
fn collect_label(events: &[Event<'_>], start: usize) -> (String, usize) {
    let mut label = String::new();
    let mut depth = 0usize;
    let mut i = start;

    while i < events.len() {
        match &events[i] {
            Event::Text(text) | Event::Code(text) => label.push_str(text),
            Event::SoftBreak | Event::HardBreak => label.push(' '),
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => return (label, i),
            Event::End(_) => depth -= 1,
            _ => {}
        }
        i += 1;
    }

    (label, i)
}

struct RunBuilder<'b> {
    base: &'b TextFormatting,
    bold: usize,
    italic: usize,
    pending: String,
    pieces: Vec<Inline>,
}

impl RunBuilder<'_> {
    fn formatting(&self) -> TextFormatting {
        let mut formatting = self.base.clone();
        if self.bold > 0 {
            formatting.bold = true;
        }
        if self.italic > 0 {
            formatting.italic = true;
        }
        formatting
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.pending);
        let formatting = self.formatting();
        self.pieces
            .extend(scan_inline(&text, &formatting).into_iter().map(Inline::Run));
    }

    /// Append a run that must not be rescanned
    fn literal(&mut self, text: String) {
        self.flush();
        let formatting = self.formatting();
        self.pieces.push(Inline::Run(FormattedRun::new(text, formatting)));
    }
}

/// Collect inline events starting at `start` until the first block-level
/// event. Returns the pieces and the index of that event.
pub(crate) fn collect_inline(
    events: &[Event<'_>],
    start: usize,
    base: &TextFormatting,
) -> (Vec<Inline>, usize) {
    let mut builder = RunBuilder {
        base,
        bold: 0,
        italic: 0,
        pending: String::new(),
        pieces: Vec::new(),
    };
    let mut i = start;

    while i < events.len() && is_inline(&events[i]) {
        match &events[i] {
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                builder.pending.push_str(text)
            }
            Event::InlineMath(text) | Event::DisplayMath(text) => builder.pending.push_str(text),
            Event::Code(code) => builder.literal(code.to_string()),
            Event::SoftBreak | Event::HardBreak => builder.pending.push(' '),
            Event::Start(Tag::Strong) => {
                builder.flush();
                builder.bold += 1;
            }
            Event::End(TagEnd::Strong) => {
                builder.flush();
                builder.bold = builder.bold.saturating_sub(1);
            }
            Event::Start(Tag::Emphasis) => {
                builder.flush();
                builder.italic += 1;
            }
            Event::End(TagEnd::Emphasis) => {
                builder.flush();
                builder.italic = builder.italic.saturating_sub(1);
            }
            Event::Start(Tag::Link { dest_url, .. }) => {
                let (label, close) = collect_label(events, i + 1);
                builder.literal(format!("[{label}]({dest_url})"));
                i = close;
            }
            Event::Start(Tag::Image { dest_url, .. }) => {
                let (alt, close) = collect_label(events, i + 1);
                builder.flush();
                builder.pieces.push(Inline::Image {
                    url: dest_url.to_string(),
                    alt,
                });
                i = close;
            }
            _ => {}
        }
        i += 1;
    }

    builder.flush();
    (builder.pieces, i)
}

/// Flatten pieces into runs, writing images back as literal Markdown
pub(crate) fn runs_only(pieces: Vec<Inline>, base: &TextFormatting) -> Vec<FormattedRun> {
    pieces
        .into_iter()
        .map(|piece| match piece {
            Inline::Run(run) => run,
            Inline::Image { url, alt } => {
                FormattedRun::new(format!("![{alt}]({url})"), base.clone())
            }
        })
        .collect()
}
