//! Heading processing
//!
//! Headings keep their images in place: text before an image becomes one
//! heading element, the image follows, and the remaining text starts a new
//! heading element at the same level.

use pulldown_cmark::Event;

use super::super::models::*;
use super::formatting::{Inline, collect_inline};
use super::{Context, block_end};
use crate::error::StyleError;

pub(crate) fn walk(
    cx: &mut Context<'_>,
    events: &[Event<'_>],
    start: usize,
    level: u8,
) -> Result<usize, StyleError> {
    let style = cx.mapper.heading_style(level)?;
    let (pieces, _) = collect_inline(events, start + 1, &TextFormatting::from_style(&style));

    let mut runs = Vec::new();
    for piece in pieces {
        match piece {
            Inline::Run(run) => runs.push(run),
            Inline::Image { url, alt } => {
                flush(cx, level, &style, &mut runs);
                cx.push_image(url, alt)?;
            }
        }
    }
    flush(cx, level, &style, &mut runs);

    Ok(block_end(events, start) + 1)
}

fn flush(
    cx: &mut Context<'_>,
    level: u8,
    style: &crate::template::StyleRef,
    runs: &mut Vec<FormattedRun>,
) {
    let runs = std::mem::take(runs);
    if FormattedRun::has_text(&runs) {
        cx.push(DocumentElement::Heading {
            level,
            style: style.clone(),
            runs: FormattedRun::consolidate_runs(runs),
        });
    }
}
