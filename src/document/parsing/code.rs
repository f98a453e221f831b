//! Code block processing

use pulldown_cmark::Event;

use super::super::models::*;
use super::{Context, block_end};
use crate::error::StyleError;

/// Emit one `CodeLine` per line of the fenced or indented block at `start`
pub(crate) fn walk(
    cx: &mut Context<'_>,
    events: &[Event<'_>],
    start: usize,
) -> Result<usize, StyleError> {
    let close = block_end(events, start);
    let mut source = String::new();
    for event in &events[start + 1..close] {
        if let Event::Text(text) = event {
            source.push_str(text);
        }
    }

    let source = source.strip_suffix('\n').unwrap_or(&source);
    if source.is_empty() {
        return Ok(close + 1);
    }

    let style = cx.mapper.code_style()?;
    let lines: Vec<&str> = source.split('\n').collect();
    let last = lines.len() - 1;

    for (index, line) in lines.into_iter().enumerate() {
        cx.push(DocumentElement::CodeLine {
            text: line.trim_end_matches('\r').to_string(),
            is_first: index == 0,
            is_last: index == last,
            style: style.clone(),
        });
    }

    Ok(close + 1)
}
