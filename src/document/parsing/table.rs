//! Table processing
//!
//! The header row and every body row become one row of styled cells. Cell
//! content is flattened to runs; images inside cells stay literal text.

use pulldown_cmark::{Event, Tag};

use super::super::models::*;
use super::formatting::{collect_inline, runs_only};
use super::{Context, block_end};
use crate::error::StyleError;

pub(crate) fn walk(
    cx: &mut Context<'_>,
    events: &[Event<'_>],
    start: usize,
) -> Result<usize, StyleError> {
    let close = block_end(events, start);
    let mut rows: TableRows = Vec::new();
    let mut i = start + 1;

    while i < close {
        match &events[i] {
            Event::Start(Tag::TableHead) | Event::Start(Tag::TableRow) => {
                let row_end = block_end(events, i);
                let row = walk_row(cx, events, i + 1, row_end, rows.is_empty())?;
                rows.push(row);
                i = row_end + 1;
            }
            _ => i += 1,
        }
    }

    if !rows.is_empty() {
        cx.push(DocumentElement::Table { rows });
    }
    Ok(close + 1)
}

fn walk_row(
    cx: &mut Context<'_>,
    events: &[Event<'_>],
    start: usize,
    end: usize,
    is_header: bool,
) -> Result<Vec<StyledParagraph>, StyleError> {
    let style = cx.mapper.table_cell_style(is_header)?;
    let base = TextFormatting::from_style(&style);
    let mut cells = Vec::new();
    let mut i = start;

    while i < end {
        if matches!(events[i], Event::Start(Tag::TableCell)) {
            let cell_end = block_end(events, i);
            let (pieces, _) = collect_inline(events, i + 1, &base);
            cells.push(StyledParagraph {
                style: style.clone(),
                runs: FormattedRun::consolidate_runs(runs_only(pieces, &base)),
            });
            i = cell_end + 1;
        } else {
            i += 1;
        }
    }

    Ok(cells)
}
