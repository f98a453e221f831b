//! Element to docx-rs conversion
//!
//! Each styled element becomes one docx-rs block. Paragraph properties come
//! from the element's style; run properties from the run's formatting.

use docx_rs::*;
use log::debug;

use super::numbering;
use crate::document::{Document, DocumentElement, FormattedRun, StyledParagraph};
use crate::template::{
    PageSettings, StyleAlignment, StyleDefinition, StyleKind, TWIPS_PER_CHAR, TemplateReader,
};

/// Default space after each element kind, in twips
pub(crate) const PARAGRAPH_AFTER: u32 = 100;
pub(crate) const HEADING_AFTER: u32 = 200;
pub(crate) const LIST_ITEM_AFTER: u32 = 100;
pub(crate) const IMAGE_AFTER: u32 = 200;
pub(crate) const CODE_BLOCK_AFTER: u32 = 200;

const CODE_FONT_HALF_POINTS: usize = 20;
const CODE_TEXT_COLOR: &str = "333333";
const CODE_FILL: &str = "EEEEEE";
const EMU_PER_PIXEL: u32 = 9525;
const TWIPS_PER_MM: f64 = 56.69;
const FULL_WIDTH_PCT: usize = 5000;

fn mm_to_twips(mm: u32) -> u32 {
    (mm as f64 * TWIPS_PER_MM).round() as u32
}

/// Build the docx-rs document for `document`
pub(crate) fn render(document: &Document, reader: &TemplateReader) -> Docx {
    let mut docx = numbering::install(Docx::new());

    if let Some(page) = reader.page_settings() {
        docx = apply_page(docx, page);
    }

    // Without a template styles.xml to graft, the registry travels inline
    if reader.style_resource().is_none() {
        for style in reader.all_styles() {
            docx = docx.add_style(docx_style(style));
        }
    }

    for element in document.elements() {
        docx = add_element(docx, element);
    }

    debug!("Rendered {} elements", document.len());
    docx
}

fn apply_page(docx: Docx, page: &PageSettings) -> Docx {
    docx.page_size(mm_to_twips(page.width), mm_to_twips(page.height))
        .page_margin(
            PageMargin::new()
                .top(mm_to_twips(page.margin_top) as i32)
                .right(mm_to_twips(page.margin_right) as i32)
                .bottom(mm_to_twips(page.margin_bottom) as i32)
                .left(mm_to_twips(page.margin_left) as i32),
        )
}

fn add_element(docx: Docx, element: &DocumentElement) -> Docx {
    let paragraph = match element {
        DocumentElement::Table { rows } => return docx.add_table(table(rows)),
        DocumentElement::Heading { style, runs, .. } => {
            styled_paragraph(style, HEADING_AFTER).add_runs(runs)
        }
        DocumentElement::Paragraph(StyledParagraph { style, runs }) => {
            styled_paragraph(style, PARAGRAPH_AFTER).add_runs(runs)
        }
        DocumentElement::ListItem {
            ordered,
            level,
            style,
            runs,
        } => styled_paragraph(style, LIST_ITEM_AFTER)
            .numbering(
                NumberingId::new(numbering::numbering_id(*ordered)),
                IndentLevel::new(numbering::level_index(*level)),
            )
            .add_runs(runs),
        DocumentElement::CodeLine {
            text,
            is_first,
            is_last,
            style,
        } => code_line(text, *is_first, *is_last, style),
        DocumentElement::Image {
            data,
            width,
            height,
        } => {
            let pic = Pic::new(data).size(width * EMU_PER_PIXEL, height * EMU_PER_PIXEL);
            Paragraph::new()
                .line_spacing(LineSpacing::new().after(IMAGE_AFTER))
                .add_run(Run::new().add_image(pic))
        }
    };
    docx.add_paragraph(paragraph)
}

trait AddRuns {
    fn add_runs(self, runs: &[FormattedRun]) -> Self;
}

impl AddRuns for Paragraph {
    fn add_runs(self, runs: &[FormattedRun]) -> Self {
        runs.iter().fold(self, |paragraph, formatted| {
            paragraph.add_run(run(formatted))
        })
    }
}

/// Paragraph carrying the style reference and its paragraph properties.
///
/// Style spacing replaces `default_after` entirely when the style has any.
fn styled_paragraph(style: &StyleDefinition, default_after: u32) -> Paragraph {
    let mut paragraph = Paragraph::new().style(style.reference());

    if let Some(alignment) = style.alignment {
        paragraph = paragraph.align(alignment_type(alignment));
    }

    paragraph = match &style.spacing {
        Some(spacing) => {
            let mut line_spacing = LineSpacing::new();
            if let Some(before) = spacing.before.filter(|v| *v > 0.0) {
                line_spacing = line_spacing.before((before * 20.0).round() as u32);
            }
            if let Some(after) = spacing.after.filter(|v| *v > 0.0) {
                line_spacing = line_spacing.after((after * 20.0).round() as u32);
            }
            if let Some(line) = spacing.line.filter(|v| *v > 0.0) {
                line_spacing = line_spacing
                    .line((line * 240.0).round() as i32)
                    .line_rule(LineSpacingType::Auto);
            }
            paragraph.line_spacing(line_spacing)
        }
        None => paragraph.line_spacing(LineSpacing::new().after(default_after)),
    };

    if let Some(indent) = &style.indent {
        let left = indent.left.map(chars_to_twips);
        let first_line = indent
            .first_line
            .map(|chars| SpecialIndentType::FirstLine(chars_to_twips(chars)));
        if left.is_some() || first_line.is_some() {
            paragraph = paragraph.indent(left, first_line, None, None);
        }
    }

    paragraph
}

fn chars_to_twips(chars: i32) -> i32 {
    (chars as f32 * TWIPS_PER_CHAR) as i32
}

fn alignment_type(alignment: StyleAlignment) -> AlignmentType {
    match alignment {
        StyleAlignment::Left => AlignmentType::Left,
        StyleAlignment::Center => AlignmentType::Center,
        StyleAlignment::Right => AlignmentType::Right,
        StyleAlignment::Justify => AlignmentType::Both,
        StyleAlignment::Distribute => AlignmentType::Distribute,
    }
}

fn run_fonts(family: &str) -> RunFonts {
    RunFonts::new()
        .ascii(family)
        .hi_ansi(family)
        .east_asia(family)
        .cs(family)
}

fn run(formatted: &FormattedRun) -> Run {
    let formatting = &formatted.formatting;
    let mut run = Run::new().add_text(&formatted.text);

    if let Some(font) = &formatting.font {
        run = run.fonts(run_fonts(font));
    }
    if let Some(size) = formatting.font_size {
        run = run.size((size * 2.0).round() as usize);
    }
    if formatting.bold {
        run = run.bold();
    }
    if formatting.italic {
        run = run.italic();
    }
    if let Some(color) = &formatting.color {
        run = run.color(color);
    }
    run
}

fn code_line(text: &str, is_first: bool, is_last: bool, style: &StyleDefinition) -> Paragraph {
    let border = |position| {
        ParagraphBorder::new(position)
            .val(BorderType::Single)
            .size(1)
            .color("auto")
    };

    let mut borders = ParagraphBorders::with_empty()
        .set(border(ParagraphBorderPosition::Left))
        .set(border(ParagraphBorderPosition::Right));
    if is_first {
        borders = borders.set(border(ParagraphBorderPosition::Top));
    }
    if is_last {
        borders = borders.set(border(ParagraphBorderPosition::Bottom));
    }

    let after = if is_last { CODE_BLOCK_AFTER } else { 0 };
    let mut code_run = Run::new()
        .add_text(text)
        .size(CODE_FONT_HALF_POINTS)
        .color(CODE_TEXT_COLOR)
        .shading(
            Shading::new()
                .shd_type(ShdType::Clear)
                .color("auto")
                .fill(CODE_FILL),
        );
    if let Some(family) = style.font_family() {
        code_run = code_run.fonts(run_fonts(family));
    }

    let mut paragraph = Paragraph::new()
        .style(style.reference())
        .line_spacing(LineSpacing::new().before(0).after(after))
        .add_run(code_run);
    paragraph.property = std::mem::take(&mut paragraph.property).set_borders(borders);
    paragraph
}

fn table(rows: &[Vec<StyledParagraph>]) -> Table {
    let rows = rows
        .iter()
        .map(|cells| {
            let cells = cells
                .iter()
                .map(|cell| {
                    let paragraph = Paragraph::new()
                        .style(cell.style.reference())
                        .add_runs(&cell.runs);
                    TableCell::new().add_paragraph(paragraph)
                })
                .collect();
            TableRow::new(cells)
        })
        .collect();

    Table::new(rows).width(FULL_WIDTH_PCT, WidthType::Pct)
}

/// docx-rs style carrying a registry definition's run and paragraph properties
fn docx_style(definition: &StyleDefinition) -> Style {
    let style_type = match definition.kind {
        StyleKind::Paragraph => StyleType::Paragraph,
        StyleKind::Character => StyleType::Character,
        StyleKind::Table => StyleType::Table,
    };

    let mut style = Style::new(definition.reference(), style_type).name(&definition.name);
    if let Some(family) = definition.font_family() {
        style = style.fonts(run_fonts(family));
    }
    if let Some(size) = definition.font_size.filter(|size| *size > 0.0) {
        style = style.size((size * 2.0).round() as usize);
    }
    if definition.bold == Some(true) {
        style = style.bold();
    }
    if definition.italic == Some(true) {
        style = style.italic();
    }
    if let Some(color) = &definition.color {
        style = style.color(color);
    }
    if let Some(alignment) = definition.alignment {
        style = style.align(alignment_type(alignment));
    }
    style
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mm_to_twips() {
        assert_eq!(mm_to_twips(210), 11905);
        assert_eq!(mm_to_twips(297), 16837);
        assert_eq!(mm_to_twips(0), 0);
    }

    #[test]
    fn test_chars_to_twips() {
        assert_eq!(chars_to_twips(2), 840);
        assert_eq!(chars_to_twips(0), 0);
    }
}
