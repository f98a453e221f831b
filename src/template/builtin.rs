//! Built-in style registry
//!
//! Used when no template can be loaded. The definitions follow Word's
//! default style names so the standard mapping candidates resolve.

use super::styles::{StyleAlignment, StyleDefinition, StyleFont, StyleKind, StyleSpacing};

fn paragraph(id: &str, name: &str) -> StyleDefinition {
    StyleDefinition::new(id, name, StyleKind::Paragraph)
}

fn heading(level: u8, size: f32) -> StyleDefinition {
    let mut style = paragraph(&format!("Heading{level}"), &format!("heading {level}"));
    style.font_size = Some(size);
    style.bold = Some(true);
    style.spacing = Some(StyleSpacing {
        before: Some(12.0),
        after: Some(6.0),
        line: None,
    });
    style
}

pub(crate) fn styles() -> Vec<StyleDefinition> {
    let mut normal = paragraph("Normal", "Normal");
    normal.font = Some(StyleFont {
        east_asia: None,
        ascii: Some("Times New Roman".to_string()),
    });
    normal.font_size = Some(12.0);

    let mut title = paragraph("Title", "Title");
    title.font_size = Some(26.0);
    title.bold = Some(true);
    title.alignment = Some(StyleAlignment::Center);

    let mut quote = paragraph("Quote", "Quote");
    quote.italic = Some(true);
    quote.color = Some("404040".to_string());

    let mut code = paragraph("HTMLPreformatted", "HTML Preformatted");
    code.font = Some(StyleFont {
        east_asia: None,
        ascii: Some("Courier New".to_string()),
    });
    code.font_size = Some(10.0);

    let mut styles = vec![normal, title];
    let sizes = [16.0, 14.0, 13.0, 12.0, 11.0, 11.0];
    for (level, size) in (1u8..=6).zip(sizes) {
        styles.push(heading(level, size));
    }
    styles.push(paragraph("ListBullet", "List Bullet"));
    styles.push(paragraph("ListNumber", "List Number"));
    styles.push(quote);
    styles.push(code);
    styles
}
