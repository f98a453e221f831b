//! Markdown to styled element conversion
//!
//! Building runs in two passes. The event walk is synchronous and leaves a
//! slot for every image; the images are then fetched concurrently and each
//! slot is resolved in place, so output order always follows the source.

use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info, warn};
use pulldown_cmark::{Event, Options, Parser};

use super::images::{self, ImageFetcher};
use super::models::*;
use super::parsing::{self, Context, Slot, WARNING_COLOR};
use crate::config::ImageConfig;
use crate::error::StyleError;
use crate::i18n::{Language, Message};
use crate::security::SecurityFilter;
use crate::template::StyleMapper;

pub struct MarkdownDocumentBuilder {
    mapper: Arc<StyleMapper>,
    filter: Arc<SecurityFilter>,
    fetcher: Arc<dyn ImageFetcher>,
    images: ImageConfig,
    language: Language,
}

impl MarkdownDocumentBuilder {
    pub fn new(
        mapper: Arc<StyleMapper>,
        filter: Arc<SecurityFilter>,
        fetcher: Arc<dyn ImageFetcher>,
        images: ImageConfig,
    ) -> Self {
        MarkdownDocumentBuilder {
            mapper,
            filter,
            fetcher,
            images,
            language: Language::default(),
        }
    }

    /// Language of the notices that replace unusable images
    pub fn language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Convert sanitized Markdown into an ordered element list.
    ///
    /// Image problems are replaced by placeholder paragraphs; only a missing
    /// fallback style fails the build.
    pub async fn build(&self, markdown: &str) -> Result<Document, StyleError> {
        let slots = self.walk(markdown)?;
        let pending = slots
            .iter()
            .filter(|slot| matches!(slot, Slot::PendingImage { .. }))
            .count();
        if pending > 0 {
            info!("Fetching {pending} image(s)");
        }

        let resolved = join_all(slots.into_iter().map(|slot| self.resolve(slot))).await;
        let elements = resolved.into_iter().collect::<Result<Vec<_>, _>>()?;

        debug!("Built document with {} elements", elements.len());
        Ok(Document::new(elements))
    }

    fn walk(&self, markdown: &str) -> Result<Vec<Slot>, StyleError> {
        let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
        let events: Vec<Event<'_>> = Parser::new_ext(markdown, options).collect();

        let mut cx = Context::new(&self.mapper, &self.filter, self.language);
        parsing::walk_blocks(&mut cx, &events, 0, events.len())?;
        Ok(cx.slots)
    }

    async fn resolve(&self, slot: Slot) -> Result<DocumentElement, StyleError> {
        let (url, alt) = match slot {
            Slot::Ready(element) => return Ok(element),
            Slot::PendingImage { url, alt } => (url, alt),
        };

        let prepared = match self.fetcher.fetch(&url).await {
            Ok(data) => images::prepare(&data, self.images.max_width, self.images.max_height),
            Err(e) => Err(e),
        };

        match prepared {
            Ok(image) => Ok(DocumentElement::Image {
                data: image.png,
                width: image.width,
                height: image.height,
            }),
            Err(e) => {
                warn!("Failed to load image {url}: {e}");
                let src = if alt.trim().is_empty() { &url } else { &alt };
                parsing::placeholder(
                    &self.mapper,
                    self.language,
                    &Message::ImageLoadFailed { src },
                    WARNING_COLOR,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityConfig;
    use crate::error::ImageError;
    use crate::template::{MapperOptions, StyleDefinition, StyleKind, TemplateReader};
    use async_trait::async_trait;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    struct StaticFetcher;

    #[async_trait]
    impl ImageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageError> {
            if url.contains("missing") {
                return Err(ImageError::Status(404));
            }
            let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(800, 400);
            let mut data = Vec::new();
            buffer
                .write_to(&mut Cursor::new(&mut data), ImageFormat::Png)
                .unwrap();
            Ok(data)
        }
    }

    fn builder() -> MarkdownDocumentBuilder {
        builder_with(TemplateReader::builtin())
    }

    fn builder_with(reader: TemplateReader) -> MarkdownDocumentBuilder {
        let reader = Arc::new(reader);
        MarkdownDocumentBuilder::new(
            Arc::new(StyleMapper::new(reader, MapperOptions::default())),
            Arc::new(SecurityFilter::new(SecurityConfig::default())),
            Arc::new(StaticFetcher),
            ImageConfig::default(),
        )
    }

    fn summary(document: &Document) -> Vec<String> {
        document
            .elements()
            .iter()
            .map(|element| match element {
                DocumentElement::Heading { level, .. } => format!("h{level}:{}", element.text()),
                DocumentElement::Paragraph(p) => format!("p:{}", p.text()),
                DocumentElement::ListItem { ordered, level, .. } => {
                    let kind = if *ordered { "ol" } else { "ul" };
                    format!("{kind}{level}:{}", element.text())
                }
                DocumentElement::Table { rows } => format!("table:{}", rows.len()),
                DocumentElement::CodeLine { text, .. } => format!("code:{text}"),
                DocumentElement::Image { width, height, .. } => format!("img:{width}x{height}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_heading_then_paragraph() {
        let document = builder().build("# Title\n\nHello **world**").await.unwrap();
        assert_eq!(document.len(), 2);

        match &document.elements()[0] {
            DocumentElement::Heading { level, runs, style } => {
                assert_eq!(*level, 1);
                assert_eq!(runs.len(), 1);
                assert_eq!(runs[0].text, "Title");
                assert_eq!(style.id, "Title");
            }
            other => panic!("expected heading, got {other:?}"),
        }

        match &document.elements()[1] {
            DocumentElement::Paragraph(paragraph) => {
                assert_eq!(paragraph.runs.len(), 2);
                assert_eq!(paragraph.runs[0].text, "Hello ");
                assert!(!paragraph.runs[0].formatting.bold);
                assert_eq!(paragraph.runs[1].text, "world");
                assert!(paragraph.runs[1].formatting.bold);
            }
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_nested_lists_keep_order() {
        let markdown = "- one\n  1. inner\n  2. second\n- two\n";
        let document = builder().build(markdown).await.unwrap();
        assert_eq!(
            summary(&document),
            vec!["ul0:one", "ol1:inner", "ol1:second", "ul0:two"]
        );
    }

    #[tokio::test]
    async fn test_loose_list_items_join_paragraphs() {
        let document = builder().build("1. first\n\n   more\n\n2. next\n").await.unwrap();
        assert_eq!(summary(&document), vec!["ol0:first more", "ol0:next"]);
    }

    #[tokio::test]
    async fn test_table_rows_and_styles() {
        let markdown = "| A | B |\n|---|---|\n| 1 | 2 |\n";
        let document = builder().build(markdown).await.unwrap();
        assert_eq!(document.len(), 1);

        let DocumentElement::Table { rows } = &document.elements()[0] else {
            panic!("expected table");
        };
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.len() == 2));
        assert_eq!(rows[0][0].text(), "A");
        assert_eq!(rows[1][1].text(), "2");
    }

    #[tokio::test]
    async fn test_table_header_and_body_styles() {
        let reader = TemplateReader::from_definitions(vec![
            StyleDefinition::new("1", "Normal", StyleKind::Paragraph),
            StyleDefinition::new("41", "表格表头", StyleKind::Paragraph),
            StyleDefinition::new("42", "表格内容", StyleKind::Paragraph),
        ]);
        let markdown = "| A | B |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |\n";
        let document = builder_with(reader).build(markdown).await.unwrap();

        let DocumentElement::Table { rows } = &document.elements()[0] else {
            panic!("expected table");
        };
        let ids: Vec<Vec<&str>> = rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.style.id.as_str()).collect())
            .collect();
        assert_eq!(ids, vec![vec!["41", "41"], vec!["42", "42"], vec!["42", "42"]]);
    }

    #[tokio::test]
    async fn test_code_block_lines() {
        let document = builder().build("```\nlet a = 1;\n\nlet b = 2;\n```\n").await.unwrap();
        let flags: Vec<(String, bool, bool)> = document
            .elements()
            .iter()
            .map(|element| match element {
                DocumentElement::CodeLine {
                    text,
                    is_first,
                    is_last,
                    style,
                } => {
                    assert_eq!(style.id, "HTMLPreformatted");
                    (text.clone(), *is_first, *is_last)
                }
                other => panic!("expected code line, got {other:?}"),
            })
            .collect();

        assert_eq!(
            flags,
            vec![
                ("let a = 1;".to_string(), true, false),
                (String::new(), false, false),
                ("let b = 2;".to_string(), false, true),
            ]
        );
    }

    #[tokio::test]
    async fn test_images_follow_paragraph_text() {
        let markdown = "see ![pic](https://example.com/a.png) here";
        let document = builder().build(markdown).await.unwrap();
        assert_eq!(summary(&document), vec!["p:see  here", "img:600x300"]);
    }

    #[tokio::test]
    async fn test_image_inside_heading_splits_it() {
        let markdown = "## Before ![x](https://example.com/a.png) after";
        let document = builder().build(markdown).await.unwrap();
        assert_eq!(
            summary(&document),
            vec!["h2:Before ", "img:600x300", "h2: after"]
        );
    }

    #[tokio::test]
    async fn test_image_placeholders() {
        let markdown = "![a](ftp://example.com/a.png)\n\n![gone](https://example.com/missing.png)";
        let document = builder().build(markdown).await.unwrap();
        let texts = summary(&document);
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("blocked"));
        assert_eq!(texts[1], "p:[Failed to load image: gone]");

        let DocumentElement::Paragraph(paragraph) = &document.elements()[0] else {
            panic!("expected placeholder paragraph");
        };
        assert!(paragraph.runs[0].formatting.italic);
        assert_eq!(paragraph.runs[0].formatting.color.as_deref(), Some("FF0000"));
    }

    #[tokio::test]
    async fn test_placeholders_follow_language() {
        let markdown = "![a](ftp://example.com/a.png)\n\n![gone](https://example.com/missing.png)";
        let document = builder()
            .language(Language::ZhCn)
            .build(markdown)
            .await
            .unwrap();
        assert_eq!(
            summary(&document),
            vec!["p:[图片已阻止：不安全的URL]", "p:[图片加载失败：gone]"]
        );
    }

    #[tokio::test]
    async fn test_blockquote_uses_quote_style() {
        let document = builder().build("> quoted text").await.unwrap();
        let DocumentElement::Paragraph(paragraph) = &document.elements()[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(paragraph.style.id, "Quote");
        assert_eq!(paragraph.text(), "quoted text");
    }

    #[tokio::test]
    async fn test_whitespace_only_paragraph_is_dropped() {
        let document = builder().build("![a](ftp://x/a.png)").await.unwrap();
        assert_eq!(document.len(), 1);
    }
}
