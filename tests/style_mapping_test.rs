use markdocx::config::SecurityConfig;
use markdocx::template::{MapperOptions, StyleDefinition, StyleKind};
use markdocx::{ElementType, SecurityFilter, StyleError, StyleMapper, TemplateReader};
use std::sync::Arc;

fn paragraph(id: &str, name: &str) -> StyleDefinition {
    StyleDefinition::new(id, name, StyleKind::Paragraph)
}

fn mapper(definitions: Vec<StyleDefinition>) -> StyleMapper {
    let reader = Arc::new(TemplateReader::from_definitions(definitions));
    StyleMapper::new(reader, MapperOptions::default())
}

#[cfg(test)]
mod style_mapping_tests {
    use super::*;

    #[test]
    fn test_every_element_resolves_with_fallback() {
        let mapper = mapper(vec![paragraph("1", "Normal")]);

        for element in ElementType::ALL {
            let style = mapper.style_for_element(element).unwrap();
            assert_eq!(style.id, "1", "{element} did not resolve to Normal");
        }

        // Headings and lists have no candidate matching Normal
        let report = mapper.validate_mappings();
        assert!(!report.is_valid);
        assert_eq!(report.missing.len(), 8);
        assert!(mapper.has_style(ElementType::Code));
    }

    #[test]
    fn test_heading_levels() {
        let mapper = mapper(vec![
            paragraph("1", "Normal"),
            paragraph("34", "Title"),
            paragraph("2", "heading 1"),
            paragraph("7", "heading 6"),
        ]);

        for level in 1..=6u8 {
            let direct = mapper
                .style_for_element(ElementType::heading(level))
                .unwrap();
            assert_eq!(mapper.heading_style(level).unwrap().id, direct.id);
        }

        let h6 = mapper.heading_style(6).unwrap();
        assert_eq!(h6.id, "7");
        assert_eq!(mapper.heading_style(9).unwrap().id, h6.id);
        assert_eq!(mapper.heading_style(0).unwrap().id, "34");
    }

    #[test]
    fn test_lookup_by_name_when_id_differs() {
        let mapper = mapper(vec![
            paragraph("Normal", "Normal"),
            paragraph("ListParagraph", "List Bullet"),
        ]);

        let bullet = mapper.list_style(false).unwrap();
        assert_eq!(bullet.id, "ListParagraph");
        assert!(mapper.has_style(ElementType::ListBullet));
        assert!(!mapper.has_style(ElementType::ListOrdered));
    }

    #[test]
    fn test_missing_fallback_fails_only_unmapped_elements() {
        let mapper = mapper(vec![paragraph("34", "Title")]);

        assert_eq!(mapper.heading_style(1).unwrap().id, "34");
        assert!(matches!(
            mapper.paragraph_style(),
            Err(StyleError::MissingFallback(_))
        ));
    }

    #[test]
    fn test_configured_fallback() {
        let reader = Arc::new(TemplateReader::from_definitions(vec![
            paragraph("1", "Normal"),
            paragraph("Body", "Body Text"),
        ]));
        let options = MapperOptions {
            fallback_style: Some("Body".to_string()),
            log_mappings: false,
        };
        let mapper = StyleMapper::new(reader, options);

        assert_eq!(mapper.fallback_style().unwrap().id, "Body");
        // Paragraph still resolves natively
        assert_eq!(mapper.paragraph_style().unwrap().id, "1");
        assert_eq!(mapper.code_style().unwrap().id, "1");
    }
}

#[cfg(test)]
mod security_property_tests {
    use super::*;

    #[test]
    fn test_sanitize_is_idempotent() {
        let filter = SecurityFilter::new(SecurityConfig::default());
        let inputs = [
            "plain text",
            "<script>alert(1)</script> and <input type=text>",
            "<scr<script>x</script>ipt>alert(2)</script>",
            "<a onclick=\"steal()\">x</a> javascript:void(0)",
            "<svg><circle/></svg> <video src=x></video>",
        ];

        for input in inputs {
            let once = filter.sanitize_markdown(input).unwrap();
            let twice = filter.sanitize_markdown(&once).unwrap();
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_url_validation_is_cache_consistent() {
        let filter = SecurityFilter::new(SecurityConfig::default());
        let urls = [
            "https://github.com/logo.png",
            "https://cdn.malicious-site.com/x.png",
            "ftp://example.com/a.png",
            "not a url",
            "https://unknown.example/a.png",
        ];

        let first: Vec<bool> = urls.iter().map(|u| filter.validate_image_url(u)).collect();
        let second: Vec<bool> = urls.iter().map(|u| filter.validate_image_url(u)).collect();

        assert_eq!(first, vec![true, false, false, false, true]);
        assert_eq!(first, second);
        assert_eq!(filter.url_cache().len(), urls.len());
    }

    #[test]
    fn test_sensitive_content_is_reported() {
        let filter = SecurityFilter::new(SecurityConfig::default());
        let found = filter.contains_sensitive_content("mail me at someone@example.com");
        assert!(!found.is_empty());
        assert!(
            filter
                .contains_sensitive_content("nothing to see here")
                .is_empty()
        );
    }
}
