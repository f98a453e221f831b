//! End-to-end conversion
//!
//! [`Converter`] runs sanitize → style mapping → document building →
//! assembly, and optionally hands the result to an [`UploadSink`]. When a
//! template cannot be used the conversion is retried with the built-in
//! styles so callers still receive a document.

use log::{error, info, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::assemble::DocumentAssembler;
use crate::config::Config;
use crate::document::{HttpImageFetcher, ImageFetcher, MarkdownDocumentBuilder};
use crate::error::ConvertError;
use crate::i18n::Language;
use crate::security::{SecurityFilter, UrlCache, sanitize_file_name};
use crate::template::{MapperOptions, StyleMapper, TemplateCache, TemplateReader};
use crate::upload::UploadSink;

pub struct Converter {
    config: Config,
    filter: Arc<SecurityFilter>,
    fetcher: Arc<dyn ImageFetcher>,
    templates: Arc<TemplateCache>,
    builtin: Arc<StyleMapper>,
    assembler: DocumentAssembler,
    language: Language,
}

impl Converter {
    /// Converter fetching images over HTTP with the configured timeout
    pub fn new(config: Config) -> Result<Self, ConvertError> {
        let timeout = Duration::from_secs(config.images.fetch_timeout_secs);
        let fetcher = Arc::new(HttpImageFetcher::new(timeout)?);
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Converter using `fetcher` for images.
    ///
    /// With `i18n.auto_detect` the language comes from the process locale.
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn ImageFetcher>) -> Self {
        let language = config.i18n.resolve(|key| std::env::var(key).ok());
        let url_cache = Arc::new(UrlCache::new(config.security.url_cache_capacity));
        let filter = Arc::new(SecurityFilter::with_url_cache(
            config.security.clone(),
            url_cache,
        ));
        let builtin = Arc::new(StyleMapper::new(
            Arc::new(TemplateReader::builtin()),
            MapperOptions {
                fallback_style: None,
                log_mappings: false,
            },
        ));

        Converter {
            config,
            filter,
            fetcher,
            templates: Arc::new(TemplateCache::new()),
            builtin,
            assembler: DocumentAssembler::new(),
            language,
        }
    }

    /// Share a template cache between converters
    pub fn with_template_cache(mut self, templates: Arc<TemplateCache>) -> Self {
        self.templates = templates;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn template_cache(&self) -> &Arc<TemplateCache> {
        &self.templates
    }

    /// Language of document notices and of [`ConvertError::localized`] output
    pub fn language(&self) -> Language {
        self.language
    }

    /// Convert Markdown to `.docx` bytes.
    ///
    /// `template` overrides the configured template. Input that fails the
    /// security checks is rejected; a template that cannot be loaded or
    /// assembled falls back to the built-in styles.
    pub async fn convert(
        &self,
        markdown: &str,
        template: Option<&Path>,
    ) -> Result<Vec<u8>, ConvertError> {
        let sanitized = self.filter.sanitize_markdown(markdown)?;

        if self.config.security.scan_sensitive_content {
            let findings = self.filter.contains_sensitive_content(&sanitized);
            if !findings.is_empty() {
                warn!("Input may contain sensitive data: {}", findings.join(", "));
            }
        }

        let template = template.or(self.config.template.path.as_deref());
        let Some(path) = template else {
            return self.render(&sanitized, Arc::clone(&self.builtin)).await;
        };

        match self.convert_with_template(&sanitized, path).await {
            Ok(bytes) => Ok(bytes),
            Err(e @ (ConvertError::Template(_) | ConvertError::Assemble(_))) => {
                error!(
                    "Template conversion with {} failed, using built-in styles: {e}",
                    path.display()
                );
                self.render(&sanitized, Arc::clone(&self.builtin)).await
            }
            Err(e) => Err(e),
        }
    }

    /// Convert and store the result, returning its access URL
    pub async fn convert_and_upload(
        &self,
        markdown: &str,
        template: Option<&Path>,
        sink: &dyn UploadSink,
    ) -> Result<String, ConvertError> {
        let bytes = self.convert(markdown, template).await?;
        let file_name = self.output_file_name();

        let receipt = sink.upload(bytes, &file_name).await?;
        let url = receipt.access_url.ok_or(ConvertError::MissingAccessUrl)?;
        info!("Uploaded {file_name} to {url}");
        Ok(url)
    }

    /// `<prefix>-<unix millis>.docx`, sanitized
    pub fn output_file_name(&self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        let stem = sanitize_file_name(&format!("{}-{millis}", self.config.output.file_prefix));
        format!("{stem}.docx")
    }

    async fn convert_with_template(
        &self,
        markdown: &str,
        path: &Path,
    ) -> Result<Vec<u8>, ConvertError> {
        let options = MapperOptions {
            fallback_style: self.config.template.fallback_style.clone(),
            log_mappings: self.config.template.log_mappings,
        };

        let mapper = if self.config.template.enable_cache {
            self.templates.get_or_load(path, &options)?
        } else {
            let reader = Arc::new(TemplateReader::load(path)?);
            Arc::new(StyleMapper::new(reader, options))
        };

        let report = mapper.validate_mappings();
        if !report.is_valid {
            let missing: Vec<String> = report.missing.iter().map(ToString::to_string).collect();
            info!("Template lacks styles for: {}", missing.join(", "));
        }

        self.render(markdown, mapper).await
    }

    async fn render(
        &self,
        markdown: &str,
        mapper: Arc<StyleMapper>,
    ) -> Result<Vec<u8>, ConvertError> {
        let builder = MarkdownDocumentBuilder::new(
            Arc::clone(&mapper),
            Arc::clone(&self.filter),
            Arc::clone(&self.fetcher),
            self.config.images.clone(),
        )
        .language(self.language);

        let document = builder.build(markdown).await?;
        let bytes = self.assembler.assemble(&document, mapper.reader())?;
        info!(
            "Generated document: {} elements, {} bytes",
            document.len(),
            bytes.len()
        );
        Ok(bytes)
    }
}
