//! Content security
//!
//! This module sanitizes raw Markdown before it is parsed, enforces the
//! input limits, validates image URLs and flags sensitive content.

pub mod sensitive;
pub mod urls;

use log::debug;
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use std::sync::Arc;

use crate::config::SecurityConfig;
use crate::error::SecurityError;

pub use self::urls::UrlCache;

pub const DANGEROUS_CONTENT_PLACEHOLDER: &str = "[REMOVED: Potentially dangerous content]";
pub const DANGEROUS_TAG_PLACEHOLDER: &str = "[REMOVED: Dangerous HTML tag]";

const MAX_SANITIZE_PASSES: usize = 16;

/// Script-capable markup, event handlers and executable URL schemes
static DANGEROUS_CONTENT: Lazy<Regex> = Lazy::new(|| {
    combine(&[
        r"<script[\s\S]*?>[\s\S]*?</script>",
        r"<script[^>]*/>",
        r"<iframe[\s\S]*?>.*?</iframe>",
        r"<iframe[^>]*/>",
        r"<embed[^>]*>",
        r"<object[\s\S]*?>.*?</object>",
        r"<applet[\s\S]*?>.*?</applet>",
        r"<form[\s\S]*?>.*?</form>",
        r"javascript:\s*\S",
        r"vbscript:\s*\S",
        r"data:\s*text/html",
        r#"\s*on[a-z]+\s*=\s*["'][^"']*["']"#,
        r"\s*on[a-z]+\s*=\s*[^\s>]+",
        r#"<meta[^>]*http-equiv\s*=\s*["']?refresh["']?[^>]*>"#,
        r#"<link[^>]*href\s*=\s*["']?javascript:[^"'>]+["']?[^>]*>"#,
        r#"style\s*=\s*["'][^"']*expression\s*\("#,
        r#"style\s*=\s*["'][^"']*javascript:"#,
        r#"data:\s*[^;]*;base64[^\s"'>]*"#,
    ])
});

/// Interactive and media elements
static DANGEROUS_TAGS: Lazy<Regex> = Lazy::new(|| {
    combine(&[
        r"<input[^>]*>",
        r"<button[^>]*>.*?</button>",
        r"<select[^>]*>.*?</select>",
        r"<textarea[^>]*>.*?</textarea>",
        r"<option[^>]*>.*?</option>",
        r"<audio[^>]*>.*?</audio>",
        r"<video[^>]*>.*?</video>",
        r"<source[^>]*>",
        r"<track[^>]*>",
        r"<svg[\s\S]*?>.*?</svg>",
        r"<foreignobject[\s\S]*?>.*?</foreignobject>",
    ])
});

static IMAGE_REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[.*?\]\(.*?\)").unwrap());

static TABLE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\|\s*:?-+:?\s*(\|\s*:?-+:?\s*)*\|\s*$").unwrap());

static UNSAFE_FILE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\x{4e00}-\x{9fa5}._-]").unwrap());

static REPEATED_UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"_{2,}").unwrap());

fn combine(patterns: &[&str]) -> Regex {
    Regex::new(&format!("(?i)(?:{})", patterns.join("|"))).unwrap()
}

#[derive(Debug, Clone)]
pub struct SecurityFilter {
    config: SecurityConfig,
    url_cache: Arc<UrlCache>,
}

impl SecurityFilter {
    pub fn new(config: SecurityConfig) -> Self {
        let url_cache = Arc::new(UrlCache::new(config.url_cache_capacity));
        SecurityFilter { config, url_cache }
    }

    /// Build a filter that shares an existing URL verdict cache
    pub fn with_url_cache(config: SecurityConfig, url_cache: Arc<UrlCache>) -> Self {
        SecurityFilter { config, url_cache }
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    pub fn url_cache(&self) -> &Arc<UrlCache> {
        &self.url_cache
    }

    /// Strip dangerous markup and enforce the input limits.
    ///
    /// Replacement repeats until the text stops changing, so sanitizing an
    /// already sanitized string returns it unchanged.
    pub fn sanitize_markdown(&self, markdown: &str) -> Result<String, SecurityError> {
        if markdown.is_empty() {
            return Err(SecurityError::EmptyInput);
        }

        if self.config.enable_size_check && markdown.len() > self.config.max_content_bytes {
            return Err(SecurityError::TooLarge {
                size: markdown.len(),
                limit: self.config.max_content_bytes,
            });
        }

        let sanitized = if self.config.enable_content_filtering {
            strip_dangerous(markdown)
        } else {
            markdown.to_string()
        };

        if self.config.enable_size_check {
            self.validate_limits(&sanitized)?;
        }

        Ok(sanitized)
    }

    fn validate_limits(&self, content: &str) -> Result<(), SecurityError> {
        let images = count_images(content);
        if images > self.config.max_images {
            return Err(SecurityError::TooManyImages {
                count: images,
                limit: self.config.max_images,
            });
        }

        let tables = estimate_tables(content);
        if tables > self.config.max_tables {
            return Err(SecurityError::TooManyTables {
                count: tables,
                limit: self.config.max_tables,
            });
        }

        Ok(())
    }

    /// Whether an image URL may be fetched
    pub fn validate_image_url(&self, url: &str) -> bool {
        if let Some(verdict) = self.url_cache.get(url) {
            return verdict;
        }

        let verdict = urls::check_url(&self.config, url);
        self.url_cache.insert(url, verdict);
        verdict
    }

    /// Categories of sensitive data present in `content`
    pub fn contains_sensitive_content(&self, content: &str) -> Vec<&'static str> {
        sensitive::detect(content)
    }
}

fn strip_dangerous(markdown: &str) -> String {
    let mut current = markdown.to_string();

    for pass in 0..MAX_SANITIZE_PASSES {
        let scripts =
            DANGEROUS_CONTENT.replace_all(&current, NoExpand(DANGEROUS_CONTENT_PLACEHOLDER));
        let next = DANGEROUS_TAGS
            .replace_all(&scripts, NoExpand(DANGEROUS_TAG_PLACEHOLDER))
            .into_owned();

        if next == current {
            if pass > 0 {
                debug!("Sanitized input in {pass} passes");
            }
            break;
        }
        current = next;
    }

    current
}

pub(crate) fn count_images(content: &str) -> usize {
    IMAGE_REFERENCE.find_iter(content).count()
}

/// Rough table count: separator rows, or one table per three pipe-delimited lines
pub(crate) fn estimate_tables(content: &str) -> usize {
    let mut pipe_lines: usize = 0;
    let mut separators: usize = 0;

    for line in content.split('\n') {
        let trimmed = line.trim();
        if trimmed.starts_with('|') && trimmed.ends_with('|') {
            pipe_lines += 1;
        }
        if TABLE_SEPARATOR.is_match(line) {
            separators += 1;
        }
    }

    separators.max(pipe_lines.div_ceil(3))
}

/// Reduce a file name to safe characters, keeping CJK ideographs
pub fn sanitize_file_name(name: &str) -> String {
    let replaced = UNSAFE_FILE_CHARS.replace_all(name, "_");
    let collapsed = REPEATED_UNDERSCORES.replace_all(&replaced, "_");
    let trimmed: String = collapsed.trim_matches('_').chars().take(100).collect();

    if trimmed.is_empty() {
        "document".to_string()
    } else {
        trimmed
    }
}
