use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::i18n::Language;

/// Name stem of generated documents when none is configured
pub const DEFAULT_FILE_PREFIX: &str = "markdown-to-docx";

/// Runtime configuration for markdocx
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub security: SecurityConfig,
    pub images: ImageConfig,
    pub template: TemplateConfig,
    pub output: OutputConfig,
    pub i18n: I18nConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Strip script-like markup and risky HTML tags
    pub enable_content_filtering: bool,
    /// Enforce the size, image and table limits
    pub enable_size_check: bool,
    /// Scan input for credentials and personal data (warnings only)
    pub scan_sensitive_content: bool,

    pub max_content_bytes: usize,
    pub max_images: usize,
    pub max_tables: usize,

    /// URL schemes accepted for images, without the trailing colon
    pub allowed_protocols: Vec<String>,
    pub blocked_domains: Vec<String>,
    pub trusted_domains: Vec<String>,
    pub url_cache_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Bounding box embedded images are scaled into, in pixels
    pub max_width: u32,
    pub max_height: u32,
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Template used when a request does not name one
    pub path: Option<PathBuf>,
    /// Style id every unmapped element falls back to; unset means "1" then "Normal"
    pub fallback_style: Option<String>,
    pub enable_cache: bool,
    pub log_mappings: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub file_prefix: String,
    /// Never prune older outputs
    pub keep_files: bool,
    pub max_files: usize,
}

/// Language of document notices and user-facing errors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct I18nConfig {
    pub language: Language,
    /// Prefer the language of the process locale when it is recognized
    pub auto_detect: bool,
}

impl I18nConfig {
    /// Effective language: the detected locale when enabled, else `language`
    pub fn resolve<F>(&self, lookup: F) -> Language
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.auto_detect {
            if let Some(detected) = Language::detect(lookup) {
                return detected;
            }
        }
        self.language
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// env_logger filter used when RUST_LOG is unset
    pub level: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        SecurityConfig {
            enable_content_filtering: true,
            enable_size_check: true,
            scan_sensitive_content: true,
            max_content_bytes: 10 * 1024 * 1024,
            max_images: 50,
            max_tables: 100,
            allowed_protocols: vec!["http".into(), "https".into(), "data".into()],
            blocked_domains: vec!["malicious-site.com".into(), "dangerous-domain.org".into()],
            trusted_domains: vec![
                "githubusercontent.com".into(),
                "github.com".into(),
                "cdn.jsdelivr.net".into(),
                "unpkg.com".into(),
            ],
            url_cache_capacity: 1000,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        ImageConfig {
            max_width: 600,
            max_height: 400,
            fetch_timeout_secs: 10,
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        TemplateConfig {
            path: None,
            fallback_style: None,
            enable_cache: true,
            log_mappings: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            dir: PathBuf::from("output"),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            keep_files: false,
            max_files: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the config directory, then apply `MARKDOCX_*` overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::get_config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from an explicit TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to the config directory
    pub fn save(&self) -> Result<()> {
        if let Some(config_path) = Self::get_config_path() {
            self.save_to(&config_path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("markdocx").join("config.toml"))
    }

    /// Initialize default config file
    pub fn init_default() -> Result<()> {
        Config::default().save()
    }

    /// Override fields from environment-style variables.
    ///
    /// `lookup` is `std::env::var` in production; tests pass a map.
    /// Unparsable values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| lookup(key).map(|v| v.trim().eq_ignore_ascii_case("true"));
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<usize>().ok());
        let list = |key: &str| {
            lookup(key).map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
        };

        if let Some(v) = flag("MARKDOCX_ENABLE_CONTENT_FILTERING") {
            self.security.enable_content_filtering = v;
        }
        if let Some(v) = flag("MARKDOCX_ENABLE_SIZE_CHECK") {
            self.security.enable_size_check = v;
        }
        if let Some(v) = number("MARKDOCX_MAX_CONTENT_SIZE") {
            self.security.max_content_bytes = v;
        }
        if let Some(extra) = list("MARKDOCX_TRUSTED_DOMAINS") {
            self.security.trusted_domains.extend(extra);
        }
        if let Some(extra) = list("MARKDOCX_BLOCKED_DOMAINS") {
            self.security.blocked_domains.extend(extra);
        }
        if let Some(v) = flag("MARKDOCX_ENABLE_CACHE") {
            self.template.enable_cache = v;
        }
        if let Some(v) = lookup("MARKDOCX_TEMPLATE") {
            self.template.path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("MARKDOCX_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(v);
        }
        if let Some(v) = flag("MARKDOCX_KEEP_FILES") {
            self.output.keep_files = v;
        }
        if let Some(v) = number("MARKDOCX_MAX_FILES") {
            self.output.max_files = v;
        }
        if let Some(v) = lookup("MARKDOCX_LANGUAGE").and_then(|v| Language::from_code(&v)) {
            self.i18n.language = v;
        }
        if let Some(v) = flag("MARKDOCX_I18N_AUTO_DETECT") {
            self.i18n.auto_detect = v;
        }
        if let Some(v) = lookup("MARKDOCX_LOG_LEVEL") {
            self.logging.level = v;
        }
    }

    /// Check the configuration, returning one message per problem
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.output.keep_files && self.output.max_files == 0 {
            errors.push("output.max_files must be greater than 0".to_string());
        }
        if self.security.max_content_bytes == 0 {
            errors.push("security.max_content_bytes must be greater than 0".to_string());
        }
        if self.security.url_cache_capacity == 0 {
            errors.push("security.url_cache_capacity must be greater than 0".to_string());
        }
        if self.images.max_width == 0 || self.images.max_height == 0 {
            errors.push("images.max_width and images.max_height must be greater than 0".to_string());
        }
        if self.security.allowed_protocols.is_empty() {
            errors.push("security.allowed_protocols must not be empty".to_string());
        }
        if !matches!(
            self.logging.level.to_ascii_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error" | "off"
        ) {
            errors.push(format!("logging.level '{}' is not a log level", self.logging.level));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.security.max_images, 50);
        assert_eq!(config.security.max_tables, 100);
        assert_eq!(config.images.max_width, 600);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str("[images]\nmax_width = 320\n").unwrap();
        assert_eq!(config.images.max_width, 320);
        assert_eq!(config.images.max_height, 400);
        assert_eq!(config.security, SecurityConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("MARKDOCX_ENABLE_CONTENT_FILTERING", "false"),
            ("MARKDOCX_MAX_CONTENT_SIZE", "2048"),
            ("MARKDOCX_TRUSTED_DOMAINS", "example.com, images.example.org"),
            ("MARKDOCX_MAX_FILES", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| vars.get(key).map(|v| v.to_string()));

        assert!(!config.security.enable_content_filtering);
        assert_eq!(config.security.max_content_bytes, 2048);
        assert!(
            config
                .security
                .trusted_domains
                .contains(&"images.example.org".to_string())
        );
        assert_eq!(config.output.max_files, 10);
    }

    #[test]
    fn test_language_from_file_and_env() {
        let config: Config = toml::from_str("[i18n]\nlanguage = \"ja\"\n").unwrap();
        assert_eq!(config.i18n.language, Language::Ja);
        assert!(!config.i18n.auto_detect);

        let mut config = Config::default();
        config.apply_env(|key| match key {
            "MARKDOCX_LANGUAGE" => Some("zh_CN".to_string()),
            _ => None,
        });
        assert_eq!(config.i18n.language, Language::ZhCn);

        config.apply_env(|key| (key == "MARKDOCX_LANGUAGE").then(|| "klingon".to_string()));
        assert_eq!(config.i18n.language, Language::ZhCn);
    }

    #[test]
    fn test_language_resolution() {
        let locale = |key: &str| (key == "LANG").then(|| "ko_KR.UTF-8".to_string());

        let fixed = I18nConfig {
            language: Language::ZhTw,
            auto_detect: false,
        };
        assert_eq!(fixed.resolve(locale), Language::ZhTw);

        let detecting = I18nConfig {
            auto_detect: true,
            ..fixed
        };
        assert_eq!(detecting.resolve(locale), Language::Ko);
        assert_eq!(detecting.resolve(|_| None), Language::ZhTw);
    }

    #[test]
    fn test_validate_reports_problems() {
        let mut config = Config::default();
        config.security.max_content_bytes = 0;
        config.logging.level = "loud".to_string();

        let errors = config.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("max_content_bytes"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.template.fallback_style = Some("Normal".to_string());
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }
}
