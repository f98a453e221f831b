//! Localized user-facing text
//!
//! Notices written into generated documents and the messages of errors that
//! reach the user come from a small keyed table. Log output stays English.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Languages the message table covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "zh-CN")]
    ZhCn,
    #[default]
    #[serde(rename = "en")]
    En,
    #[serde(rename = "zh-TW")]
    ZhTw,
    #[serde(rename = "ja")]
    Ja,
    #[serde(rename = "ko")]
    Ko,
}

/// Variables consulted, in order, when detecting the language from the locale
pub const LOCALE_VARS: [&str; 3] = ["LANG", "LANGUAGE", "LC_ALL"];

impl Language {
    pub const ALL: [Language; 5] = [
        Language::ZhCn,
        Language::En,
        Language::ZhTw,
        Language::Ja,
        Language::Ko,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Language::ZhCn => "zh-CN",
            Language::En => "en",
            Language::ZhTw => "zh-TW",
            Language::Ja => "ja",
            Language::Ko => "ko",
        }
    }

    /// Parse a configured language code such as `zh-CN` or `zh_cn`
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().replace('_', "-");
        Language::ALL
            .into_iter()
            .find(|language| language.code().eq_ignore_ascii_case(&code))
    }

    /// Language named by a POSIX locale or language tag (`zh_CN.UTF-8`, `ja-JP`)
    pub fn from_locale(locale: &str) -> Option<Self> {
        let tag = locale
            .split(['.', '@'])
            .next()
            .unwrap_or_default()
            .replace('_', "-")
            .to_ascii_lowercase();
        let (primary, region) = match tag.split_once('-') {
            Some((primary, region)) => (primary, Some(region)),
            None => (tag.as_str(), None),
        };

        match (primary, region) {
            ("zh", Some("tw" | "hk" | "mo" | "hant")) => Some(Language::ZhTw),
            ("zh", _) => Some(Language::ZhCn),
            ("ja", _) => Some(Language::Ja),
            ("ko", _) => Some(Language::Ko),
            ("en", _) => Some(Language::En),
            _ => None,
        }
    }

    /// First recognizable language among the locale variables
    pub fn detect<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        LOCALE_VARS
            .iter()
            .filter_map(|key| lookup(key))
            .find_map(|value| {
                // LANGUAGE may hold a colon-separated preference list
                value.split(':').find_map(Language::from_locale)
            })
    }

    /// Render `message` in this language
    pub fn text(self, message: &Message<'_>) -> Cow<'static, str> {
        let template = message.template(self);
        let args = message.args();
        if args.is_empty() {
            return Cow::Borrowed(template);
        }

        let mut text = template.to_string();
        for (name, value) in args {
            text = text.replace(&format!("{{{name}}}"), &value);
        }
        Cow::Owned(text)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A user-facing message and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message<'a> {
    ImageBlocked,
    ImageLoadFailed { src: &'a str },
    EmptyInput,
    TooLarge { size: usize, limit: usize },
    TooManyImages { count: usize, limit: usize },
    TooManyTables { count: usize, limit: usize },
    MissingAccessUrl,
}

impl Message<'_> {
    fn args(&self) -> Vec<(&'static str, String)> {
        match self {
            Message::ImageLoadFailed { src } => vec![("src", src.to_string())],
            Message::TooLarge { size, limit } => {
                vec![("size", size.to_string()), ("limit", limit.to_string())]
            }
            Message::TooManyImages { count, limit } | Message::TooManyTables { count, limit } => {
                vec![("count", count.to_string()), ("limit", limit.to_string())]
            }
            Message::ImageBlocked | Message::EmptyInput | Message::MissingAccessUrl => Vec::new(),
        }
    }

    fn template(&self, language: Language) -> &'static str {
        use Language::*;

        match self {
            Message::ImageBlocked => match language {
                ZhCn => "图片已阻止：不安全的URL",
                En => "Image blocked: Unsafe URL",
                ZhTw => "圖片已阻止：不安全的URL",
                Ja => "画像をブロック：安全でないURL",
                Ko => "이미지 차단됨: 안전하지 않은 URL",
            },
            Message::ImageLoadFailed { .. } => match language {
                ZhCn => "图片加载失败：{src}",
                En => "Failed to load image: {src}",
                ZhTw => "圖片載入失敗：{src}",
                Ja => "画像の読み込みに失敗：{src}",
                Ko => "이미지 로드 실패: {src}",
            },
            Message::EmptyInput => match language {
                ZhCn => "无效的 Markdown 内容：必须是非空字符串",
                En => "Invalid markdown content: must be a non-empty string",
                ZhTw => "無效的 Markdown 內容：必須是非空字符串",
                Ja => "無効なMarkdownコンテンツ：空でない文字列である必要があります",
                Ko => "잘못된 Markdown 콘텐츠: 비어있지 않은 문자열이어야 합니다",
            },
            Message::TooLarge { .. } => match language {
                ZhCn => "Markdown 内容过大（{size} 字节）。最大限制：{limit} 字节",
                En => "Markdown content too large ({size} bytes). Maximum size: {limit} bytes",
                ZhTw => "Markdown 內容過大（{size} 位元組）。最大限制：{limit} 位元組",
                Ja => "Markdownコンテンツが大きすぎます（{size} バイト）。最大制限：{limit} バイト",
                Ko => "Markdown 콘텐츠가 너무 큽니다({size} 바이트). 최대 제한: {limit} 바이트",
            },
            Message::TooManyImages { .. } => match language {
                ZhCn => "图片数量过多（{count}）。最大允许：{limit}",
                En => "Too many images ({count}). Maximum allowed: {limit}",
                ZhTw => "圖片數量過多（{count}）。最大允許：{limit}",
                Ja => "画像が多すぎます（{count}）。最大許可数：{limit}",
                Ko => "이미지가 너무 많습니다({count}). 최대 허용: {limit}",
            },
            Message::TooManyTables { .. } => match language {
                ZhCn => "表格数量过多（约 {count}）。最大允许：{limit}",
                En => "Too many tables (about {count}). Maximum allowed: {limit}",
                ZhTw => "表格數量過多（約 {count}）。最大允許：{limit}",
                Ja => "テーブルが多すぎます（約 {count}）。最大許可数：{limit}",
                Ko => "테이블이 너무 많습니다(약 {count}). 최대 허용: {limit}",
            },
            Message::MissingAccessUrl => match language {
                ZhCn => "上传失败：返回结果中没有访问URL",
                En => "Upload failed: No access URL in result",
                ZhTw => "上傳失敗：返回結果中沒有訪問URL",
                Ja => "アップロードに失敗：結果にアクセスURLがありません",
                Ko => "업로드 실패: 결과에 액세스 URL이 없음",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_codes_round_trip() {
        for language in Language::ALL {
            assert_eq!(Language::from_code(language.code()), Some(language));
        }
        assert_eq!(Language::from_code("zh_cn"), Some(Language::ZhCn));
        assert_eq!(Language::from_code("fr"), None);
    }

    #[test]
    fn test_from_locale() {
        assert_eq!(Language::from_locale("zh_CN.UTF-8"), Some(Language::ZhCn));
        assert_eq!(Language::from_locale("zh_TW.UTF-8"), Some(Language::ZhTw));
        assert_eq!(Language::from_locale("ja_JP"), Some(Language::Ja));
        assert_eq!(Language::from_locale("ko-KR"), Some(Language::Ko));
        assert_eq!(Language::from_locale("en_US.UTF-8"), Some(Language::En));
        assert_eq!(Language::from_locale("C.UTF-8"), None);
        assert_eq!(Language::from_locale("POSIX"), None);
    }

    #[test]
    fn test_detect_skips_unknown_locales() {
        let vars: HashMap<&str, &str> = [("LANG", "C.UTF-8"), ("LANGUAGE", "fr:ja_JP")]
            .into_iter()
            .collect();
        let detected = Language::detect(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(detected, Some(Language::Ja));
        assert_eq!(Language::detect(|_| None), None);
    }

    #[test]
    fn test_text_substitutes_arguments() {
        let message = Message::ImageLoadFailed { src: "logo" };
        assert_eq!(Language::En.text(&message), "Failed to load image: logo");
        assert_eq!(Language::ZhCn.text(&message), "图片加载失败：logo");

        let message = Message::TooManyImages { count: 51, limit: 50 };
        assert_eq!(
            Language::En.text(&message),
            "Too many images (51). Maximum allowed: 50"
        );
    }

    #[test]
    fn test_every_message_has_text_in_every_language() {
        let messages = [
            Message::ImageBlocked,
            Message::ImageLoadFailed { src: "x" },
            Message::EmptyInput,
            Message::TooLarge { size: 2, limit: 1 },
            Message::TooManyImages { count: 2, limit: 1 },
            Message::TooManyTables { count: 2, limit: 1 },
            Message::MissingAccessUrl,
        ];
        for language in Language::ALL {
            for message in &messages {
                let text = language.text(message);
                assert!(!text.is_empty());
                assert!(!text.contains('{'), "{language}: unfilled {text}");
            }
        }
    }

    #[test]
    fn test_serde_uses_codes() {
        #[derive(Deserialize)]
        struct Holder {
            language: Language,
        }
        let holder: Holder = toml::from_str("language = \"zh-TW\"").unwrap();
        assert_eq!(holder.language, Language::ZhTw);
    }
}
