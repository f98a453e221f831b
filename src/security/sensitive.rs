//! Sensitive content detection
//!
//! Advisory scan for credentials and personal data. Matches are reported by
//! category and never block a conversion.

use once_cell::sync::Lazy;
use regex::Regex;

static SENSITIVE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("email address", r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"),
        (
            "phone number",
            r"(?:\+86)?\s*1[3-9]\d{9}\b|\(\d{3}\)\s*\d{3}-\d{4}|\d{3}-\d{3}-\d{4}",
        ),
        (
            "credit card number",
            r"\b(?:4[0-9]{12}(?:[0-9]{3})?|5[1-5][0-9]{14}|3[47][0-9]{13}|3[0-9]{13})\b",
        ),
        (
            "national ID number",
            r"\b[1-9]\d{5}(?:18|19|20)\d{2}(?:0[1-9]|1[0-2])(?:[0-2][1-9]|10|20|30|31)\d{3}[0-9Xx]\b",
        ),
        ("social security number", r"\b\d{3}-\d{2}-\d{4}\b"),
        ("GitHub personal access token", r"\bghp_[A-Za-z0-9]{36}\b"),
        ("GitHub OAuth token", r"\bgho_[A-Za-z0-9]{36}\b"),
        ("AWS access key", r"\bAKIA[A-Z0-9]{16}\b"),
        ("OpenAI API key", r"\bsk-[A-Za-z0-9]{48}\b"),
        ("Stripe API key", r"\b(?:sk|pk)_(?:test|live)_[A-Za-z0-9]{24,}\b"),
        ("JWT", r"\beyJ[A-Za-z0-9_-]*\.[A-Za-z0-9_-]*\.[A-Za-z0-9_-]*\b"),
        (
            "IP address",
            r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b",
        ),
        ("bank account number", r"\b[1-9]\d{12,19}\b"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).unwrap()))
    .collect()
});

/// Names of the sensitive-data categories found in `content`
pub fn detect(content: &str) -> Vec<&'static str> {
    SENSITIVE_PATTERNS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(content))
        .map(|(name, _)| *name)
        .collect()
}
