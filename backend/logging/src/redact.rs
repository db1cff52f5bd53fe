//! Log Redaction
//!
//! Scrubs provider keys and bearer tokens from strings prior to logging.
//! Upstream error bodies can echo request details, so they pass through here.

use regex::Regex;
use std::sync::LazyLock;

static GOOGLE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"AIza[0-9A-Za-z\-_]{20,}").unwrap());
static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9\-_]{20,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap()
});
static QUERY_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([?&](?:key|api_key)=)[^&\s]+").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = GOOGLE_KEY_RE.replace_all(input, "[REDACTED_KEY]");
    let redacted = API_KEY_RE.replace_all(&redacted, "[REDACTED_TOKEN]");
    QUERY_KEY_RE
        .replace_all(&redacted, "${1}[REDACTED]")
        .into_owned()
}

/// Short display form of a secret: `abcd1234...wxyz`.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len().max(3));
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrubs_google_key_and_bearer() {
        let raw = "POST failed for AIzaSyA1234567890abcdefghijKLM with Bearer eyJhbGciOiJIUzI1NiJ9";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("AIzaSyA1234567890abcdefghijKLM"));
        assert!(!clean.contains("eyJhbGciOiJIUzI1NiJ9"));
        assert!(clean.contains("[REDACTED_KEY]"));
    }

    #[test]
    fn scrubs_openai_key() {
        let clean = redact_sensitive_data("key sk-proj-abcdefghijklmnopqrstuvwx rejected");
        assert_eq!(clean, "key [REDACTED_TOKEN] rejected");
    }

    #[test]
    fn scrubs_query_key() {
        let clean = redact_sensitive_data("https://host/v1/models?key=secret123&pageSize=10");
        assert_eq!(clean, "https://host/v1/models?key=[REDACTED]&pageSize=10");
    }

    #[test]
    fn masks_long_and_short_secrets() {
        assert_eq!(mask_secret("AIzaSyA1234567890wxyz"), "AIzaSyA1...wxyz");
        assert_eq!(mask_secret("short"), "*****");
        assert_eq!(mask_secret(""), "***");
    }
}
