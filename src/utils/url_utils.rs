//! URL helpers shared by the pipeline, the allow-list and the store adapter.

use url::Url;

use super::constants::CACHE_KEY_PREFIX;

/// Extract the lowercase host of a URL, tolerating a missing scheme.
///
/// `"Example.com/login"` and `"https://example.com:8443/"` both yield
/// `Some("example.com")`.
#[must_use]
pub fn extract_host(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = if trimmed.contains("://") {
        Url::parse(trimmed).ok()?
    } else {
        Url::parse(&format!("http://{trimmed}")).ok()?
    };

    parsed.host_str().map(str::to_ascii_lowercase)
}

/// Cache-tier key for a (normalized) URL.
#[must_use]
pub fn cache_key(url: &str) -> String {
    format!("{CACHE_KEY_PREFIX}{url}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_host_variants() {
        assert_eq!(extract_host("https://www.google.com"), Some("www.google.com".to_string()));
        assert_eq!(extract_host("Example.COM/login"), Some("example.com".to_string()));
        assert_eq!(extract_host("https://example.com:8443/a?b=c"), Some("example.com".to_string()));
        assert_eq!(extract_host("   "), None);
    }

    #[test]
    fn test_cache_key_prefix() {
        assert_eq!(cache_key("https://www.a.com/"), "phishing:https://www.a.com/");
    }
}
