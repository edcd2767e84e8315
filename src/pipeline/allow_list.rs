//! Static allow-list of well-known destinations
//!
//! Matching is exact: a domain entry covers that host (with or without a
//! leading `www.`) but not its other subdomains, and a URL entry covers that
//! URL in raw or normalized form.

use std::collections::HashSet;

use crate::utils::extract_host;

/// Domains that are never sent through full analysis
pub const CURATED_DOMAINS: &[&str] = &[
    "google.com",
    "naver.com",
    "daum.net",
    "kakao.com",
    "youtube.com",
    "github.com",
    "microsoft.com",
    "apple.com",
    "amazon.com",
    "wikipedia.org",
];

/// Individual URLs that are never sent through full analysis
pub const CURATED_URLS: &[&str] = &[
    "https://www.google.com",
    "https://www.naver.com",
    "https://www.daum.net",
];

#[derive(Debug, Clone, Default)]
pub struct AllowList {
    domains: HashSet<String>,
    urls: HashSet<String>,
}

impl AllowList {
    pub fn new<D, U>(domains: D, urls: U) -> Self
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
        U: IntoIterator,
        U::Item: AsRef<str>,
    {
        Self {
            domains: domains
                .into_iter()
                .map(|d| strip_www(&d.as_ref().trim().to_ascii_lowercase()).to_string())
                .filter(|d| !d.is_empty())
                .collect(),
            urls: urls
                .into_iter()
                .map(|u| canonical_url(u.as_ref()))
                .filter(|u| !u.is_empty())
                .collect(),
        }
    }

    /// Curated entries plus deployment-specific additions
    #[must_use]
    pub fn curated_with(extra_domains: &[String], extra_urls: &[String]) -> Self {
        Self::new(
            CURATED_DOMAINS
                .iter()
                .copied()
                .chain(extra_domains.iter().map(String::as_str)),
            CURATED_URLS
                .iter()
                .copied()
                .chain(extra_urls.iter().map(String::as_str)),
        )
    }

    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        if self.urls.contains(&canonical_url(url)) {
            return true;
        }
        extract_host(url).is_some_and(|host| self.domains.contains(strip_www(&host)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.domains.len() + self.urls.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty() && self.urls.is_empty()
    }
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Trimmed, with a lone trailing root slash removed so that
/// `https://www.google.com` and `https://www.google.com/` compare equal
fn canonical_url(url: &str) -> String {
    let url = url.trim();
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let rest = match rest.strip_suffix('/') {
        Some(authority) if !authority.contains(['/', '?', '#']) => authority,
        _ => rest,
    };
    format!("{}://{}", scheme.to_ascii_lowercase(), rest)
}
