//! Navigation-target normalization
//!
//! Phishing links arrive in every shape (bare hosts from QR payloads, mixed
//! case schemes, missing paths). Before navigation they are brought into one
//! canonical form so that the same target always maps to the same cache key
//! and detection record.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use url::Url;

/// Scheme assumed when the input carries none
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DefaultScheme {
    Http,
    #[default]
    Https,
}

impl DefaultScheme {
    fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

/// Normalization rules applied before every navigation attempt.
///
/// Forcing `www.` is a deployment policy, not a correctness requirement;
/// it can be turned off per deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationPolicy {
    pub force_www: bool,
    pub default_scheme: DefaultScheme,
    pub append_root_slash: bool,
}

impl Default for NormalizationPolicy {
    fn default() -> Self {
        Self {
            force_www: true,
            default_scheme: DefaultScheme::Https,
            append_root_slash: true,
        }
    }
}

/// Why an input could not be turned into a navigable URL
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("URL is empty")]
    Empty,
    #[error("unsupported scheme '{0}'")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
    #[error("malformed URL: {0}")]
    Malformed(String),
}

impl NormalizationPolicy {
    /// Bring `raw` into canonical form. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `NormalizeError` for empty input, non-http(s) schemes and
    /// inputs that do not parse as URLs after normalization.
    pub fn normalize(&self, raw: &str) -> Result<String, NormalizeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(NormalizeError::Empty);
        }

        let (scheme, rest) = match trimmed.split_once("://") {
            Some((scheme, rest)) => {
                let scheme = scheme.to_ascii_lowercase();
                if scheme != "http" && scheme != "https" {
                    return Err(NormalizeError::UnsupportedScheme(scheme));
                }
                (scheme, rest)
            }
            None => (self.default_scheme.as_str().to_string(), trimmed),
        };

        let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        let (authority, remainder) = rest.split_at(authority_end);
        if authority.is_empty() {
            return Err(NormalizeError::MissingHost);
        }

        let authority = canonical_authority(authority, self.force_www);

        let remainder = if remainder.is_empty() && self.append_root_slash {
            "/"
        } else {
            remainder
        };

        let normalized = format!("{scheme}://{authority}{remainder}");
        Url::parse(&normalized).map_err(|e| NormalizeError::Malformed(e.to_string()))?;

        Ok(normalized)
    }
}

/// Lowercase the host part of an authority and, with `force_www`, prefix
/// it with `www.` unless it already has it or is an address/localhost, where
/// a `www.` label would never resolve. Userinfo and port are kept verbatim.
fn canonical_authority(authority: &str, force_www: bool) -> String {
    let (userinfo, host_port) = match authority.rsplit_once('@') {
        Some((userinfo, host_port)) => (Some(userinfo), host_port),
        None => (None, authority),
    };

    let host_end = if host_port.starts_with('[') {
        host_port.find(']').map_or(host_port.len(), |i| i + 1)
    } else {
        host_port.find(':').unwrap_or(host_port.len())
    };
    let (host, port) = host_port.split_at(host_end);
    let host = host.to_ascii_lowercase();

    let skip = !force_www
        || host.starts_with('[')
        || host.starts_with("www.")
        || host == "localhost"
        || host.parse::<IpAddr>().is_ok();

    let host = if skip { host } else { format!("www.{host}") };

    match userinfo {
        Some(userinfo) => format!("{userinfo}@{host}{port}"),
        None => format!("{host}{port}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(raw: &str) -> String {
        NormalizationPolicy::default()
            .normalize(raw)
            .expect("input should normalize")
    }

    #[test]
    fn test_bare_host_gets_scheme_www_and_slash() {
        assert_eq!(normalize("example.com"), "https://www.example.com/");
        assert_eq!(normalize("  example.com  "), "https://www.example.com/");
    }

    #[test]
    fn test_existing_scheme_is_kept() {
        assert_eq!(normalize("http://example.com"), "http://www.example.com/");
        assert_eq!(normalize("HTTPS://www.example.com"), "https://www.example.com/");
    }

    #[test]
    fn test_slash_not_appended_with_query_or_fragment() {
        assert_eq!(normalize("example.com?a=1"), "https://www.example.com?a=1");
        assert_eq!(normalize("example.com#top"), "https://www.example.com#top");
        assert_eq!(normalize("example.com/login"), "https://www.example.com/login");
    }

    #[test]
    fn test_addresses_are_not_prefixed() {
        assert_eq!(normalize("http://127.0.0.1:8080"), "http://127.0.0.1:8080/");
        assert_eq!(normalize("localhost:3000/a"), "https://localhost:3000/a");
        assert_eq!(normalize("http://[::1]/"), "http://[::1]/");
    }

    #[test]
    fn test_port_and_userinfo_preserved() {
        assert_eq!(normalize("example.com:8443"), "https://www.example.com:8443/");
        assert_eq!(normalize("https://user@example.com/x"), "https://user@www.example.com/x");
    }

    #[test]
    fn test_host_is_lowercased() {
        assert_eq!(normalize("Example.COM"), "https://www.example.com/");
        assert_eq!(normalize("WWW.Example.com/Login"), "https://www.example.com/Login");
        assert_eq!(
            normalize("HTTP://User@EXAMPLE.com:8443/Path?Q=1"),
            "http://User@www.example.com:8443/Path?Q=1"
        );
        assert_eq!(normalize("http://LOCALHOST:3000"), "http://localhost:3000/");

        let no_www = NormalizationPolicy {
            force_www: false,
            ..NormalizationPolicy::default()
        };
        assert_eq!(no_www.normalize("Example.COM").as_deref(), Ok("https://example.com/"));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for raw in ["example.com", "http://a.b.c/d?e#f", "www.x.org", "10.0.0.1", "Mixed.Case.ORG/A"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_policy_switches() {
        let policy = NormalizationPolicy {
            force_www: false,
            default_scheme: DefaultScheme::Http,
            append_root_slash: false,
        };
        assert_eq!(policy.normalize("example.com").as_deref(), Ok("http://example.com"));
    }

    #[test]
    fn test_rejects_bad_input() {
        let policy = NormalizationPolicy::default();
        assert_eq!(policy.normalize("   "), Err(NormalizeError::Empty));
        assert_eq!(
            policy.normalize("ftp://example.com"),
            Err(NormalizeError::UnsupportedScheme("ftp".into()))
        );
        assert_eq!(policy.normalize("https:///path"), Err(NormalizeError::MissingHost));
    }
}
