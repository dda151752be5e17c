//! URL Lexical Feature Extraction
//!
//! Derives the 18 URL-only features from the raw URL string. Pure and
//! deterministic: no network, no DNS, no page fetch.

use once_cell::sync::Lazy;
use regex::Regex;

use super::vector::{FeatureExtractor, FeatureVector};

/// Hosts longer than this are flagged as `RandomString`
pub const RANDOM_HOST_LEN: usize = 20;

/// Words counted by `NumSensitiveWords`
pub const SENSITIVE_WORDS: &[&str] = &["login", "verify", "secure", "update"];

// Generic URI split (RFC 3986, appendix B). Every input matches.
static URI_SPLIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(?:([a-z][a-z0-9+.\-]*):)?(?://([^/?#]*))?([^?#]*)(?:\?([^#]*))?(?:#(.*))?$")
        .expect("URI split pattern is valid")
});

// ============================================================================
// URL PARTS
// ============================================================================

/// Components of a lowercased URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts {
    pub scheme: String,
    pub authority: String,
    pub host: String,
    pub path: String,
    pub query: String,
    pub fragment: String,
}

impl UrlParts {
    /// Split a URL that is already lowercased. Never fails: anything that
    /// has no `//authority` simply ends up with an empty host.
    pub fn split(lowered: &str) -> Self {
        let Some(caps) = URI_SPLIT.captures(lowered) else {
            return Self::default();
        };

        let group = |i: usize| caps.get(i).map_or("", |m| m.as_str()).to_string();
        let authority = group(2);
        let host = host_from_authority(&authority);

        Self {
            scheme: group(1),
            host,
            authority,
            path: group(3),
            query: group(4),
            fragment: group(5),
        }
    }
}

fn host_from_authority(authority: &str) -> String {
    let hostinfo = authority.rsplit('@').next().unwrap_or("");

    if let Some(rest) = hostinfo.strip_prefix('[') {
        return rest.split(']').next().unwrap_or("").to_string();
    }

    hostinfo.split(':').next().unwrap_or("").to_string()
}

// ============================================================================
// LEXICAL FEATURES
// ============================================================================

/// URL-derived features, computed once per URL
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LexicalFeatures {
    pub num_dots: usize,
    pub subdomain_level: usize,
    pub path_level: usize,
    pub url_length: usize,
    pub num_dash: usize,
    pub num_dash_in_hostname: usize,
    pub at_symbol: bool,
    pub num_numeric_chars: usize,
    pub no_https: bool,
    pub ip_address: bool,
    pub num_query_components: usize,
    pub num_underscore: usize,
    pub num_percent: usize,
    pub num_ampersand: usize,
    pub num_hash: usize,
    pub random_string: bool,
    pub double_slash_in_path: bool,
    pub num_sensitive_words: usize,
}

impl LexicalFeatures {
    pub fn from_url(url: &str) -> Self {
        let u = url.to_lowercase();
        let parts = UrlParts::split(&u);
        let host = parts.host.as_str();

        let count = |s: &str, c: char| s.matches(c).count();

        Self {
            num_dots: count(&u, '.'),
            subdomain_level: count(host, '.'),
            // A bare host has no slashes at all; the raw formula would go negative
            path_level: count(&u, '/').saturating_sub(2),
            url_length: u.chars().count(),
            num_dash: count(&u, '-'),
            num_dash_in_hostname: count(host, '-'),
            at_symbol: u.contains('@'),
            num_numeric_chars: u.chars().filter(|c| c.is_ascii_digit()).count(),
            no_https: !u.starts_with("https://"),
            ip_address: is_numeric_host(host),
            num_query_components: count(&u, '&'),
            num_underscore: count(&u, '_'),
            num_percent: count(&u, '%'),
            num_ampersand: count(&u, '&'),
            num_hash: count(&u, '#'),
            random_string: host.chars().count() > RANDOM_HOST_LEN,
            double_slash_in_path: parts.path.contains("//"),
            num_sensitive_words: SENSITIVE_WORDS.iter().filter(|w| u.contains(*w)).count(),
        }
    }
}

/// Host made only of digits and dots, e.g. `192.168.1.1`
fn is_numeric_host(host: &str) -> bool {
    let digits: String = host.chars().filter(|c| *c != '.').collect();
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

impl FeatureExtractor for LexicalFeatures {
    fn extract(&self, vector: &mut FeatureVector) {
        let pairs: [(&str, f64); 18] = [
            ("NumDots", self.num_dots as f64),
            ("SubdomainLevel", self.subdomain_level as f64),
            ("PathLevel", self.path_level as f64),
            ("UrlLength", self.url_length as f64),
            ("NumDash", self.num_dash as f64),
            ("NumDashInHostname", self.num_dash_in_hostname as f64),
            ("AtSymbol", flag(self.at_symbol)),
            ("NumNumericChars", self.num_numeric_chars as f64),
            ("NoHttps", flag(self.no_https)),
            ("IpAddress", flag(self.ip_address)),
            ("NumQueryComponents", self.num_query_components as f64),
            ("NumUnderscore", self.num_underscore as f64),
            ("NumPercent", self.num_percent as f64),
            ("NumAmpersand", self.num_ampersand as f64),
            ("NumHash", self.num_hash as f64),
            ("RandomString", flag(self.random_string)),
            ("DoubleSlashInPath", flag(self.double_slash_in_path)),
            ("NumSensitiveWords", self.num_sensitive_words as f64),
        ];

        for (name, value) in pairs {
            vector.set_by_name(name, value);
        }
    }
}
