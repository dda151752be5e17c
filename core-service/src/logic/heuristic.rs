//! Heuristic URL Screen
//!
//! Cheap rule-based pre-check run before the model. A non-legitimate verdict
//! here short-circuits inference.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::logic::features::lexical::UrlParts;
use crate::logic::label::Label;

/// Words that make a URL look like a credential or payment page
pub const SUSPICIOUS_KEYWORDS: &[&str] = &[
    "login",
    "signin",
    "verify",
    "secure",
    "update",
    "confirm",
    "account",
    "otp",
    "password",
    "bank",
    "wallet",
    "unlock",
    "auth",
    "subscription",
    "recovery",
];

/// URLs longer than this are "long"
pub const LONG_URL_LEN: usize = 80;

pub const PHISHING_SCORE: f64 = 0.7;
pub const SUSPICIOUS_SCORE: f64 = 0.3;

const KEYWORD_WEIGHT: f64 = 0.4;
const LONG_URL_WEIGHT: f64 = 0.15;
const IP_HOST_WEIGHT: f64 = 0.25;
const NO_HTTPS_WEIGHT: f64 = 0.1;
const PUNYCODE_WEIGHT: f64 = 0.2;
const AT_SYMBOL_WEIGHT: f64 = 0.2;

// Dotted quad anywhere in the host, so `1.2.3.4.nip.io` counts too
static DOTTED_QUAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{1,3}(?:\.\d{1,3}){3}\b").expect("dotted quad pattern is valid")
});

/// Which optional rules are active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeuristicOptions {
    pub flag_keywords: bool,
    pub flag_long_urls: bool,
}

impl Default for HeuristicOptions {
    fn default() -> Self {
        Self {
            flag_keywords: true,
            flag_long_urls: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Legitimate,
    Suspicious,
    Phishing,
}

impl Verdict {
    pub fn from_score(score: f64) -> Self {
        if score >= PHISHING_SCORE {
            Verdict::Phishing
        } else if score >= SUSPICIOUS_SCORE {
            Verdict::Suspicious
        } else {
            Verdict::Legitimate
        }
    }
}

impl From<Label> for Verdict {
    fn from(label: Label) -> Self {
        match label {
            Label::Phishing => Verdict::Phishing,
            Label::Legitimate => Verdict::Legitimate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicVerdict {
    pub level: Verdict,
    pub score: f64,
    pub reasons: Vec<String>,
}

impl HeuristicVerdict {
    pub fn is_clean(&self) -> bool {
        self.level == Verdict::Legitimate
    }
}

/// Score a URL against the rule set
pub fn screen(url: &str, options: &HeuristicOptions) -> HeuristicVerdict {
    let lowered = url.to_lowercase();
    let parts = UrlParts::split(&lowered);
    let host = parts.host.as_str();

    let mut score = 0.0;
    let mut reasons = Vec::new();

    if options.flag_keywords {
        if let Some(word) = SUSPICIOUS_KEYWORDS.iter().find(|w| lowered.contains(*w)) {
            score += KEYWORD_WEIGHT;
            reasons.push(format!("keyword '{}'", word));
        }
    }

    if options.flag_long_urls && url.chars().count() > LONG_URL_LEN {
        score += LONG_URL_WEIGHT;
        reasons.push("long url".to_string());
    }

    if has_ipv4(host) {
        score += IP_HOST_WEIGHT;
        reasons.push("ip host".to_string());
    }

    // Literal prefix: `https:evil.com` has the scheme but no authority
    if !lowered.starts_with("https://") {
        score += NO_HTTPS_WEIGHT;
        reasons.push("no https".to_string());
    }

    if host.contains("xn--") {
        score += PUNYCODE_WEIGHT;
        reasons.push("punycode host".to_string());
    }

    if url.contains('@') {
        score += AT_SYMBOL_WEIGHT;
        reasons.push("'@' in url".to_string());
    }

    let score: f64 = f64::min(score, 1.0);
    HeuristicVerdict {
        level: Verdict::from_score(score),
        score,
        reasons,
    }
}

fn has_ipv4(host: &str) -> bool {
    DOTTED_QUAD.is_match(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_plain_https_is_clean() {
        let v = screen("https://example.com/", &HeuristicOptions::default());
        assert_eq!(v.level, Verdict::Legitimate);
        assert!(approx(v.score, 0.0));
        assert!(v.reasons.is_empty());
    }

    #[test]
    fn test_ip_login_at_is_phishing() {
        let v = screen("http://192.168.1.1/login@evil.com", &HeuristicOptions::default());
        // keyword + ip + no https + '@'
        assert!(approx(v.score, 0.95));
        assert_eq!(v.level, Verdict::Phishing);
        assert_eq!(v.reasons.len(), 4);
    }

    #[test]
    fn test_keyword_toggle() {
        let url = "https://example.com/account";
        let on = screen(url, &HeuristicOptions::default());
        let off = screen(url, &HeuristicOptions { flag_keywords: false, flag_long_urls: true });
        assert_eq!(on.level, Verdict::Suspicious);
        assert_eq!(off.level, Verdict::Legitimate);
    }

    #[test]
    fn test_long_url_toggle() {
        let url = format!("https://example.com/{}", "a".repeat(LONG_URL_LEN));
        let on = screen(&url, &HeuristicOptions::default());
        let off = screen(&url, &HeuristicOptions { flag_keywords: true, flag_long_urls: false });
        assert!(approx(on.score, LONG_URL_WEIGHT));
        assert!(approx(off.score, 0.0));
    }

    #[test]
    fn test_punycode() {
        let v = screen("https://xn--pple-43d.com/", &HeuristicOptions::default());
        assert!(approx(v.score, PUNYCODE_WEIGHT));
    }

    #[test]
    fn test_score_is_capped() {
        let url = format!("http://xn--80ak6aa92e.1.2.3.4/login@x/{}", "a".repeat(100));
        let v = screen(&url, &HeuristicOptions::default());
        assert!(v.score <= 1.0);
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(Verdict::from_score(0.7), Verdict::Phishing);
        assert_eq!(Verdict::from_score(0.69), Verdict::Suspicious);
        assert_eq!(Verdict::from_score(0.3), Verdict::Suspicious);
        assert_eq!(Verdict::from_score(0.29), Verdict::Legitimate);
    }

    #[test]
    fn test_has_ipv4() {
        assert!(has_ipv4("10.0.0.1"));
        assert!(has_ipv4("1.2.3.4.nip.io"));
        assert!(has_ipv4("login-10.0.0.1.example.com"));
        assert!(!has_ipv4("10.0.0"));
        assert!(!has_ipv4("example.com"));
    }

    #[test]
    fn test_ip_prefixed_host_is_flagged() {
        let v = screen("http://1.2.3.4.nip.io/", &HeuristicOptions::default());
        assert!(v.reasons.contains(&"ip host".to_string()));
        // ip + no https
        assert!(approx(v.score, IP_HOST_WEIGHT + NO_HTTPS_WEIGHT));
        assert_eq!(v.level, Verdict::Suspicious);
    }

    #[test]
    fn test_https_without_slashes_is_not_https() {
        let v = screen("https:evil.com/x", &HeuristicOptions::default());
        assert_eq!(v.reasons, vec!["no https".to_string()]);
        assert!(approx(v.score, NO_HTTPS_WEIGHT));
    }

    #[test]
    fn test_uppercase_https_scheme_is_https() {
        let v = screen("HTTPS://Example.com/", &HeuristicOptions::default());
        assert!(v.reasons.is_empty());
    }
}
