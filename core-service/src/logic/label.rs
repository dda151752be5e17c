//! Label Normalization
//!
//! Training data arrives with heterogeneous label encodings. This module maps
//! them onto the canonical binary `Label` and keeps count of what was dropped.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical binary label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Legitimate = 0,
    Phishing = 1,
}

impl Label {
    pub fn as_index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Label::Legitimate),
            1 => Some(Label::Phishing),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Legitimate => "legitimate",
            Label::Phishing => "phishing",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A label exactly as read from a dataset
#[derive(Debug, Clone, PartialEq)]
pub enum RawLabel {
    Missing,
    Number(f64),
    Text(String),
}

/// Cell spellings that mean "no value" (compared case-insensitively)
const MISSING_MARKERS: &[&str] = &["na", "n/a", "nan", "-nan", "<na>", "#n/a", "null", "none"];

impl RawLabel {
    /// Interpret a CSV cell: empty or NA marker → missing, numeric → number,
    /// else text. Non-finite numbers count as missing.
    pub fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty()
            || MISSING_MARKERS.iter().any(|m| trimmed.eq_ignore_ascii_case(m))
        {
            return RawLabel::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => RawLabel::Number(n),
            Ok(_) => RawLabel::Missing,
            Err(_) => RawLabel::Text(trimmed.to_string()),
        }
    }
}

const PHISHING_WORDS: &[&str] = &["phishing", "malicious", "bad"];
const LEGITIMATE_WORDS: &[&str] = &["legit", "legitimate", "benign", "good"];

/// Map a raw label onto `Label`; `None` means the row must be excluded
pub fn normalize(raw: &RawLabel) -> Option<Label> {
    match raw {
        RawLabel::Missing => None,
        RawLabel::Number(n) => {
            if *n == 1.0 {
                Some(Label::Phishing)
            } else if *n == 0.0 || *n == -1.0 {
                Some(Label::Legitimate)
            } else {
                None
            }
        }
        RawLabel::Text(s) => {
            let lowered = s.trim().to_lowercase();
            if PHISHING_WORDS.contains(&lowered.as_str()) {
                Some(Label::Phishing)
            } else if LEGITIMATE_WORDS.contains(&lowered.as_str()) {
                Some(Label::Legitimate)
            } else {
                None
            }
        }
    }
}

// ============================================================================
// SUMMARY
// ============================================================================

/// Maximum distinct unmapped values remembered for diagnostics
const MAX_UNMAPPED_SAMPLES: usize = 10;

/// Running count of kept and dropped labels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelSummary {
    pub kept_phishing: usize,
    pub kept_legitimate: usize,
    pub dropped_missing: usize,
    pub dropped_unmapped: usize,
    /// First few unmapped raw values with their counts
    pub unmapped_values: BTreeMap<String, usize>,
}

impl LabelSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize and count in one step
    pub fn record(&mut self, raw: &RawLabel) -> Option<Label> {
        let label = normalize(raw);
        match (label, raw) {
            (Some(Label::Phishing), _) => self.kept_phishing += 1,
            (Some(Label::Legitimate), _) => self.kept_legitimate += 1,
            (None, RawLabel::Missing) => self.dropped_missing += 1,
            (None, RawLabel::Number(n)) => self.note_unmapped(n.to_string()),
            (None, RawLabel::Text(s)) => self.note_unmapped(s.clone()),
        }
        label
    }

    fn note_unmapped(&mut self, value: String) {
        self.dropped_unmapped += 1;
        if let Some(count) = self.unmapped_values.get_mut(&value) {
            *count += 1;
        } else if self.unmapped_values.len() < MAX_UNMAPPED_SAMPLES {
            self.unmapped_values.insert(value, 1);
        }
    }

    pub fn kept(&self) -> usize {
        self.kept_phishing + self.kept_legitimate
    }

    pub fn dropped(&self) -> usize {
        self.dropped_missing + self.dropped_unmapped
    }

    /// Emit the summary; drops are a warning because they shift the class balance
    pub fn log(&self) {
        log::info!(
            "Labels: {} kept ({} phishing / {} legitimate)",
            self.kept(),
            self.kept_phishing,
            self.kept_legitimate
        );
        if self.dropped() > 0 {
            log::warn!(
                "Labels: {} rows excluded ({} missing, {} unmapped: {:?})",
                self.dropped(),
                self.dropped_missing,
                self.dropped_unmapped,
                self.unmapped_values
            );
        }
    }
}
