//! Decision Threshold
//!
//! Turns a phishing probability into a label. The cut-off is inclusive on
//! the phishing side: a score of exactly 0.50 is phishing.

use serde::{Deserialize, Serialize};

use crate::logic::label::Label;

/// Production decision threshold
pub const DEFAULT_THRESHOLD: f64 = 0.50;

/// Threshold Configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Scores at or above this are phishing
    pub phishing_min: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            phishing_min: DEFAULT_THRESHOLD,
        }
    }
}

impl ThresholdConfig {
    pub fn decide(&self, score: f64) -> Label {
        if score >= self.phishing_min {
            Label::Phishing
        } else {
            Label::Legitimate
        }
    }
}
