//! Feature Vector - Core data structure for classifier input
//!
//! **Versioned feature vector with layout validation**
//!
//! Uses centralized layout from `layout.rs` for:
//! - Consistent feature ordering between training and serving
//! - Version tracking
//! - Layout hash for compatibility checks

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::layout::{feature_index, layout_hash, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};

// ============================================================================
// ERRORS
// ============================================================================

/// A supplied feature value could not be turned into a number
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureError {
    #[error("feature '{name}' is not numeric: {reason}")]
    InvalidValue { name: String, reason: String },

    #[error("feature '{name}' is not finite")]
    NonFinite { name: String },
}

// ============================================================================
// VERSIONED FEATURE VECTOR
// ============================================================================

/// Versioned Feature Vector with layout metadata
///
/// Values are always complete and in `FEATURE_LAYOUT` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout (for mismatch detection)
    pub layout_hash: u32,
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Create a new zeroed feature vector with current version
    pub fn new() -> Self {
        Self::from_values([0.0; FEATURE_COUNT])
    }

    /// Create from raw values already in layout order
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }

    /// Complete a partial name → value mapping against the layout.
    ///
    /// Missing names and explicit `null` become 0.0. Names outside the layout
    /// are ignored. A present value that is not a number (or a numeric string,
    /// or a boolean) is rejected instead of defaulted.
    pub fn complete_with_defaults(partial: &Map<String, Value>) -> Result<Self, FeatureError> {
        let mut values = [0.0f64; FEATURE_COUNT];

        for (i, name) in FEATURE_LAYOUT.iter().enumerate() {
            if let Some(raw) = partial.get(*name) {
                values[i] = coerce_value(name, raw)?;
            }
        }

        Ok(Self::from_values(values))
    }

    /// Get values as array reference
    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    /// Get values as slice
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Get feature by index
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Get feature by name
    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        feature_index(name).and_then(|i| self.get(i))
    }

    /// Set feature by index
    pub fn set(&mut self, index: usize, value: f64) {
        if index < FEATURE_COUNT {
            self.values[index] = value;
        }
    }

    /// Set feature by name
    pub fn set_by_name(&mut self, name: &str, value: f64) -> bool {
        if let Some(index) = feature_index(name) {
            self.set(index, value);
            true
        } else {
            false
        }
    }

    /// (name, value) pairs in layout order
    pub fn named_values(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_LAYOUT.iter().copied().zip(self.values.iter().copied())
    }

    /// Convert to JSON for debug logging, preserving layout order
    pub fn to_log_entry(&self) -> Value {
        let named: Map<String, Value> = self
            .named_values()
            .map(|(name, value)| (name.to_string(), Value::from(value)))
            .collect();

        serde_json::json!({
            "feature_version": self.version,
            "layout_hash": self.layout_hash,
            "named_values": named,
        })
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f64; FEATURE_COUNT]) -> Self {
        Self::from_values(values)
    }
}

fn coerce_value(name: &str, raw: &Value) -> Result<f64, FeatureError> {
    let value = match raw {
        Value::Null => return Ok(0.0),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => n.as_f64().ok_or_else(|| FeatureError::InvalidValue {
            name: name.to_string(),
            reason: format!("{} is out of range", n),
        })?,
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| FeatureError::InvalidValue {
            name: name.to_string(),
            reason: format!("cannot parse {:?} as a number", s),
        })?,
        Value::Array(_) => {
            return Err(FeatureError::InvalidValue {
                name: name.to_string(),
                reason: "arrays are not accepted".to_string(),
            })
        }
        Value::Object(_) => {
            return Err(FeatureError::InvalidValue {
                name: name.to_string(),
                reason: "objects are not accepted".to_string(),
            })
        }
    };

    if !value.is_finite() {
        return Err(FeatureError::NonFinite { name: name.to_string() });
    }

    Ok(value)
}

// ============================================================================
// FEATURE EXTRACTOR TRAIT
// ============================================================================

/// Trait for feature extractors
pub trait FeatureExtractor {
    /// Extract features and update the vector
    fn extract(&self, vector: &mut FeatureVector);
}

// ============================================================================
// TESTS
// ============================================================================
