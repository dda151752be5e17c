//! Page-derived Features
//!
//! The last 14 layout entries describe the destination page (links, forms,
//! frames, title). Nothing in this crate fetches pages, so these stay at 0
//! unless a caller supplies measured values.

use std::collections::HashMap;

use super::layout::{feature_index, is_page_feature};
use super::vector::{FeatureError, FeatureExtractor, FeatureVector};

/// Caller-supplied page measurements, keyed by layout index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageFeatures {
    values: Vec<(usize, f64)>,
}

impl PageFeatures {
    /// No page data: every page feature keeps its neutral default
    pub fn none() -> Self {
        Self::default()
    }

    /// Accept only page-derived names. URL-derived names are refused so a
    /// caller cannot silently override what the URL itself says.
    pub fn from_map(values: &HashMap<String, f64>) -> Result<Self, FeatureError> {
        let mut out = Vec::with_capacity(values.len());

        for (name, value) in values {
            let index = feature_index(name)
                .filter(|&i| is_page_feature(i))
                .ok_or_else(|| FeatureError::InvalidValue {
                    name: name.clone(),
                    reason: "not a page-derived feature".to_string(),
                })?;

            if !value.is_finite() {
                return Err(FeatureError::NonFinite { name: name.clone() });
            }
            out.push((index, *value));
        }

        out.sort_by_key(|(i, _)| *i);
        Ok(Self { values: out })
    }
}

impl FeatureExtractor for PageFeatures {
    fn extract(&self, vector: &mut FeatureVector) {
        for (index, value) in &self.values {
            vector.set(*index, *value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_leaves_defaults() {
        let mut vector = FeatureVector::new();
        PageFeatures::none().extract(&mut vector);
        assert!(vector.as_slice().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_page_values_are_applied() {
        let mut map = HashMap::new();
        map.insert("IframeOrFrame".to_string(), 1.0);
        map.insert("PctExtHyperlinks".to_string(), 0.75);

        let page = PageFeatures::from_map(&map).unwrap();
        let mut vector = FeatureVector::new();
        page.extract(&mut vector);

        assert_eq!(vector.get_by_name("IframeOrFrame"), Some(1.0));
        assert_eq!(vector.get_by_name("PctExtHyperlinks"), Some(0.75));
        let set = vector.as_slice().iter().filter(|v| **v != 0.0).count();
        assert_eq!(set, 2);
    }

    #[test]
    fn test_url_feature_names_are_refused() {
        let mut map = HashMap::new();
        map.insert("IpAddress".to_string(), 1.0);
        assert!(PageFeatures::from_map(&map).is_err());
    }

    #[test]
    fn test_non_finite_is_refused() {
        let mut map = HashMap::new();
        map.insert("MissingTitle".to_string(), f64::INFINITY);
        assert!(matches!(
            PageFeatures::from_map(&map),
            Err(FeatureError::NonFinite { .. })
        ));
    }
}
