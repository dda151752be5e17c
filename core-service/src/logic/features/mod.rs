//! Features Module - URL Feature Contract
//!
//! `layout` is the schema shared by training and serving. Extractors fill a
//! `FeatureVector` in layout order:
//! - `lexical` - features computed from the URL string
//! - `page` - destination-page features, supplied by the caller or left at 0

pub mod layout;
pub mod lexical;
pub mod page;
pub mod vector;


use std::collections::HashMap;

pub use layout::{feature_index, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};
pub use lexical::{LexicalFeatures, UrlParts};
pub use page::PageFeatures;
pub use vector::{FeatureError, FeatureExtractor, FeatureVector};

/// Extract a complete vector from a bare URL.
///
/// Page-derived features are 0: a known accuracy ceiling, not an error.
pub fn extract(url: &str) -> FeatureVector {
    let mut vector = FeatureVector::new();
    LexicalFeatures::from_url(url).extract(&mut vector);
    vector
}

/// Extract from a URL and overlay measured page features
pub fn extract_with_page(url: &str, page: &HashMap<String, f64>) -> Result<FeatureVector, FeatureError> {
    let page = PageFeatures::from_map(page)?;
    let mut vector = extract(url);
    page.extract(&mut vector);
    Ok(vector)
}
