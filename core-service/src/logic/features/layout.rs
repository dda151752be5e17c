//! Feature Layout - Centralized URL Feature Definition
//!
//! **CRITICAL: This file controls the feature schema**
//!
//! ## Rules (NEVER break these):
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! Every trained artifact stores the layout it was trained with. A change here
//! makes all previously trained artifacts unloadable.

use crc32fast::Hasher;

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Feature names in exact order they appear in the vector
/// This is the SINGLE SOURCE OF TRUTH for feature layout
pub const FEATURE_LAYOUT: &[&str] = &[
    // === URL lexical (0-9) ===
    "NumDots",                            // 0
    "SubdomainLevel",                     // 1
    "PathLevel",                          // 2
    "UrlLength",                          // 3
    "NumDash",                            // 4
    "NumDashInHostname",                  // 5
    "AtSymbol",                           // 6
    "NumNumericChars",                    // 7
    "NoHttps",                            // 8
    "IpAddress",                          // 9

    // === URL secondary (10-17) ===
    "NumQueryComponents",                 // 10
    "NumUnderscore",                      // 11
    "NumPercent",                         // 12
    "NumAmpersand",                       // 13
    "NumHash",                            // 14
    "RandomString",                       // 15: host longer than RANDOM_HOST_LEN
    "DoubleSlashInPath",                  // 16
    "NumSensitiveWords",                  // 17

    // === Page-derived (18-31), zero unless supplied ===
    "EmbeddedBrandName",                  // 18
    "PctExtHyperlinks",                   // 19
    "PctExtResourceUrls",                 // 20
    "InsecureForms",                      // 21
    "ExtFormAction",                      // 22
    "AbnormalFormAction",                 // 23
    "PctNullSelfRedirectHyperlinks",      // 24
    "RightClickDisabled",                 // 25
    "PopUpWindow",                        // 26
    "SubmitInfoToEmail",                  // 27
    "IframeOrFrame",                      // 28
    "MissingTitle",                       // 29
    "AbnormalExtFormActionR",             // 30
    "PctExtNullSelfRedirectHyperlinksRT", // 31
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 32;

/// Index of the first page-derived feature
pub const PAGE_FEATURES_START: usize = 18;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of a feature layout
pub fn compute_layout_hash<S: AsRef<str>>(version: u8, names: &[S]) -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[version]);

    for name in names {
        hasher.update(name.as_ref().as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

/// Hash of the current layout
pub fn layout_hash() -> u32 {
    compute_layout_hash(FEATURE_VERSION, FEATURE_LAYOUT)
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Error when a stored feature layout doesn't match the running code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "feature layout mismatch: expected v{expected_version} (hash: {expected_hash:08x}), \
     got v{actual_version} (hash: {actual_hash:08x})"
)]
pub struct LayoutMismatchError {
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

/// Validate that a stored layout matches the current layout
pub fn validate_layout(incoming_version: u8, incoming_hash: u32) -> Result<(), LayoutMismatchError> {
    let current_hash = layout_hash();

    if incoming_version != FEATURE_VERSION || incoming_hash != current_hash {
        return Err(LayoutMismatchError {
            expected_version: FEATURE_VERSION,
            expected_hash: current_hash,
            actual_version: incoming_version,
            actual_hash: incoming_hash,
        });
    }

    Ok(())
}

/// Check a stored name list against the current layout, position by position.
/// Returns the first offending position.
pub fn first_name_mismatch<S: AsRef<str>>(names: &[S]) -> Option<usize> {
    if let Some(i) = names
        .iter()
        .zip(FEATURE_LAYOUT.iter())
        .position(|(stored, current)| stored.as_ref() != *current)
    {
        return Some(i);
    }
    if names.len() != FEATURE_COUNT {
        return Some(names.len().min(FEATURE_COUNT));
    }
    None
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature index by name (O(n) but features are few)
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

/// True for features that describe the destination page rather than the URL
pub fn is_page_feature(index: usize) -> bool {
    (PAGE_FEATURES_START..FEATURE_COUNT).contains(&index)
}

// ============================================================================
// TESTS
// ============================================================================
