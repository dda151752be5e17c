//! Central Configuration Constants
//!
//! Single source of truth for defaults. Every value can be overridden from
//! the environment; the helpers below fall back to the constant.

use std::path::PathBuf;

use crate::logic::model::{DEFAULT_SEED, DEFAULT_TREES};

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "PhishGuard";

/// Artifact file name under the data directory
pub const MODEL_FILE_NAME: &str = "model.json";

/// Default CSV column holding the raw label
pub const DEFAULT_LABEL_COLUMN: &str = "CLASS_LABEL";

/// Default CSV column holding the raw URL
pub const DEFAULT_URL_COLUMN: &str = "URL";

/// Share of labelled rows held out for evaluation
pub const DEFAULT_HOLDOUT_FRACTION: f64 = 0.2;

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// `<data_local_dir>/phishguard/model.json`, or `./phishguard/model.json`
/// when the platform has no data directory
pub fn default_model_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("phishguard")
        .join(MODEL_FILE_NAME)
}

/// Get the artifact path from environment or use default
pub fn get_model_path() -> PathBuf {
    std::env::var("PHISHGUARD_MODEL_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(default_model_path)
}

/// Get the training seed from environment or use default
pub fn get_seed() -> u64 {
    std::env::var("PHISHGUARD_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SEED)
}

/// Get the forest size from environment or use default
pub fn get_tree_count() -> usize {
    std::env::var("PHISHGUARD_TREES")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_TREES)
}
