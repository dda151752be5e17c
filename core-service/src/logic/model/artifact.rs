//! Model Artifact - classifier and feature layout persisted as one unit
//!
//! The forest and the feature names it was trained on are saved and loaded
//! together, never separately. Loading refuses anything that does not match
//! the running layout exactly.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::logic::features::layout::{
    first_name_mismatch, layout_hash, validate_layout, LayoutMismatchError, FEATURE_LAYOUT,
    FEATURE_VERSION,
};
use crate::logic::training::TrainingSummary;

use super::forest::{ModelError, RandomForest};

/// Bump when the on-disk structure changes
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("model artifact not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("model artifact is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("unsupported artifact format v{found} (expected v{expected})")]
    UnsupportedFormat { found: u32, expected: u32 },

    #[error("artifact checksum mismatch: stored {stored}, computed {computed}")]
    ChecksumMismatch { stored: String, computed: String },

    #[error("artifact feature schema differs at position {position}: expected '{expected}', found '{found}'")]
    SchemaMismatch {
        position: usize,
        expected: String,
        found: String,
    },

    #[error(transparent)]
    Layout(#[from] LayoutMismatchError),

    #[error("artifact model is invalid: {0}")]
    Model(#[from] ModelError),

    #[error("failed to serialize artifact: {0}")]
    Serialize(#[source] serde_json::Error),
}

// ============================================================================
// ARTIFACT
// ============================================================================

/// Immutable (forest, schema snapshot) bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    format_version: u32,
    model_id: Uuid,
    trained_at: DateTime<Utc>,
    feature_version: u8,
    layout_hash: u32,
    feature_names: Vec<String>,
    summary: TrainingSummary,
    checksum: String,
    forest: RandomForest,
}

/// Lightweight view for logs and the metadata endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub feature_version: u8,
    pub layout_hash: u32,
    pub feature_count: usize,
    pub n_trees: usize,
    pub checksum: String,
    pub summary: TrainingSummary,
}

impl ModelArtifact {
    /// Bundle a freshly trained forest with the current layout
    pub fn new(forest: RandomForest, summary: TrainingSummary) -> Result<Self, ArtifactError> {
        let feature_names: Vec<String> = FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect();
        let checksum = compute_checksum(&feature_names, &forest)?;

        Ok(Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            model_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            feature_version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            feature_names,
            summary,
            checksum,
            forest,
        })
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn summary(&self) -> &TrainingSummary {
        &self.summary
    }

    pub fn model_id(&self) -> Uuid {
        self.model_id
    }

    pub fn metadata(&self) -> ModelMetadata {
        ModelMetadata {
            model_id: self.model_id,
            trained_at: self.trained_at,
            feature_version: self.feature_version,
            layout_hash: self.layout_hash,
            feature_count: self.feature_names.len(),
            n_trees: self.forest.n_trees(),
            checksum: self.checksum.clone(),
            summary: self.summary.clone(),
        }
    }

    /// Serialize the whole bundle
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        serde_json::to_vec(self).map_err(ArtifactError::Serialize)
    }

    /// Parse and fully validate a bundle
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let artifact: ModelArtifact = serde_json::from_slice(bytes).map_err(ArtifactError::Corrupt)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Write atomically: temp file in the same directory, then rename
    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        let io_err = |source| ArtifactError::Io { path: path.to_path_buf(), source };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let bytes = self.to_bytes()?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;

        log::info!(
            "Saved model {} ({} trees) to {}",
            self.model_id,
            self.forest.n_trees(),
            path.display()
        );
        Ok(())
    }

    /// Load and validate. Any failure here is fatal for a serving process.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        if !path.exists() {
            return Err(ArtifactError::NotFound { path: path.to_path_buf() });
        }

        let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact = Self::from_slice(&bytes)?;

        log::info!(
            "Loaded model {} trained {} ({} trees, layout v{} {:08x})",
            artifact.model_id,
            artifact.trained_at,
            artifact.forest.n_trees(),
            artifact.feature_version,
            artifact.layout_hash
        );
        Ok(artifact)
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedFormat {
                found: self.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }

        let computed = compute_checksum(&self.feature_names, &self.forest)?;
        if computed != self.checksum {
            return Err(ArtifactError::ChecksumMismatch {
                stored: self.checksum.clone(),
                computed,
            });
        }

        if let Some(position) = first_name_mismatch(&self.feature_names) {
            return Err(ArtifactError::SchemaMismatch {
                position,
                expected: FEATURE_LAYOUT.get(position).unwrap_or(&"<end>").to_string(),
                found: self
                    .feature_names
                    .get(position)
                    .cloned()
                    .unwrap_or_else(|| "<end>".to_string()),
            });
        }

        validate_layout(self.feature_version, self.layout_hash)?;
        self.forest.validate()?;
        Ok(())
    }
}

/// SHA-256 over the feature names and the serialized forest
fn compute_checksum(feature_names: &[String], forest: &RandomForest) -> Result<String, ArtifactError> {
    let mut hasher = Sha256::new();
    for name in feature_names {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
    }
    let forest_bytes = serde_json::to_vec(forest).map_err(ArtifactError::Serialize)?;
    hasher.update(&forest_bytes);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::{extract, FEATURE_COUNT};
    use crate::logic::label::Label;
    use crate::logic::model::forest::{ClassWeights, ForestParams};
    use ndarray::Array2;
    use serde_json::Value;
    use tempfile::tempdir;

    fn tiny_artifact() -> ModelArtifact {
        let mut x = Array2::<f64>::zeros((8, FEATURE_COUNT));
        let mut y = Vec::new();
        for i in 0..8 {
            let phishing = i % 2 == 0;
            x[[i, 9]] = if phishing { 1.0 } else { 0.0 };
            x[[i, 3]] = 20.0 + i as f64;
            y.push(if phishing { Label::Phishing } else { Label::Legitimate });
        }
        let params = ForestParams { n_trees: 7, ..Default::default() };
        let forest = RandomForest::fit(x.view(), &y, ClassWeights::balanced(&y).unwrap(), params).unwrap();
        ModelArtifact::new(forest, TrainingSummary::default()).unwrap()
    }

    fn edit_json(artifact: &ModelArtifact, edit: impl FnOnce(&mut Value)) -> Vec<u8> {
        let mut doc: Value = serde_json::from_slice(&artifact.to_bytes().unwrap()).unwrap();
        edit(&mut doc);
        serde_json::to_vec(&doc).unwrap()
    }

    #[test]
    fn test_save_load_reproduces_scores_exactly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("model.json");
        let artifact = tiny_artifact();
        artifact.save(&path).unwrap();

        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded, artifact);

        let sample = extract("http://192.168.1.1/login@evil.com");
        let before = artifact.forest().predict_proba(sample.as_slice());
        let after = loaded.forest().predict_proba(sample.as_slice());
        assert_eq!(before.to_bits(), after.to_bits());
    }

    #[test]
    fn test_missing_file_is_reported() {
        let dir = tempdir().unwrap();
        let err = ModelArtifact::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound { .. }));
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let err = ModelArtifact::from_slice(b"{ not json").unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt(_)));
    }

    #[test]
    fn test_reordered_names_are_rejected() {
        let artifact = tiny_artifact();
        // Reorder and re-sign so only the schema check can catch it
        let mut names = artifact.feature_names().to_vec();
        names.swap(0, 1);
        let checksum = compute_checksum(&names, artifact.forest()).unwrap();
        let bytes = edit_json(&artifact, |doc| {
            doc["feature_names"] = serde_json::to_value(&names).unwrap();
            doc["checksum"] = Value::String(checksum);
        });

        let err = ModelArtifact::from_slice(&bytes).unwrap_err();
        assert!(matches!(err, ArtifactError::SchemaMismatch { position: 0, .. }));
    }

    #[test]
    fn test_tampered_forest_fails_checksum() {
        let artifact = tiny_artifact();
        let bytes = edit_json(&artifact, |doc| {
            doc["forest"]["trees"][0]["nodes"][0] = serde_json::json!({
                "kind": "leaf", "phishing": 1.0, "samples": 1
            });
        });

        let err = ModelArtifact::from_slice(&bytes).unwrap_err();
        assert!(matches!(err, ArtifactError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_layout_version_mismatch_is_rejected() {
        let artifact = tiny_artifact();
        let bytes = edit_json(&artifact, |doc| {
            doc["feature_version"] = Value::from(FEATURE_VERSION + 1);
        });

        let err = ModelArtifact::from_slice(&bytes).unwrap_err();
        assert!(matches!(err, ArtifactError::Layout(_)));
    }

    #[test]
    fn test_future_format_is_rejected() {
        let artifact = tiny_artifact();
        let bytes = edit_json(&artifact, |doc| {
            doc["format_version"] = Value::from(ARTIFACT_FORMAT_VERSION + 1);
        });

        let err = ModelArtifact::from_slice(&bytes).unwrap_err();
        assert!(matches!(err, ArtifactError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_metadata() {
        let artifact = tiny_artifact();
        let meta = artifact.metadata();
        assert_eq!(meta.n_trees, 7);
        assert_eq!(meta.feature_count, FEATURE_COUNT);
        assert_eq!(meta.checksum.len(), 64);
    }
}
