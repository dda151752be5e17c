//! Model Module - random forest classifier, persistence and inference
//!
//! `forest` trains and scores, `artifact` binds a forest to its feature
//! layout on disk, `inference` serves predictions from a loaded artifact.

pub mod artifact;
pub mod forest;
pub mod inference;
pub mod threshold;

// Re-export common types
pub use artifact::{ArtifactError, ModelArtifact, ModelMetadata, ARTIFACT_FORMAT_VERSION};
pub use forest::{Classifier, ClassWeights, ForestParams, ModelError, RandomForest, DEFAULT_SEED, DEFAULT_TREES};
pub use inference::{InferenceContext, InferenceError, Prediction, UrlVerdict, VerdictSource};
pub use threshold::{ThresholdConfig, DEFAULT_THRESHOLD};
