//! PhishGuard core: URL feature contract, random forest classifier,
//! model artifact and inference service.

pub mod api;
pub mod constants;
pub mod logic;

pub use logic::features::{extract, FeatureVector, FEATURE_COUNT, FEATURE_LAYOUT};
pub use logic::label::Label;
pub use logic::model::{InferenceContext, InferenceError, ModelArtifact, Prediction};
