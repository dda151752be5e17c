//! Inference Service
//!
//! Holds one loaded classifier for the lifetime of the process and answers
//! predictions against it. Callers may send any subset of the layout; the
//! rest is filled with 0.0.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::logic::features::{self, FeatureError, FeatureVector};
use crate::logic::heuristic::{self, HeuristicOptions, Verdict};
use crate::logic::label::Label;

use super::artifact::{ArtifactError, ModelArtifact, ModelMetadata};
use super::forest::Classifier;
use super::threshold::ThresholdConfig;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("invalid value for feature '{name}': {reason}")]
    InvalidFeatureValue { name: String, reason: String },
}

impl From<FeatureError> for InferenceError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::InvalidValue { name, reason } => {
                InferenceError::InvalidFeatureValue { name, reason }
            }
            FeatureError::NonFinite { name } => InferenceError::InvalidFeatureValue {
                name,
                reason: "value is not finite".to_string(),
            },
        }
    }
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Prediction output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Label,
    /// Phishing probability, 0.0 - 1.0
    pub score: f64,
}

/// Where a URL verdict came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictSource {
    Heuristic,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlVerdict {
    pub label: Verdict,
    pub score: f64,
    pub source: VerdictSource,
    pub reasons: Vec<String>,
}

/// Engine status for the metadata endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub model_loaded: bool,
    pub threshold: f64,
    pub avg_latency_us: f64,
    pub inference_count: u64,
}

// ============================================================================
// CONTEXT
// ============================================================================

/// Loaded model plus decision threshold. Read-only after construction.
pub struct InferenceContext {
    classifier: Box<dyn Classifier>,
    metadata: Option<ModelMetadata>,
    threshold: ThresholdConfig,
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
}

impl InferenceContext {
    /// Load and validate an artifact from disk
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let artifact = ModelArtifact::load(path)?;
        Ok(Self::from_artifact(artifact))
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Self {
        let metadata = artifact.metadata();
        let forest = artifact.forest().clone();
        let mut ctx = Self::with_classifier(Box::new(forest));
        ctx.metadata = Some(metadata);
        ctx
    }

    /// Wrap any classifier, e.g. a fixed one in tests
    pub fn with_classifier(classifier: Box<dyn Classifier>) -> Self {
        Self {
            classifier,
            metadata: None,
            threshold: ThresholdConfig::default(),
            latency_sum_us: AtomicU64::new(0),
            inference_count: AtomicU64::new(0),
        }
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.metadata.as_ref()
    }

    pub fn threshold(&self) -> ThresholdConfig {
        self.threshold
    }

    /// Predict from a partial name → value mapping
    pub fn predict(&self, partial: &Map<String, Value>) -> Result<Prediction, InferenceError> {
        let vector = FeatureVector::complete_with_defaults(partial).map_err(|e| {
            log::warn!("Rejected prediction input: {}", e);
            InferenceError::from(e)
        })?;
        Ok(self.predict_vector(&vector))
    }

    /// Predict from an already complete vector
    pub fn predict_vector(&self, vector: &FeatureVector) -> Prediction {
        let start = Instant::now();

        log::debug!("Feature vector: {}", vector.to_log_entry());

        let score = self.classifier.score(vector);
        let label = self.threshold.decide(score);

        self.latency_sum_us
            .fetch_add(start.elapsed().as_micros() as u64, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        Prediction { label, score }
    }

    /// Heuristic screen first; the model only sees URLs the screen passes
    pub fn check_url(&self, url: &str, options: &HeuristicOptions) -> UrlVerdict {
        let screened = heuristic::screen(url, options);
        if !screened.is_clean() {
            log::debug!("Heuristic flagged {} ({:.2})", url, screened.score);
            return UrlVerdict {
                label: screened.level,
                score: screened.score,
                source: VerdictSource::Heuristic,
                reasons: screened.reasons,
            };
        }

        let prediction = self.predict_vector(&features::extract(url));
        UrlVerdict {
            label: prediction.label.into(),
            score: prediction.score,
            source: VerdictSource::Model,
            reasons: screened.reasons,
        }
    }

    pub fn status(&self) -> EngineStatus {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        let avg = if count > 0 { sum as f64 / count as f64 } else { 0.0 };

        EngineStatus {
            model_loaded: self.metadata.is_some(),
            threshold: self.threshold.phishing_min,
            avg_latency_us: avg,
            inference_count: count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::{FEATURE_COUNT, FEATURE_LAYOUT};
    use crate::logic::model::forest::{ClassWeights, ForestParams, RandomForest};
    use crate::logic::training::TrainingSummary;
    use ndarray::Array2;
    use serde_json::json;
    use tempfile::tempdir;

    struct Fixed(f64);

    impl Classifier for Fixed {
        fn score(&self, _vector: &FeatureVector) -> f64 {
            self.0
        }
    }

    /// Counts the non-zero inputs it sees, so tests can observe defaulting
    struct NonZeroCounter;

    impl Classifier for NonZeroCounter {
        fn score(&self, vector: &FeatureVector) -> f64 {
            vector.as_slice().iter().filter(|v| **v != 0.0).count() as f64 / FEATURE_COUNT as f64
        }
    }

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_partial_features_are_completed() {
        let ctx = InferenceContext::with_classifier(Box::new(NonZeroCounter));
        let input = object(json!({
            "NumDots": 4,
            "UrlLength": 33,
            "IpAddress": 1,
            "AtSymbol": 1,
            "NoHttps": 1,
        }));

        let p = ctx.predict(&input).unwrap();
        assert!((p.score - 5.0 / 32.0).abs() < 1e-12);
        assert_eq!(p.label, Label::Legitimate);
    }

    #[test]
    fn test_empty_input_is_all_zeros() {
        let ctx = InferenceContext::with_classifier(Box::new(NonZeroCounter));
        let p = ctx.predict(&Map::new()).unwrap();
        assert_eq!(p.score, 0.0);
    }

    #[test]
    fn test_non_numeric_value_is_rejected() {
        let ctx = InferenceContext::with_classifier(Box::new(Fixed(0.9)));
        let err = ctx.predict(&object(json!({ "UrlLength": "abc" }))).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::InvalidFeatureValue { ref name, .. } if name == "UrlLength"
        ));
    }

    #[test]
    fn test_threshold_boundary() {
        let at = InferenceContext::with_classifier(Box::new(Fixed(0.50)));
        let below = InferenceContext::with_classifier(Box::new(Fixed(0.499999)));
        assert_eq!(at.predict(&Map::new()).unwrap().label, Label::Phishing);
        assert_eq!(below.predict(&Map::new()).unwrap().label, Label::Legitimate);
    }

    #[test]
    fn test_check_url_short_circuits_on_heuristic() {
        let ctx = InferenceContext::with_classifier(Box::new(Fixed(0.0)));
        let v = ctx.check_url("http://192.168.1.1/login@evil.com", &HeuristicOptions::default());
        assert_eq!(v.source, VerdictSource::Heuristic);
        assert_eq!(v.label, Verdict::Phishing);
        assert_eq!(ctx.status().inference_count, 0);
    }

    #[test]
    fn test_check_url_falls_through_to_model() {
        let ctx = InferenceContext::with_classifier(Box::new(Fixed(0.8)));
        let v = ctx.check_url("https://example.com/", &HeuristicOptions::default());
        assert_eq!(v.source, VerdictSource::Model);
        assert_eq!(v.label, Verdict::Phishing);
        assert_eq!(ctx.status().inference_count, 1);
    }

    /// Phishing rows carry the classic red flags; legitimate rows are clean https
    fn synthetic_forest() -> RandomForest {
        let phishing_urls = [
            "http://192.168.1.1/login@evil.com",
            "http://10.0.0.7/verify/account@bank.com",
            "http://172.16.4.2/secure-update@paypal.com",
            "http://203.0.113.9/login.php?user=a&next=b@x",
        ];
        let legit_urls = [
            "https://example.com/",
            "https://www.rust-lang.org/learn",
            "https://docs.rs/serde",
            "https://github.com/about",
        ];

        let rows: Vec<(FeatureVector, Label)> = phishing_urls
            .iter()
            .map(|u| (features::extract(u), Label::Phishing))
            .chain(legit_urls.iter().map(|u| (features::extract(u), Label::Legitimate)))
            .cycle()
            .take(40)
            .collect();

        let mut x = Array2::<f64>::zeros((rows.len(), FEATURE_COUNT));
        for (i, (v, _)) in rows.iter().enumerate() {
            for (j, value) in v.as_slice().iter().enumerate() {
                x[[i, j]] = *value;
            }
        }
        let y: Vec<Label> = rows.iter().map(|(_, l)| *l).collect();

        let params = ForestParams { n_trees: 25, ..Default::default() };
        RandomForest::fit(x.view(), &y, ClassWeights::balanced(&y).unwrap(), params).unwrap()
    }

    #[test]
    fn test_end_to_end_with_trained_artifact() {
        let artifact = ModelArtifact::new(synthetic_forest(), TrainingSummary::default()).unwrap();
        let ctx = InferenceContext::from_artifact(artifact);

        let mut partial = Map::new();
        for (name, value) in features::extract("http://192.168.1.1/login@evil.com").named_values() {
            partial.insert(name.to_string(), json!(value));
        }
        let p = ctx.predict(&partial).unwrap();
        assert_eq!(p.label, Label::Phishing);
        assert!(p.score >= 0.5);

        let clean = ctx.predict_vector(&features::extract("https://example.com/"));
        assert_eq!(clean.label, Label::Legitimate);

        assert!(ctx.metadata().is_some());
        assert!(ctx.status().model_loaded);
    }

    #[test]
    fn test_layout_names_are_accepted_as_strings() {
        let ctx = InferenceContext::with_classifier(Box::new(NonZeroCounter));
        let mut partial = Map::new();
        for name in FEATURE_LAYOUT {
            partial.insert(name.to_string(), json!("1"));
        }
        assert_eq!(ctx.predict(&partial).unwrap().score, 1.0);
    }

    #[test]
    fn test_load_missing_artifact_fails() {
        let dir = tempdir().unwrap();
        let err = InferenceContext::load(&dir.path().join("model.json"))
            .err()
            .expect("missing artifact must not load");
        assert!(matches!(err, ArtifactError::NotFound { .. }));
    }

    #[test]
    fn test_load_corrupt_artifact_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, b"{\"format_version\": 1, \"forest\": [").unwrap();

        let err = InferenceContext::load(&path)
            .err()
            .expect("corrupt artifact must not load");
        assert!(matches!(err, ArtifactError::Corrupt(_)));
    }

    #[test]
    fn test_load_saved_artifact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        let artifact = ModelArtifact::new(synthetic_forest(), TrainingSummary::default()).unwrap();
        artifact.save(&path).unwrap();

        let ctx = InferenceContext::load(&path).unwrap();
        assert_eq!(ctx.metadata().map(|m| m.model_id), Some(artifact.metadata().model_id));
        assert!(ctx.status().model_loaded);
    }
}
