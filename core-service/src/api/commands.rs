//! Trainer Commands - train, extract, inspect, predict

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::logic::dataset::{self, export, DatasetOptions};
use crate::logic::features;
use crate::logic::heuristic::HeuristicOptions;
use crate::logic::model::{InferenceContext, ModelArtifact, ModelMetadata, Prediction, UrlVerdict};
use crate::logic::training::{self, TrainingConfig, TrainingSummary};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Result of a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainReport {
    pub model_id: String,
    pub output: PathBuf,
    pub n_trees: usize,
    pub summary: TrainingSummary,
}

/// Named feature values for one URL, in layout order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractReport {
    pub url: String,
    pub features: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows_written: usize,
    pub rows_rejected: usize,
}

// ============================================================================
// COMMANDS
// ============================================================================

pub fn train(input: &Path, output: &Path, config: &TrainingConfig) -> Result<TrainReport> {
    let artifact = training::run(input, output, config)
        .with_context(|| format!("training on {} failed", input.display()))?;

    Ok(TrainReport {
        model_id: artifact.model_id().to_string(),
        output: output.to_path_buf(),
        n_trees: artifact.forest().n_trees(),
        summary: artifact.summary().clone(),
    })
}

/// Extract one URL; `page` optionally overlays measured page features
pub fn extract(url: &str, page: Option<&str>) -> Result<ExtractReport> {
    let vector = match page {
        Some(raw) => {
            let page: HashMap<String, f64> =
                serde_json::from_str(raw).context("page features must be a JSON object of numbers")?;
            features::extract_with_page(url, &page)?
        }
        None => features::extract(url),
    };

    let features = vector
        .named_values()
        .map(|(name, value)| (name.to_string(), Value::from(value)))
        .collect();

    Ok(ExtractReport { url: url.to_string(), features })
}

/// Turn a URL dataset into a feature-column dataset
pub fn export_features(input: &Path, output: &Path, options: &DatasetOptions) -> Result<ExportReport> {
    let data = dataset::read_csv(input, options)?;
    let rows_written = export::to_feature_csv(&data.examples, &options.label_column, output)
        .with_context(|| format!("cannot write {}", output.display()))?;

    Ok(ExportReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        rows_written,
        rows_rejected: data.stats.rows_rejected,
    })
}

pub fn inspect(model: &Path) -> Result<ModelMetadata> {
    let artifact = ModelArtifact::load(model)?;
    Ok(artifact.metadata())
}

/// Score a JSON object of (possibly partial) features
pub fn predict(model: &Path, features_json: &str) -> Result<Prediction> {
    let ctx = InferenceContext::load(model)?;
    let value: Value = serde_json::from_str(features_json).context("features must be valid JSON")?;
    let Value::Object(partial) = value else {
        bail!("features must be a JSON object");
    };
    Ok(ctx.predict(&partial)?)
}

/// Heuristic screen, then the model
pub fn check(model: &Path, url: &str, options: &HeuristicOptions) -> Result<UrlVerdict> {
    let ctx = InferenceContext::load(model)?;
    Ok(ctx.check_url(url, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::heuristic::Verdict;
    use std::fs;
    use tempfile::tempdir;

    fn trained_model(dir: &Path) -> PathBuf {
        let input = dir.join("urls.csv");
        let mut csv = String::from("URL,CLASS_LABEL\n");
        for i in 0..24 {
            if i % 2 == 0 {
                csv.push_str(&format!("http://10.1.1.{}/login@pay.com,1\n", i));
            } else {
                csv.push_str(&format!("https://news{}.example.com/today,0\n", i));
            }
        }
        fs::write(&input, csv).unwrap();

        let output = dir.join("model.json");
        let mut config = TrainingConfig::default();
        config.forest.n_trees = 11;
        train(&input, &output, &config).unwrap();
        output
    }

    #[test]
    fn test_extract_lists_layout_in_order() {
        let report = extract("http://192.168.1.1/login@evil.com", None).unwrap();
        let names: Vec<&String> = report.features.keys().collect();
        assert_eq!(names.len(), 32);
        assert_eq!(names[0], "NumDots");
        assert_eq!(report.features["IpAddress"], Value::from(1.0));
    }

    #[test]
    fn test_extract_with_page_overlay() {
        let report = extract("https://example.com/", Some(r#"{"PctExtHyperlinks": 0.75}"#)).unwrap();
        assert_eq!(report.features["PctExtHyperlinks"], Value::from(0.75));
        assert!(extract("https://example.com/", Some("[1, 2]")).is_err());
    }

    #[test]
    fn test_train_inspect_predict() {
        let dir = tempdir().unwrap();
        let model = trained_model(dir.path());

        let meta = inspect(&model).unwrap();
        assert_eq!(meta.n_trees, 11);

        let p = predict(&model, r#"{"IpAddress": 1, "AtSymbol": 1, "NoHttps": 1, "NumSensitiveWords": 1}"#).unwrap();
        assert!((0.0..=1.0).contains(&p.score));

        assert!(predict(&model, r#"{"UrlLength": "long"}"#).is_err());
        assert!(predict(&model, "[]").is_err());
    }

    #[test]
    fn test_check_uses_model_for_clean_urls() {
        let dir = tempdir().unwrap();
        let model = trained_model(dir.path());
        let verdict = check(&model, "https://news3.example.com/today", &HeuristicOptions::default()).unwrap();
        assert_eq!(verdict.label, Verdict::Legitimate);
    }

    #[test]
    fn test_export_features() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.csv");
        fs::write(&input, "URL,CLASS_LABEL\nhttps://a.com/,0\nhttp://1.2.3.4/,1\n").unwrap();
        let output = dir.path().join("features.csv");

        let report = export_features(&input, &output, &DatasetOptions::default()).unwrap();
        assert_eq!(report.rows_written, 2);

        let back = dataset::read_csv(&output, &DatasetOptions::default()).unwrap();
        assert_eq!(back.examples.len(), 2);
    }
}
