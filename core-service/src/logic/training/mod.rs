//! Training Module - offline batch training of the phishing forest
//!
//! Pipeline: read CSV → normalize labels → shuffle-split holdout → balanced
//! class weights → fit → evaluate → artifact.

pub mod report;


use std::path::Path;

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::dataset::{self, DatasetError, DatasetOptions, FeatureSource, TrainingExample};
use crate::logic::features::{FeatureVector, FEATURE_COUNT};
use crate::logic::label::{Label, LabelSummary};
use crate::logic::model::{
    ArtifactError, ClassWeights, ForestParams, ModelArtifact, ModelError, RandomForest, ThresholdConfig,
};

pub use report::{ClassMetrics, EvaluationReport};

/// Below this many labelled rows there is no holdout
pub const MIN_ROWS_FOR_HOLDOUT: usize = 5;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("no usable labelled rows ({dropped} excluded by label normalization)")]
    NoLabelledRows { dropped: usize },

    #[error("training failed: {0}")]
    Model(#[from] ModelError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

// ============================================================================
// CONFIG / SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub forest: ForestParams,
    pub holdout_fraction: f64,
    pub dataset: DatasetOptions,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            forest: ForestParams::default(),
            holdout_fraction: constants::DEFAULT_HOLDOUT_FRACTION,
            dataset: DatasetOptions::default(),
        }
    }
}

impl TrainingConfig {
    /// Defaults with seed and tree count taken from the environment
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.forest.seed = constants::get_seed();
        config.forest.n_trees = constants::get_tree_count();
        config
    }
}

/// What went into a model; stored inside the artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub rows_read: usize,
    pub rows_rejected: usize,
    pub feature_source: Option<FeatureSource>,
    pub labels: LabelSummary,
    pub train_rows: usize,
    pub holdout_rows: usize,
    pub seed: u64,
    pub class_weights: Option<ClassWeights>,
    pub evaluation: Option<EvaluationReport>,
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Read `input`, train, and save the artifact to `output`
pub fn run(input: &Path, output: &Path, config: &TrainingConfig) -> Result<ModelArtifact, TrainingError> {
    let data = dataset::read_csv(input, &config.dataset)?;

    let (forest, mut summary) = train(&data.examples, config)?;
    summary.rows_read = data.stats.rows_read;
    summary.rows_rejected = data.stats.rows_rejected;
    summary.feature_source = Some(data.source);

    let artifact = ModelArtifact::new(forest, summary)?;
    artifact.save(output)?;
    Ok(artifact)
}

/// Train on already-read examples
pub fn train(examples: &[TrainingExample], config: &TrainingConfig) -> Result<(RandomForest, TrainingSummary), TrainingError> {
    let mut labels = LabelSummary::new();
    let rows: Vec<(&FeatureVector, Label)> = examples
        .iter()
        .filter_map(|ex| labels.record(&ex.label).map(|l| (&ex.features, l)))
        .collect();
    labels.log();

    if rows.is_empty() {
        return Err(TrainingError::NoLabelledRows { dropped: labels.dropped() });
    }

    let (train_idx, holdout_idx) = split_indices(rows.len(), config.holdout_fraction, config.forest.seed);

    let train_y: Vec<Label> = train_idx.iter().map(|&i| rows[i].1).collect();
    let train_x = to_matrix(train_idx.iter().map(|&i| rows[i].0));

    let weights = ClassWeights::balanced(&train_y)?;
    log::info!(
        "Training {} trees on {} rows (holdout {}), weights legitimate {:.3} / phishing {:.3}",
        config.forest.n_trees,
        train_idx.len(),
        holdout_idx.len(),
        weights.legitimate,
        weights.phishing
    );

    let forest = RandomForest::fit(train_x.view(), &train_y, weights, config.forest.clone())?;

    let evaluation = if holdout_idx.is_empty() {
        log::warn!("Only {} labelled rows; skipping holdout evaluation", rows.len());
        None
    } else {
        let scores: Vec<f64> = holdout_idx
            .par_iter()
            .map(|&i| forest.predict_proba(rows[i].0.as_slice()))
            .collect();
        let actual: Vec<Label> = holdout_idx.iter().map(|&i| rows[i].1).collect();
        let report = EvaluationReport::evaluate(&scores, &actual, ThresholdConfig::default());
        report.log();
        Some(report)
    };

    let summary = TrainingSummary {
        labels,
        train_rows: train_idx.len(),
        holdout_rows: holdout_idx.len(),
        seed: config.forest.seed,
        class_weights: Some(weights),
        evaluation,
        ..Default::default()
    };

    Ok((forest, summary))
}

/// Seeded shuffle, then the first `ceil(n * fraction)` indices are held out
fn split_indices(n: usize, fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut idx: Vec<usize> = (0..n).collect();
    if n < MIN_ROWS_FOR_HOLDOUT || fraction <= 0.0 {
        return (idx, Vec::new());
    }

    let mut rng = StdRng::seed_from_u64(seed);
    idx.shuffle(&mut rng);

    let n_holdout = ((n as f64 * fraction).ceil() as usize).clamp(1, n - 1);
    let train = idx.split_off(n_holdout);
    (train, idx)
}

fn to_matrix<'a>(rows: impl Iterator<Item = &'a FeatureVector>) -> Array2<f64> {
    let flat: Vec<f64> = rows.flat_map(|v| v.as_slice().iter().copied()).collect();
    let n = flat.len() / FEATURE_COUNT;
    Array2::from_shape_vec((n, FEATURE_COUNT), flat).unwrap_or_else(|_| Array2::zeros((0, FEATURE_COUNT)))
}
