//! Random Forest - Bootstrap-aggregated CART trees
//!
//! Binary classifier over `FeatureVector`s. Each tree is grown on its own
//! bootstrap sample with weighted Gini impurity; class weights counter label
//! imbalance. Trees are stored as flat node arrays so very deep trees
//! serialize without nesting.

use ndarray::ArrayView2;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::logic::features::{FeatureVector, FEATURE_COUNT};
use crate::logic::label::Label;

use super::threshold::ThresholdConfig;

/// Trees in a production forest
pub const DEFAULT_TREES: usize = 500;

/// Seed used for every production training run
pub const DEFAULT_SEED: u64 = 42;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("{rows} feature rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("expected {expected} features, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("training labels contain no '{0}' examples")]
    MissingClass(Label),

    #[error("training row {row} has a non-finite value")]
    NonFiniteInput { row: usize },

    #[error("forest has no trees")]
    NoTrees,

    #[error("tree {tree} is malformed: {reason}")]
    InvalidTree { tree: usize, reason: String },
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Anything that turns a complete feature vector into a phishing probability
pub trait Classifier: Send + Sync {
    /// Probability of the phishing class, in [0, 1]
    fn score(&self, vector: &FeatureVector) -> f64;

    /// Decision at the fixed threshold
    fn decide(&self, vector: &FeatureVector) -> Label {
        ThresholdConfig::default().decide(self.score(vector))
    }
}

// ============================================================================
// PARAMETERS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub seed: u64,
    /// Features tried per split; `None` means floor(sqrt(n_features))
    pub max_features: Option<usize>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: DEFAULT_TREES,
            seed: DEFAULT_SEED,
            max_features: None,
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

impl ForestParams {
    fn features_per_split(&self, n_features: usize) -> usize {
        self.max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().floor() as usize)
            .clamp(1, n_features.max(1))
    }
}

/// Per-class sample weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassWeights {
    pub legitimate: f64,
    pub phishing: f64,
}

impl ClassWeights {
    pub fn uniform() -> Self {
        Self { legitimate: 1.0, phishing: 1.0 }
    }

    /// `n_samples / (n_classes * n_class)`, the usual "balanced" weighting.
    /// Both classes must be present.
    pub fn balanced(labels: &[Label]) -> Result<Self, ModelError> {
        let phishing = labels.iter().filter(|l| **l == Label::Phishing).count();
        let legitimate = labels.len() - phishing;

        if legitimate == 0 {
            return Err(ModelError::MissingClass(Label::Legitimate));
        }
        if phishing == 0 {
            return Err(ModelError::MissingClass(Label::Phishing));
        }

        let n = labels.len() as f64;
        Ok(Self {
            legitimate: n / (2.0 * legitimate as f64),
            phishing: n / (2.0 * phishing as f64),
        })
    }

    pub fn of(&self, label: Label) -> f64 {
        match label {
            Label::Legitimate => self.legitimate,
            Label::Phishing => self.phishing,
        }
    }
}

// ============================================================================
// TREE
// ============================================================================

/// Flat tree node. Children always have a larger index than their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Weighted fraction of phishing samples that reached this leaf
        phishing: f64,
        samples: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Phishing probability for one row (`value <= threshold` goes left)
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { phishing, .. } => return *phishing,
                Node::Split { feature, threshold, left, right } => {
                    index = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        let mut depths = vec![0usize; self.nodes.len()];
        let mut max = 0;
        for (i, node) in self.nodes.iter().enumerate() {
            if let Node::Split { left, right, .. } = node {
                depths[*left] = depths[i] + 1;
                depths[*right] = depths[i] + 1;
                max = max.max(depths[i] + 1);
            }
        }
        max
    }

    /// Structural checks for trees that came from disk
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split { feature, threshold, left, right } => {
                    if *feature >= n_features {
                        return Err(format!("node {} splits on feature {}", i, feature));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {} has a non-finite threshold", i));
                    }
                    if *left <= i || *right <= i || *left >= self.nodes.len() || *right >= self.nodes.len() {
                        return Err(format!("node {} has out-of-order children", i));
                    }
                }
                Node::Leaf { phishing, .. } => {
                    if !(0.0..=1.0).contains(phishing) {
                        return Err(format!("leaf {} probability {} out of range", i, phishing));
                    }
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// TREE GROWING
// ============================================================================

struct GrowContext<'x, 'a> {
    x: ArrayView2<'x, f64>,
    labels: &'a [Label],
    weights: ClassWeights,
    params: &'a ForestParams,
    features_per_split: usize,
}

enum Side {
    Root,
    Left(usize),
    Right(usize),
}

struct Pending {
    samples: Vec<usize>,
    depth: usize,
    parent: Side,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn gini(w_legit: f64, w_phish: f64) -> f64 {
    let total = w_legit + w_phish;
    if total <= 0.0 {
        return 0.0;
    }
    let p = w_phish / total;
    1.0 - (p * p + (1.0 - p) * (1.0 - p))
}

fn grow_tree(ctx: &GrowContext<'_, '_>, bootstrap: Vec<usize>, rng: &mut StdRng) -> DecisionTree {
    let n_features = ctx.x.ncols();
    let mut nodes: Vec<Node> = Vec::new();
    let mut feature_order: Vec<usize> = (0..n_features).collect();

    // Explicit work stack: fully grown trees can be deeper than a thread stack allows
    let mut stack = vec![Pending { samples: bootstrap, depth: 0, parent: Side::Root }];

    while let Some(task) = stack.pop() {
        let index = nodes.len();
        match task.parent {
            Side::Root => {}
            Side::Left(p) | Side::Right(p) => {
                if let Node::Split { left, right, .. } = &mut nodes[p] {
                    if matches!(task.parent, Side::Left(_)) {
                        *left = index;
                    } else {
                        *right = index;
                    }
                }
            }
        }

        let (w_legit, w_phish) = task.samples.iter().fold((0.0, 0.0), |(l, p), &i| {
            match ctx.labels[i] {
                Label::Legitimate => (l + ctx.weights.legitimate, p),
                Label::Phishing => (l, p + ctx.weights.phishing),
            }
        });

        let leaf = Node::Leaf {
            phishing: if w_legit + w_phish > 0.0 { w_phish / (w_legit + w_phish) } else { 0.0 },
            samples: task.samples.len(),
        };

        let is_pure = w_legit == 0.0 || w_phish == 0.0;
        let too_small = task.samples.len() < ctx.params.min_samples_split;
        let too_deep = ctx.params.max_depth.is_some_and(|d| task.depth >= d);
        if is_pure || too_small || too_deep {
            nodes.push(leaf);
            continue;
        }

        feature_order.shuffle(rng);
        let Some(split) = best_split(ctx, &task.samples, &feature_order) else {
            nodes.push(leaf);
            continue;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = task
            .samples
            .iter()
            .partition(|&&i| ctx.x[[i, split.feature]] <= split.threshold);

        nodes.push(Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: 0,
            right: 0,
        });

        stack.push(Pending { samples: right, depth: task.depth + 1, parent: Side::Right(index) });
        stack.push(Pending { samples: left, depth: task.depth + 1, parent: Side::Left(index) });
    }

    DecisionTree { nodes }
}

/// Best weighted-Gini split over a random subset of non-constant features
fn best_split(ctx: &GrowContext<'_, '_>, samples: &[usize], feature_order: &[usize]) -> Option<BestSplit> {
    let mut best: Option<BestSplit> = None;
    let mut tried = 0;
    let mut column: Vec<(f64, Label)> = Vec::with_capacity(samples.len());

    for &feature in feature_order {
        if tried >= ctx.features_per_split {
            break;
        }

        column.clear();
        column.extend(samples.iter().map(|&i| (ctx.x[[i, feature]], ctx.labels[i])));
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        let (first, last) = (column[0].0, column[column.len() - 1].0);
        if first == last {
            continue;
        }
        tried += 1;

        let (total_legit, total_phish) = column.iter().fold((0.0, 0.0), |(l, p), (_, label)| {
            match label {
                Label::Legitimate => (l + ctx.weights.legitimate, p),
                Label::Phishing => (l, p + ctx.weights.phishing),
            }
        });
        let total = total_legit + total_phish;

        let (mut left_legit, mut left_phish) = (0.0, 0.0);
        for pos in 0..column.len() - 1 {
            match column[pos].1 {
                Label::Legitimate => left_legit += ctx.weights.legitimate,
                Label::Phishing => left_phish += ctx.weights.phishing,
            }

            let (here, next) = (column[pos].0, column[pos + 1].0);
            if here == next {
                continue;
            }

            let left_w = left_legit + left_phish;
            let right_w = total - left_w;
            let impurity = (left_w * gini(left_legit, left_phish)
                + right_w * gini(total_legit - left_legit, total_phish - left_phish))
                / total;

            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                let mut threshold = here + (next - here) / 2.0;
                if threshold >= next {
                    threshold = here;
                }
                best = Some(BestSplit { feature, threshold, impurity });
            }
        }
    }

    best
}

fn bootstrap_sample(n_samples: usize, rng: &mut StdRng) -> Vec<usize> {
    let dist = Uniform::from(0..n_samples);
    (0..n_samples).map(|_| dist.sample(rng)).collect()
}

// ============================================================================
// FOREST
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    class_weights: ClassWeights,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit on a rows × features matrix.
    ///
    /// Tree `i` draws its bootstrap sample and split features from
    /// `seed + i`, so results do not depend on thread scheduling.
    pub fn fit(
        x: ArrayView2<'_, f64>,
        labels: &[Label],
        class_weights: ClassWeights,
        params: ForestParams,
    ) -> Result<Self, ModelError> {
        let (n_samples, n_features) = x.dim();

        if n_samples == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if n_samples != labels.len() {
            return Err(ModelError::LengthMismatch { rows: n_samples, labels: labels.len() });
        }
        if n_features == 0 {
            return Err(ModelError::FeatureCountMismatch { expected: FEATURE_COUNT, actual: 0 });
        }
        if params.n_trees == 0 {
            return Err(ModelError::NoTrees);
        }
        if let Some(row) = x.rows().into_iter().position(|r| r.iter().any(|v| !v.is_finite())) {
            return Err(ModelError::NonFiniteInput { row });
        }

        let ctx = GrowContext {
            x,
            labels,
            weights: class_weights,
            params: &params,
            features_per_split: params.features_per_split(n_features),
        };

        log::debug!(
            "Growing {} trees on {} rows ({} features, {} per split)",
            params.n_trees,
            n_samples,
            n_features,
            ctx.features_per_split
        );

        let trees: Vec<DecisionTree> = (0..params.n_trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(i as u64));
                let bootstrap = bootstrap_sample(n_samples, &mut rng);
                grow_tree(&ctx, bootstrap, &mut rng)
            })
            .collect();

        log::debug!(
            "Grew {} trees: {} nodes, max depth {}",
            trees.len(),
            trees.iter().map(DecisionTree::node_count).sum::<usize>(),
            trees.iter().map(DecisionTree::depth).max().unwrap_or(0)
        );

        Ok(Self { params, n_features, class_weights, trees })
    }

    /// Mean of per-tree leaf probabilities for one row
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        (sum / self.trees.len() as f64).clamp(0.0, 1.0)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Structural validation for a forest read from disk
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NoTrees);
        }
        if self.n_features != FEATURE_COUNT {
            return Err(ModelError::FeatureCountMismatch {
                expected: FEATURE_COUNT,
                actual: self.n_features,
            });
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|reason| ModelError::InvalidTree { tree: i, reason })?;
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn score(&self, vector: &FeatureVector) -> f64 {
        self.predict_proba(vector.as_slice())
    }
}
