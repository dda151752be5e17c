//! Logic Module - feature contract, labels, model and training
//!
//! - `features/` - URL feature layout and extraction
//! - `label` - label normalization
//! - `heuristic` - rule-based URL pre-screen
//! - `model/` - random forest, artifact, inference
//! - `dataset/` - CSV input
//! - `training/` - offline training pipeline

pub mod dataset;
pub mod features;
pub mod heuristic;
pub mod label;
pub mod model;
pub mod training;
