//! Dataset Module - labelled training data from CSV
//!
//! Rows are read raw: feature cells are parsed (or extracted from a URL) and
//! the label is kept as written. Rows whose features cannot be parsed are
//! counted and skipped, never defaulted.

pub mod export;
pub mod reader;
pub mod record;

#[cfg(test)]
mod tests;

pub use reader::{read_csv, read_from, Dataset, DatasetError, DatasetOptions};
pub use record::{FeatureSource, ReadStats, TrainingExample};
