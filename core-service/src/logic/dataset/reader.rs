//! CSV dataset reader
//!
//! Accepts either the full 32-column feature table or a table with a raw URL
//! column. The label column is kept raw; normalization happens in training.

use std::io;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::constants::{DEFAULT_LABEL_COLUMN, DEFAULT_URL_COLUMN};
use crate::logic::features::{self, FeatureVector, FEATURE_COUNT, FEATURE_LAYOUT};
use crate::logic::label::RawLabel;

use super::record::{FeatureSource, ReadStats, TrainingExample};

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("cannot read dataset {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("label column '{0}' not found in header")]
    MissingLabelColumn(String),

    #[error("dataset has neither all {count} feature columns nor a '{url_column}' column")]
    NoFeatureSource { count: usize, url_column: String },
}

/// Column names to look for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetOptions {
    pub label_column: String,
    pub url_column: String,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            label_column: DEFAULT_LABEL_COLUMN.to_string(),
            url_column: DEFAULT_URL_COLUMN.to_string(),
        }
    }
}

/// Everything read from one file
#[derive(Debug, Clone)]
pub struct Dataset {
    pub examples: Vec<TrainingExample>,
    pub source: FeatureSource,
    pub stats: ReadStats,
}

enum Columns {
    Features([usize; FEATURE_COUNT]),
    Url(usize),
}

pub fn read_csv(path: &Path, options: &DatasetOptions) -> Result<Dataset, DatasetError> {
    let file = std::fs::File::open(path).map_err(|e| DatasetError::Open {
        path: path.to_path_buf(),
        source: csv::Error::from(e),
    })?;
    let dataset = read_from(file, options)?;

    log::info!(
        "Read {} rows from {} ({:?}, {} rejected)",
        dataset.stats.rows_read,
        path.display(),
        dataset.source,
        dataset.stats.rows_rejected
    );
    Ok(dataset)
}

pub fn read_from<R: io::Read>(input: R, options: &DatasetOptions) -> Result<Dataset, DatasetError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h == name);

    let label_at = position(&options.label_column)
        .ok_or_else(|| DatasetError::MissingLabelColumn(options.label_column.clone()))?;

    let columns = match feature_columns(&headers) {
        Some(idx) => Columns::Features(idx),
        None => match position(&options.url_column) {
            Some(i) => Columns::Url(i),
            None => {
                return Err(DatasetError::NoFeatureSource {
                    count: FEATURE_COUNT,
                    url_column: options.url_column.clone(),
                })
            }
        },
    };

    let mut examples = Vec::new();
    let mut stats = ReadStats::default();
    let mut record = StringRecord::new();

    while reader.read_record(&mut record)? {
        stats.rows_read += 1;
        let line = record.position().map_or(0, |p| p.line());

        let parsed = match &columns {
            Columns::Features(idx) => parse_feature_row(&record, idx),
            Columns::Url(i) => match record.get(*i).filter(|u| !u.is_empty()) {
                Some(url) => Ok(features::extract(url)),
                None => Err("empty url".to_string()),
            },
        };

        match parsed {
            Ok(features) => examples.push(TrainingExample {
                features,
                label: RawLabel::from_cell(record.get(label_at).unwrap_or("")),
            }),
            Err(reason) => stats.reject(line, reason),
        }
    }

    if stats.rows_rejected > 0 {
        log::warn!(
            "Rejected {} of {} rows, first: {:?}",
            stats.rows_rejected,
            stats.rows_read,
            stats.rejected_samples.first()
        );
    }

    let source = match columns {
        Columns::Features(_) => FeatureSource::Columns,
        Columns::Url(_) => FeatureSource::Extracted,
    };

    Ok(Dataset { examples, source, stats })
}

/// Header position of every layout name, if all are present
fn feature_columns(headers: &StringRecord) -> Option<[usize; FEATURE_COUNT]> {
    let mut idx = [0usize; FEATURE_COUNT];
    for (slot, name) in idx.iter_mut().zip(FEATURE_LAYOUT) {
        *slot = headers.iter().position(|h| h == *name)?;
    }
    Some(idx)
}

/// Empty cells are 0.0; anything else must parse as a finite number
fn parse_feature_row(record: &StringRecord, idx: &[usize; FEATURE_COUNT]) -> Result<FeatureVector, String> {
    let mut values = [0.0f64; FEATURE_COUNT];
    for (i, &col) in idx.iter().enumerate() {
        let cell = record.get(col).unwrap_or("");
        if cell.is_empty() {
            continue;
        }
        match cell.parse::<f64>() {
            Ok(v) if v.is_finite() => values[i] = v,
            _ => return Err(format!("{}: {:?} is not a number", FEATURE_LAYOUT[i], cell)),
        }
    }
    Ok(FeatureVector::from_values(values))
}
