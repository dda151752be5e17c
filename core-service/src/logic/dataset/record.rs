use crate::logic::features::FeatureVector;
use crate::logic::label::RawLabel;

/// One labelled row as read from a dataset, before label normalization
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub features: FeatureVector,
    pub label: RawLabel,
}

/// How the feature values of a dataset were obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSource {
    /// All layout columns were present in the file
    Columns,
    /// Features were extracted from a URL column
    Extracted,
}

/// Row accounting for one read
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReadStats {
    pub rows_read: usize,
    /// Rows with an unparsable feature cell or an empty URL
    pub rows_rejected: usize,
    /// Line number and reason of the first few rejects
    pub rejected_samples: Vec<(u64, String)>,
}

const MAX_REJECT_SAMPLES: usize = 10;

impl ReadStats {
    pub(crate) fn reject(&mut self, line: u64, reason: String) {
        self.rows_rejected += 1;
        if self.rejected_samples.len() < MAX_REJECT_SAMPLES {
            self.rejected_samples.push((line, reason));
        }
    }
}
