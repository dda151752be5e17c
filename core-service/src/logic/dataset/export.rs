use std::io;
use std::path::Path;

use csv::Writer;

use crate::logic::features::{FeatureVector, FEATURE_LAYOUT};
use crate::logic::label::RawLabel;

use super::record::TrainingExample;

/// Write examples as a feature-column CSV that `read_csv` accepts back.
/// Returns the number of rows written.
pub fn to_feature_csv(examples: &[TrainingExample], label_column: &str, target: &Path) -> Result<usize, csv::Error> {
    let file = std::fs::File::create(target)?;
    let count = write_features(examples, label_column, file)?;
    log::info!("Exported {} feature rows to {}", count, target.display());
    Ok(count)
}

pub fn write_features<W: io::Write>(examples: &[TrainingExample], label_column: &str, out: W) -> Result<usize, csv::Error> {
    let mut writer = Writer::from_writer(out);

    let mut header: Vec<&str> = FEATURE_LAYOUT.to_vec();
    header.push(label_column);
    writer.write_record(&header)?;

    for example in examples {
        writer.write_record(row(&example.features, &example.label))?;
    }

    writer.flush()?;
    Ok(examples.len())
}

fn row(features: &FeatureVector, label: &RawLabel) -> Vec<String> {
    let mut cells: Vec<String> = features.as_slice().iter().map(|v| v.to_string()).collect();
    cells.push(match label {
        RawLabel::Missing => String::new(),
        RawLabel::Number(n) => n.to_string(),
        RawLabel::Text(s) => s.clone(),
    });
    cells
}
