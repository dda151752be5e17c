use super::export::write_features;
use super::reader::{read_csv, read_from, DatasetError, DatasetOptions};
use super::record::FeatureSource;
use crate::logic::features::{FEATURE_COUNT, FEATURE_LAYOUT};
use crate::logic::label::RawLabel;
use std::fs;
use tempfile::tempdir;

fn feature_header() -> String {
    let mut cols: Vec<&str> = FEATURE_LAYOUT.to_vec();
    cols.push("CLASS_LABEL");
    cols.join(",")
}

fn feature_row(fill: &str, label: &str) -> String {
    let mut cells = vec![fill.to_string(); FEATURE_COUNT];
    cells.push(label.to_string());
    cells.join(",")
}

#[test]
fn test_read_feature_columns() {
    let csv = format!(
        "{}\n{}\n{}\n",
        feature_header(),
        feature_row("1", "1"),
        feature_row("0", "0")
    );
    let ds = read_from(csv.as_bytes(), &DatasetOptions::default()).unwrap();

    assert_eq!(ds.source, FeatureSource::Columns);
    assert_eq!(ds.examples.len(), 2);
    assert_eq!(ds.examples[0].features.as_slice(), &[1.0; FEATURE_COUNT][..]);
    assert_eq!(ds.examples[0].label, RawLabel::Number(1.0));
    assert_eq!(ds.stats.rows_rejected, 0);
}

#[test]
fn test_empty_cell_is_zero_and_garbage_rejects_row() {
    let mut with_gap = vec!["2".to_string(); FEATURE_COUNT];
    with_gap[5] = String::new();
    with_gap.push("phishing".to_string());

    let csv = format!(
        "{}\n{}\n{}\n",
        feature_header(),
        with_gap.join(","),
        feature_row("abc", "1")
    );
    let ds = read_from(csv.as_bytes(), &DatasetOptions::default()).unwrap();

    assert_eq!(ds.stats.rows_read, 2);
    assert_eq!(ds.stats.rows_rejected, 1);
    assert_eq!(ds.examples.len(), 1);
    assert_eq!(ds.examples[0].features.get(5), Some(0.0));
    assert_eq!(ds.examples[0].features.get(6), Some(2.0));
    assert_eq!(ds.examples[0].label, RawLabel::Text("phishing".to_string()));
}

#[test]
fn test_url_column_is_extracted() {
    let csv = "URL,CLASS_LABEL\nhttp://192.168.1.1/login@evil.com,bad\n,good\nhttps://example.com/,good\n";
    let ds = read_from(csv.as_bytes(), &DatasetOptions::default()).unwrap();

    assert_eq!(ds.source, FeatureSource::Extracted);
    assert_eq!(ds.examples.len(), 2);
    assert_eq!(ds.stats.rows_rejected, 1);
    assert_eq!(ds.examples[0].features.get_by_name("IpAddress"), Some(1.0));
    assert_eq!(ds.examples[1].features.get_by_name("NoHttps"), Some(0.0));
}

#[test]
fn test_custom_column_names() {
    let csv = "link,verdict\nhttps://example.com/,0\n";
    let options = DatasetOptions {
        label_column: "verdict".to_string(),
        url_column: "link".to_string(),
    };
    let ds = read_from(csv.as_bytes(), &options).unwrap();
    assert_eq!(ds.examples[0].label, RawLabel::Number(0.0));
}

#[test]
fn test_missing_columns() {
    let no_label = read_from("URL\nhttps://a.com/\n".as_bytes(), &DatasetOptions::default());
    assert!(matches!(no_label, Err(DatasetError::MissingLabelColumn(_))));

    let no_source = read_from("NumDots,CLASS_LABEL\n1,1\n".as_bytes(), &DatasetOptions::default());
    assert!(matches!(no_source, Err(DatasetError::NoFeatureSource { .. })));
}

#[test]
fn test_missing_label_cell_is_kept_raw() {
    let csv = "URL,CLASS_LABEL\nhttps://example.com/,\n";
    let ds = read_from(csv.as_bytes(), &DatasetOptions::default()).unwrap();
    assert_eq!(ds.examples[0].label, RawLabel::Missing);
}

#[test]
fn test_export_reads_back() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("urls.csv");
    fs::write(&src, "URL,CLASS_LABEL\nhttp://10.0.0.1/verify,1\nhttps://docs.rs/,legit\n").unwrap();

    let ds = read_csv(&src, &DatasetOptions::default()).unwrap();

    let mut buf = Vec::new();
    let written = write_features(&ds.examples, "CLASS_LABEL", &mut buf).unwrap();
    assert_eq!(written, 2);

    let again = read_from(buf.as_slice(), &DatasetOptions::default()).unwrap();
    assert_eq!(again.source, FeatureSource::Columns);
    assert_eq!(again.examples, ds.examples);
}

#[test]
fn test_missing_file() {
    let dir = tempdir().unwrap();
    let err = read_csv(&dir.path().join("nope.csv"), &DatasetOptions::default()).unwrap_err();
    assert!(matches!(err, DatasetError::Open { .. }));
}
