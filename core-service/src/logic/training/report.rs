//! Holdout evaluation report

use serde::{Deserialize, Serialize};

use crate::logic::label::Label;
use crate::logic::model::ThresholdConfig;

/// Precision / recall / F1 for one class
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub rows: usize,
    pub accuracy: f64,
    pub legitimate: ClassMetrics,
    pub phishing: ClassMetrics,
    /// Mean predicted phishing probability over the holdout rows
    pub mean_phishing_probability: f64,
}

impl EvaluationReport {
    /// `scores[i]` is the phishing probability predicted for `labels[i]`
    pub fn evaluate(scores: &[f64], labels: &[Label], threshold: ThresholdConfig) -> Self {
        let rows = scores.len().min(labels.len());
        if rows == 0 {
            return Self::default();
        }

        // confusion[actual][predicted]
        let mut confusion = [[0usize; 2]; 2];
        for (score, actual) in scores.iter().zip(labels) {
            let predicted = threshold.decide(*score);
            confusion[actual.as_index()][predicted.as_index()] += 1;
        }

        let correct = confusion[0][0] + confusion[1][1];
        let mean = scores[..rows].iter().sum::<f64>() / rows as f64;

        Self {
            rows,
            accuracy: correct as f64 / rows as f64,
            legitimate: class_metrics(&confusion, Label::Legitimate),
            phishing: class_metrics(&confusion, Label::Phishing),
            mean_phishing_probability: mean,
        }
    }

    pub fn log(&self) {
        log::info!("Holdout: {} rows, accuracy {:.4}", self.rows, self.accuracy);
        for (name, m) in [("legitimate", &self.legitimate), ("phishing", &self.phishing)] {
            log::info!(
                "  {:<10} precision {:.4}  recall {:.4}  f1 {:.4}  support {}",
                name,
                m.precision,
                m.recall,
                m.f1,
                m.support
            );
        }
        log::info!("  mean phishing probability {:.4}", self.mean_phishing_probability);
    }
}

fn class_metrics(confusion: &[[usize; 2]; 2], class: Label) -> ClassMetrics {
    let c = class.as_index();
    let other = 1 - c;

    let tp = confusion[c][c] as f64;
    let fp = confusion[other][c] as f64;
    let fn_ = confusion[c][other] as f64;

    let ratio = |num: f64, den: f64| if den > 0.0 { num / den } else { 0.0 };
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);

    ClassMetrics {
        precision,
        recall,
        f1: ratio(2.0 * precision * recall, precision + recall),
        support: confusion[c][0] + confusion[c][1],
    }
}
