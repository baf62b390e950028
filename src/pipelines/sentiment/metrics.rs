//! Binary classification metrics over the positive-class probability

use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Probabilities are clipped to `[EPSILON, 1 - EPSILON]` before taking logarithms
const EPSILON: f64 = 1e-15;

/// Test-set quality of a trained model, each value rounded to 3 decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Area under the ROC curve
    pub roc_auc: f64,
    /// Precision of the positive class
    pub precision: f64,
    /// Recall of the positive class
    pub recall: f64,
    /// F1 score of the positive class
    pub f1: f64,
    /// Binary cross-entropy
    pub logloss: f64,
}

impl MetricsSnapshot {
    /// Compute every metric from true targets and positive-class probabilities.
    ///
    /// Predictions are the arg-max class, so a probability of exactly 0.5 counts as negative.
    pub fn compute(targets: &[u8], probabilities: &[f64]) -> Result<Self> {
        if targets.len() != probabilities.len() {
            return Err(Error::Schema(format!(
                "{} targets but {} probabilities",
                targets.len(),
                probabilities.len()
            )));
        }

        let roc_auc = roc_auc(targets, probabilities).ok_or_else(|| {
            Error::InsufficientData("ROC-AUC needs both classes in the test set".to_string())
        })?;

        let predictions: Vec<u8> = probabilities.iter().map(|&p| u8::from(p > 0.5)).collect();
        let matrix = ConfusionMatrix::from_predictions(targets, &predictions);

        Ok(Self {
            roc_auc: round3(roc_auc),
            precision: round3(matrix.precision()),
            recall: round3(matrix.recall()),
            f1: round3(matrix.f1()),
            logloss: round3(logloss(targets, probabilities)),
        })
    }

    /// Replace the snapshot at `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_json(path.as_ref(), self)
    }
}

/// Per-epoch validation curve of a training run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    /// Validation ROC-AUC per epoch
    pub auc: Vec<f64>,
    /// Mean validation loss per epoch
    pub eval_loss: Vec<f64>,
}

impl History {
    /// Record one epoch
    pub fn push(&mut self, auc: f64, eval_loss: f64) {
        self.auc.push(auc);
        self.eval_loss.push(eval_loss);
    }

    /// The number of recorded epochs
    pub fn len(&self) -> usize {
        self.auc.len()
    }

    /// Whether no epoch was recorded
    pub fn is_empty(&self) -> bool {
        self.auc.is_empty()
    }

    /// Replace the history at `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_json(path.as_ref(), self)
    }
}

/// Read the metrics persisted by the last training run
pub fn load_metrics<P: AsRef<Path>>(path: P) -> Result<MetricsSnapshot> {
    read_json(path.as_ref())
}

/// Read the per-epoch history persisted by the last training run
pub fn load_history<P: AsRef<Path>>(path: P) -> Result<History> {
    read_json(path.as_ref())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    serde_json::to_writer_pretty(File::create(path)?, value)?;

    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
}

/// Confusion matrix for binary classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    /// True positives
    pub tp: usize,
    /// True negatives
    pub tn: usize,
    /// False positives
    pub fp: usize,
    /// False negatives
    pub fn_: usize,
}

impl ConfusionMatrix {
    /// Count outcomes of predicted classes against true classes
    pub fn from_predictions(targets: &[u8], predictions: &[u8]) -> Self {
        let mut matrix = Self::default();

        for (&t, &p) in targets.iter().zip(predictions) {
            match (t == 1, p == 1) {
                (true, true) => matrix.tp += 1,
                (false, false) => matrix.tn += 1,
                (false, true) => matrix.fp += 1,
                (true, false) => matrix.fn_ += 1,
            }
        }

        matrix
    }

    /// TP / (TP + FP), 0 when nothing was predicted positive
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    /// TP / (TP + FN), 0 when there are no positives
    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// Harmonic mean of precision and recall
    pub fn f1(&self) -> f64 {
        ratio(2 * self.tp, 2 * self.tp + self.fp + self.fn_)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// ROC-AUC via the Mann-Whitney U statistic, with tied scores sharing their average rank.
///
/// Undefined, and `None`, unless both classes are present.
pub fn roc_auc(targets: &[u8], scores: &[f64]) -> Option<f64> {
    let n_pos = targets.iter().filter(|&&t| t == 1).count();
    let n_neg = targets.len() - n_pos;

    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum = 0.0;
    let mut start = 0;

    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }

        // Ranks are 1-based: the tie group covers ranks start + 1 ..= end
        let rank = (start + 1 + end) as f64 / 2.0;
        let positives = order[start..end]
            .iter()
            .filter(|&&i| targets[i] == 1)
            .count();
        rank_sum += rank * positives as f64;

        start = end;
    }

    let n_pos = n_pos as f64;
    let u = rank_sum - n_pos * (n_pos + 1.0) / 2.0;

    Some(u / (n_pos * n_neg as f64))
}

/// Mean binary cross-entropy of positive-class probabilities
pub fn logloss(targets: &[u8], probabilities: &[f64]) -> f64 {
    if targets.is_empty() {
        return 0.0;
    }

    let total: f64 = targets
        .iter()
        .zip(probabilities)
        .map(|(&t, &p)| {
            let p = p.clamp(EPSILON, 1.0 - EPSILON);
            if t == 1 {
                -p.ln()
            } else {
                -(1.0 - p).ln()
            }
        })
        .sum();

    total / targets.len() as f64
}

/// Round to 3 decimal places
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
