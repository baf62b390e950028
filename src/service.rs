//! Request validation and response shapes for the service layer in front of the pipeline

use std::{collections::BTreeMap, path::Path};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    datasets::{scrape, ReviewSource, ScrapeRequest},
    error::{Error, Result},
    pipelines::{
        sentiment::{MetricsSnapshot, SentimentStats, SinglePrediction},
        EdaReport,
    },
    text::validate_review_text,
};

/// The number of predictions echoed back for an uploaded file
pub const PREVIEW_PREDICTIONS: usize = 5;

/// A single review submitted for prediction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentRequest {
    /// The raw review text
    pub text: String,
}

impl SentimentRequest {
    /// Check the text format rules
    pub fn validate(&self) -> Result<()> {
        validate_review_text(&self.text)
    }
}

/// Predictions for an uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// The first predicted classes, in file order
    pub predictions: Vec<u8>,

    /// Shares of each predicted class over the whole file
    pub stats: SentimentStats,
}

impl PredictionResponse {
    /// Keep a preview of the predictions along with the stats of all of them
    pub fn new(mut predictions: Vec<u8>, stats: SentimentStats) -> Self {
        predictions.truncate(PREVIEW_PREDICTIONS);

        Self { predictions, stats }
    }
}

/// Prediction for a single review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputPredictionResponse {
    #[serde(rename = "Probabilities")]
    pub probabilities: BTreeMap<String, f64>,

    #[serde(rename = "Predicted_label")]
    pub predicted_label: String,
}

impl From<SinglePrediction> for InputPredictionResponse {
    fn from(prediction: SinglePrediction) -> Self {
        Self {
            probabilities: prediction.probabilities,
            predicted_label: prediction.predicted_label,
        }
    }
}

/// Metrics of the last training run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub metrics: MetricsSnapshot,
}

/// Dashboard statistics of the training corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdaResponse {
    /// Per-review statistics as CSV
    pub data_csv: String,

    /// The most frequent words
    pub words: Vec<String>,

    /// Occurrences of each word in `words`
    pub count: Vec<usize>,
}

impl EdaResponse {
    /// Render a report for the dashboard
    pub fn from_report(report: &EdaReport) -> Result<Self> {
        Ok(Self {
            data_csv: report.to_csv()?,
            words: report.words.clone(),
            count: report.counts.clone(),
        })
    }
}

/// A pipeline failure as reported to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// A stable identifier of the error kind
    pub kind: String,

    /// A human-readable description
    pub message: String,

    /// Each violated rule, for validation failures
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<String>,
}

impl From<&Error> for ErrorResponse {
    fn from(error: &Error) -> Self {
        let violations = match error {
            Error::Validation(violations) => violations.clone(),
            _ => Vec::new(),
        };

        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
            violations,
        }
    }
}

/// Scrape the pages of a request and replace the corpus at `path` with the collected reviews
pub async fn scrape_reviews<S, P>(source: &S, request: &ScrapeRequest, path: P) -> Result<usize>
where
    S: ReviewSource + ?Sized,
    P: AsRef<Path>,
{
    let corpus = scrape::collect(source, request).await?;

    corpus.save(&path)?;

    info!(
        "Saved {} scraped reviews to {}",
        corpus.len(),
        path.as_ref().display()
    );

    Ok(corpus.len())
}
