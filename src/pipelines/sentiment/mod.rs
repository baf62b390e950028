/// Fixed-length tokenization in memory-bounded chunks
pub mod encoding;

/// Indexable container of encoded reviews
pub mod dataset;

/// Collects dataset items into tensors
pub mod batcher;

/// Traits a classifier implements to be trained and evaluated here
pub mod model;

/// Binary classification metrics and their persistence
pub mod metrics;

/// The fine-tuning loop
pub mod training;

/// Batch and single-review predictions
pub mod evaluation;

/// End-to-end training and prediction over files on disk
pub mod pipeline;

#[cfg(test)]
pub(crate) mod testing;

pub use batcher::{Batcher, Infer, Train};
pub use dataset::{EncodedDataset, Item};
pub use encoding::{Encoder, Encodings};
pub use evaluation::{evaluate_batch, evaluate_single, summarize, SentimentStats, SinglePrediction};
pub use metrics::{load_history, load_metrics, History, MetricsSnapshot};
pub use model::{classification_output, Classifier, Model};
pub use pipeline::{run_training, Predictor};
pub use training::{train, TrainedModel, TrainingConfig};
