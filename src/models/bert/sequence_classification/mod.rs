/// The model configuration
pub mod config;

/// Bert for Sequence Classification
pub mod model;

/// Loading pretrained checkpoints and persisting trained ones
pub mod checkpoint;

pub use checkpoint::{load_pretrained, load_trained, save};
pub use config::Config;
pub use model::{Model, ModelRecord};
