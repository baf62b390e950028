//! # Burn Sentiment
//!
//! Sentiment classification of Russian product reviews, fine-tuning a pretrained BERT on Burn.
#![forbid(unsafe_code)]

/// Text normalization and input validation
pub mod text;

/// Datasets
pub mod datasets;

/// Pipelines
pub mod pipelines;

/// Models
pub mod models;

/// Request and response shapes for the service layer
pub mod service;

/// Settings read once at startup
pub mod settings;

/// Error types
pub mod error;

/// Utilities
pub mod utils;

/// Pretrained models selectable from the command line
pub mod cli;

pub use error::{Error, Result};
pub use settings::Settings;
