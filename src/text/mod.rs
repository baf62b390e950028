/// Canonical cleaning of raw review text
pub mod normalize;

/// Format rules applied to user input before it reaches the pipeline
pub mod validation;

pub use normalize::{normalize, sentences, words};
pub use validation::{validate_review_text, validate_scrape_request};
