/// Sentiment classification of reviews
pub mod sentiment;

/// Exploratory statistics for the dashboard
pub mod eda;

pub use eda::{Eda, EdaReport, EdaRow};
