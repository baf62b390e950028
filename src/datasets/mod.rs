/// Tabular review data and schema reconciliation
pub mod table;

/// Ordinal rating to binary sentiment transform
pub mod labels;

/// Stratified train/test splitting
pub mod split;

/// File-backed value cache
pub mod cache;

/// Review collection from paginated listings
pub mod scrape;

pub use cache::FileCache;
pub use labels::binarize;
pub use scrape::{ReviewSource, ScrapeCorpus, ScrapeRequest};
pub use split::split;
pub use table::{load, load_all, read, read_all, LabelKind, Labels, Schema, Table};
