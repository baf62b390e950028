/// Result alias for the sentiment pipeline
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by the preprocessing, training and evaluation pipeline
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The input is not tabular, or a column holds values of the wrong type
    #[error("malformed table: {0}")]
    Schema(String),

    /// A column required by the operation is absent
    #[error("required column `{0}` is missing")]
    MissingColumn(String),

    /// A stratified split cannot keep both classes on each side
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Inference was requested over zero rows
    #[error("cannot run inference on an empty dataset")]
    EmptyDataset,

    /// Boundary input violated one or more format rules
    #[error("input failed validation: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The pretrained or trained model could not be loaded
    #[error("unable to load checkpoint: {0}")]
    CheckpointLoad(String),

    /// Positional access past the end of a dataset
    #[error("index {index} is out of range for a dataset of length {len}")]
    Index {
        /// The requested position
        index: usize,
        /// The dataset length
        len: usize,
    },

    /// A setting has a value outside its accepted range
    #[error("invalid setting: {0}")]
    Config(String),

    /// The tokenizer rejected its configuration or input
    #[error("tokenizer failure: {0}")]
    Tokenizer(String),

    /// An external review source failed to deliver a page
    #[error("unable to fetch reviews: {0}")]
    Fetch(String),

    /// Filesystem failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// CSV reading or writing failure
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// JSON encoding or decoding failure
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML settings decoding failure
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// A stable identifier for the error kind, used in client-facing responses
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Schema(_) => "schema_error",
            Error::MissingColumn(_) => "missing_column_error",
            Error::InsufficientData(_) => "insufficient_data_error",
            Error::EmptyDataset => "empty_dataset_error",
            Error::Validation(_) => "validation_error",
            Error::CheckpointLoad(_) => "checkpoint_load_error",
            Error::Index { .. } => "index_error",
            Error::Config(_) => "config_error",
            Error::Tokenizer(_) => "tokenizer_error",
            Error::Fetch(_) => "fetch_error",
            Error::Io(_) | Error::Csv(_) | Error::Json(_) | Error::Yaml(_) => "io_error",
        }
    }

    /// Whether the pipeline cannot continue after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::CheckpointLoad(_))
    }
}
