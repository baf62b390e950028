use std::fmt::Display;

/// Model Variants
/// --------------

/// The base model type
pub static MODEL_TYPE: &str = "bert";

/// cointegrated/rubert-tiny2
pub static RUBERT_TINY2: &str = "cointegrated/rubert-tiny2";

/// cointegrated/rubert-tiny
pub static RUBERT_TINY: &str = "cointegrated/rubert-tiny";

/// DeepPavlov/rubert-base-cased
pub static RUBERT_BASE_CASED: &str = "DeepPavlov/rubert-base-cased";

/// All pretrained checkpoints that can be fine-tuned for sentiment classification
pub static ALL_MODELS: &[&str; 3] = &[RUBERT_TINY2, RUBERT_TINY, RUBERT_BASE_CASED];

/// The default model to use
pub static DEFAULT_MODEL: &str = RUBERT_TINY2;

/// Available Models
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Model {
    /// The BERT family of models, with the Hugging Face Hub name contained within
    Bert(String),
}

impl Model {
    /// Get the model type
    pub fn model_type(&self) -> &str {
        match self {
            Model::Bert(_) => MODEL_TYPE,
        }
    }

    /// The Hugging Face Hub name
    pub fn name(&self) -> &str {
        let Model::Bert(name) = self;

        name
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::Bert(DEFAULT_MODEL.to_string())
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl TryFrom<&str> for Model {
    type Error = ModelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if ALL_MODELS.contains(&value) {
            Ok(Model::Bert(value.to_string()))
        } else {
            Err(ModelError::Unknown(value.to_string()))
        }
    }
}

/// Model Error
#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    /// No model found for the given string
    #[error("no model found for {0}, expected one of: {}", ALL_MODELS.join(", "))]
    Unknown(String),
}
