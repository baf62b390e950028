use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use crate::{error::Result, pipelines::sentiment::TrainingConfig};

/// The default location of the settings file
pub static DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Settings read once at startup
#[derive(Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Raw and processed data locations and split parameters
    #[serde(default)]
    pub preprocessing: Preprocessing,

    /// Model and training hyperparameters
    #[serde(default = "TrainingConfig::new")]
    pub train: TrainingConfig,

    /// Inference parameters
    #[serde(default)]
    pub evaluate: Evaluate,
}

/// Data locations and split parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preprocessing {
    /// Labeled reviews with ordinal ratings
    pub raw_path: String,

    /// Where the training partition is written
    pub train_path: String,

    /// Where the test partition is written
    pub test_path: String,

    /// Where scraped reviews are written
    pub scrape_path: String,

    /// Fraction held out by each stratified split
    pub test_size: f64,

    /// Seed of each stratified split
    pub random_state: u64,
}

impl Default for Preprocessing {
    fn default() -> Self {
        Self {
            raw_path: "data/raw/reviews.csv".to_string(),
            train_path: "data/processed/train.csv".to_string(),
            test_path: "data/processed/test.csv".to_string(),
            scrape_path: "data/raw/scraped.csv".to_string(),
            test_size: 0.2,
            random_state: 10,
        }
    }
}

/// Inference parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Evaluate {
    /// Batch size for file predictions, falling back to the training batch size
    pub batch_size: Option<usize>,

    /// Directory of the trained model, falling back to the training artifact directory
    pub artifact_dir: Option<String>,
}

impl Settings {
    /// Read settings from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;

        Ok(serde_yaml::from_reader(BufReader::new(file))?)
    }

    /// Parse settings from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// The directory the trained model is read from
    pub fn artifact_dir(&self) -> &str {
        self.evaluate
            .artifact_dir
            .as_deref()
            .unwrap_or(&self.train.artifact_dir)
    }

    /// The batch size for file predictions
    pub fn evaluate_batch_size(&self) -> usize {
        self.evaluate.batch_size.unwrap_or(self.train.batch_size)
    }
}
