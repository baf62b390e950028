use std::path::{Path, PathBuf};

use hf_hub::api::tokio::Api;
use log::info;

use crate::error::{Error, Result};

/// Name of the model config file in a checkpoint directory
pub static CONFIG_FILE: &str = "config.json";

/// Name of the weights file in a checkpoint directory
pub static WEIGHTS_FILE: &str = "model.safetensors";

/// Name of the tokenizer file in a checkpoint directory
pub static TOKENIZER_FILE: &str = "tokenizer.json";

/// Locations of the files making up a pretrained checkpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PretrainedFiles {
    /// The Hugging Face model config
    pub config: PathBuf,

    /// The model weights
    pub weights: PathBuf,

    /// The tokenizer definition
    pub tokenizer: PathBuf,
}

impl PretrainedFiles {
    /// The standard file layout inside `dir`
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();

        Self {
            config: dir.join(CONFIG_FILE),
            weights: dir.join(WEIGHTS_FILE),
            tokenizer: dir.join(TOKENIZER_FILE),
        }
    }

    /// Whether every file is present
    pub fn exist(&self) -> bool {
        [&self.config, &self.weights, &self.tokenizer]
            .iter()
            .all(|path| path.is_file())
    }

    /// Fail with the first missing file
    pub fn check(&self) -> Result<()> {
        for path in [&self.config, &self.weights, &self.tokenizer] {
            if !path.is_file() {
                return Err(Error::CheckpointLoad(format!(
                    "{} does not exist",
                    path.display()
                )));
            }
        }

        Ok(())
    }
}

/// Resolve a pretrained checkpoint from `model_dir`, downloading `model_name` from the Hugging
/// Face Hub when the directory is incomplete
pub async fn resolve_pretrained(model_dir: &str, model_name: &str) -> Result<PretrainedFiles> {
    let local = PretrainedFiles::in_dir(model_dir);

    if local.exist() {
        info!("Using pretrained checkpoint from {}", model_dir);
        return Ok(local);
    }

    info!("Downloading pretrained checkpoint {} from the Hub", model_name);

    download_hf_model(model_name).await
}

/// Download model config, weights and tokenizer from Hugging Face Hub
/// If file exists in cache, it will not be downloaded again
pub async fn download_hf_model(model_name: &str) -> Result<PretrainedFiles> {
    let api = Api::new().map_err(|e| Error::CheckpointLoad(e.to_string()))?;
    let repo = api.model(model_name.to_string());

    let get = |file: &'static str| {
        let repo = &repo;
        async move {
            repo.get(file).await.map_err(|e| {
                Error::CheckpointLoad(format!(
                    "failed to download {file} for {model_name} from the Hugging Face Hub: {e}"
                ))
            })
        }
    };

    Ok(PretrainedFiles {
        config: get(CONFIG_FILE).await?,
        weights: get(WEIGHTS_FILE).await?,
        tokenizer: get(TOKENIZER_FILE).await?,
    })
}
