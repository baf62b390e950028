use std::path::Path;

use bert_burn::model::BertModel;
use burn::{
    config::Config as _,
    module::Module,
    record::{CompactRecorder, Recorder},
    tensor::backend::Backend,
};
use log::info;
use tokenizers::Tokenizer;

use crate::{
    error::{Error, Result},
    utils::hugging_face::{PretrainedFiles, CONFIG_FILE, TOKENIZER_FILE},
};

use super::{Config, Model};

/// File stem of the trained weights inside an artifact directory
pub static MODEL_FILE: &str = "model";

/// Build a classifier from a pretrained checkpoint, with a head initialized from `seed`
pub fn load_pretrained<B: Backend>(
    files: &PretrainedFiles,
    max_seq_length: usize,
    hidden_dropout_prob: f64,
    seed: u64,
    device: &B::Device,
) -> Result<(Model<B>, Config)> {
    files.check()?;

    let config = Config::load_pretrained(&files.config, max_seq_length, hidden_dropout_prob)?;

    info!("Loading pretrained weights from {}", files.weights.display());

    let record = BertModel::from_safetensors(files.weights.clone(), device, config.get_bert_config());

    let mut model = config.init_seeded(seed, device);
    model.model = model.model.load_record(record);

    Ok((model, config))
}

/// Save the trained weights, the model config and the tokenizer to `artifact_dir`
pub fn save<B: Backend>(
    model: Model<B>,
    config: &Config,
    tokenizer: &Tokenizer,
    artifact_dir: &str,
) -> Result<()> {
    let dir = Path::new(artifact_dir);
    std::fs::create_dir_all(dir)?;

    config.save(dir.join(CONFIG_FILE))?;

    tokenizer
        .save(dir.join(TOKENIZER_FILE), false)
        .map_err(|e| Error::Tokenizer(e.to_string()))?;

    CompactRecorder::new()
        .record(model.into_record(), dir.join(MODEL_FILE))
        .map_err(|e| Error::CheckpointLoad(format!("unable to save model weights: {}", e)))?;

    info!("Saved trained model to {}", artifact_dir);

    Ok(())
}

/// Load a classifier saved by [`save`], along with its config and tokenizer
pub fn load_trained<B: Backend>(
    artifact_dir: &str,
    device: &B::Device,
) -> Result<(Model<B>, Config, Tokenizer)> {
    let dir = Path::new(artifact_dir);

    let mut config = Config::load(dir.join(CONFIG_FILE))
        .map_err(|e| Error::CheckpointLoad(format!("unable to load config file: {}", e)))?;

    // Inference runs without dropout
    config.hidden_dropout_prob = 0.0;

    let tokenizer = Tokenizer::from_file(dir.join(TOKENIZER_FILE))
        .map_err(|e| Error::CheckpointLoad(format!("unable to load tokenizer: {}", e)))?;

    let record = CompactRecorder::new()
        .load(dir.join(MODEL_FILE), device)
        .map_err(|e| Error::CheckpointLoad(format!("unable to load trained model weights: {}", e)))?;

    let model = config.init(device).load_record(record);

    Ok((model, config, tokenizer))
}
