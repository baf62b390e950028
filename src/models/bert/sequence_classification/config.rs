use std::{collections::BTreeMap, path::Path};

use bert_burn::model::BertModelConfig;
use burn::{
    config::Config as _,
    nn::{DropoutConfig, LinearConfig},
    tensor::backend::Backend,
};

use crate::{
    error::{Error, Result},
    utils::classes::{id2label, label2id},
};

use super::Model;

/// Configuration of the BERT sentiment classifier, saved beside the trained weights
#[derive(burn::config::Config)]
pub struct Config {
    // -- BertModelConfig fields, flattened so config.json keeps the Hugging Face layout
    /// Attention heads per layer
    pub num_attention_heads: usize,
    /// Encoder layers
    pub num_hidden_layers: usize,
    /// Layer normalization epsilon
    pub layer_norm_eps: f64,
    /// Size of bert embedding (312 for rubert-tiny2)
    pub hidden_size: usize,
    /// Feedforward width
    pub intermediate_size: usize,
    /// Size of the vocabulary
    pub vocab_size: usize,
    /// Max position embeddings
    pub max_position_embeddings: usize,
    /// Number of token types (segments)
    pub type_vocab_size: usize,
    /// Dropout in the encoder and before the classification head
    pub hidden_dropout_prob: f64,
    /// Architecture name, `bert` for the supported checkpoints
    pub model_type: String,
    /// Index of the padding token
    pub pad_token_id: usize,
    /// Length every review is padded or truncated to
    pub max_seq_len: Option<usize>,
    /// Always enabled for classification
    pub with_pooling_layer: Option<bool>,
    // --
    /// Class names by class id
    pub id2label: BTreeMap<usize, String>,
    /// Class ids by class name
    pub label2id: BTreeMap<String, usize>,
}

impl Config {
    /// Attach the sentiment labels to a base BERT config
    pub fn new_for_sentiment(model: BertModelConfig) -> Self {
        Config::new(
            model.num_attention_heads,
            model.num_hidden_layers,
            model.layer_norm_eps,
            model.hidden_size,
            model.intermediate_size,
            model.vocab_size,
            model.max_position_embeddings,
            model.type_vocab_size,
            model.hidden_dropout_prob,
            model.model_type,
            model.pad_token_id,
            id2label(),
            label2id(),
        )
        .with_max_seq_len(model.max_seq_len)
        .with_with_pooling_layer(model.with_pooling_layer)
    }

    /// Load a pretrained Hugging Face config and prepare it for fine-tuning
    pub fn load_pretrained<P: AsRef<Path>>(
        config_file: P,
        max_seq_length: usize,
        hidden_dropout_prob: f64,
    ) -> Result<Self> {
        let config_file = config_file.as_ref();

        let mut bert_config = BertModelConfig::load(config_file).map_err(|e| {
            Error::CheckpointLoad(format!(
                "unable to load Hugging Face config file {}: {}",
                config_file.display(),
                e
            ))
        })?;

        // Enable the pooling layer for sequence classification
        bert_config.with_pooling_layer = Some(true);
        bert_config.max_seq_len = Some(max_seq_length.min(bert_config.max_position_embeddings));
        bert_config.hidden_dropout_prob = hidden_dropout_prob;

        Ok(Config::new_for_sentiment(bert_config))
    }

    /// The base BERT configuration
    pub fn get_bert_config(&self) -> BertModelConfig {
        BertModelConfig::new(
            self.num_attention_heads,
            self.num_hidden_layers,
            self.layer_norm_eps,
            self.hidden_size,
            self.intermediate_size,
            self.vocab_size,
            self.max_position_embeddings,
            self.type_vocab_size,
            self.hidden_dropout_prob,
            self.model_type.clone(),
            self.pad_token_id,
        )
        .with_max_seq_len(self.max_seq_len)
        .with_with_pooling_layer(self.with_pooling_layer)
    }

    /// Seed the backend, then initialize the model
    pub fn init_seeded<B: Backend>(&self, seed: u64, device: &B::Device) -> Model<B> {
        B::seed(seed);

        self.init(device)
    }

    /// Initialize the model with random weights
    pub fn init<B: Backend>(&self, device: &B::Device) -> Model<B> {
        let model = self.get_bert_config().init(device);

        let n_classes = self.id2label.len();

        let dropout = DropoutConfig::new(self.hidden_dropout_prob).init();
        let output = LinearConfig::new(self.hidden_size, n_classes).init(device);

        Model {
            model,
            dropout,
            output,
            n_classes,
        }
    }
}
