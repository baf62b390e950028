//! Offline fixtures for the sentiment pipeline tests

use std::str::FromStr;

use bert_burn::model::BertModelConfig;
use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    module::Module,
    nn::{Embedding, EmbeddingConfig, Linear, LinearConfig},
    tensor::{
        backend::{AutodiffBackend, Backend},
        Tensor,
    },
    train::{ClassificationOutput, TrainOutput, TrainStep, ValidStep},
};
use tokenizers::Tokenizer;

use crate::models::bert::sequence_classification as bert;

use super::{
    batcher::{Infer, Train},
    classification_output, Classifier, Encoder, Model,
};

pub type TestBackend = NdArray;
pub type TestAutodiffBackend = Autodiff<TestBackend>;

pub const DEVICE: NdArrayDevice = NdArrayDevice::Cpu;

/// Normalized texts covered by the test vocabulary
pub const TEXTS: &[&str] = &[
    "хороший товар",
    "плохой товар",
    "отличный магазин , всем рекомендую !",
    "ужасный магазин .",
    "товар хороший , доставка быстрая .",
    "плохой плохой товар",
    "отличный",
];

const VOCAB: &[&str] = &[
    "[PAD]",
    "[UNK]",
    "[CLS]",
    "[SEP]",
    "хороший",
    "товар",
    "плохой",
    "отличный",
    "магазин",
    "ужасный",
    "всем",
    "рекомендую",
    "доставка",
    "быстрая",
    ",",
    ".",
    "!",
    "?",
];

/// The size of the test vocabulary
pub fn vocab_size() -> usize {
    VOCAB.len()
}

/// A whitespace word-level tokenizer that frames every text with `[CLS]` and `[SEP]`
pub fn tokenizer() -> Tokenizer {
    let vocab = VOCAB
        .iter()
        .enumerate()
        .map(|(id, token)| (token.to_string(), serde_json::json!(id)))
        .collect::<serde_json::Map<_, _>>();

    let json = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "WhitespaceSplit" },
        "post_processor": {
            "type": "BertProcessing",
            "sep": ["[SEP]", 3],
            "cls": ["[CLS]", 2]
        },
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": vocab,
            "unk_token": "[UNK]"
        }
    });

    Tokenizer::from_str(&json.to_string()).unwrap()
}

/// An encoder over the test tokenizer
pub fn encoder(max_length: usize) -> Encoder {
    Encoder::new(tokenizer(), max_length).unwrap()
}

/// A one-layer BERT over the test vocabulary, without dropout
pub fn tiny_bert() -> bert::Config {
    let model = BertModelConfig::new(
        2,
        1,
        1e-12,
        8,
        16,
        vocab_size(),
        16,
        2,
        0.0,
        "bert".to_string(),
        0,
    )
    .with_max_seq_len(Some(8))
    .with_with_pooling_layer(Some(true));

    bert::Config::new_for_sentiment(model)
}

/// A bag-of-embeddings classifier, small enough to train in a unit test
#[derive(Module, Debug)]
pub struct TinyClassifier<B: Backend> {
    pub embedding: Embedding<B>,
    pub output: Linear<B>,
}

impl<B: Backend> TinyClassifier<B> {
    pub fn new(device: &B::Device) -> Self {
        Self {
            embedding: EmbeddingConfig::new(vocab_size(), 8).init(device),
            output: LinearConfig::new(8, 2).init(device),
        }
    }

    fn forward(&self, item: Train<B>) -> ClassificationOutput<B> {
        let logits = self.logits(item.input);

        classification_output(logits, item.targets)
    }
}

impl<B: Backend> Classifier<B> for TinyClassifier<B> {
    fn logits(&self, input: Infer<B>) -> Tensor<B, 2> {
        let [batch_size, _] = input.tokens.dims();

        let pooled = self.embedding.forward(input.tokens).mean_dim(1);
        let [_, _, hidden] = pooled.dims();

        self.output.forward(pooled.reshape([batch_size, hidden]))
    }
}

impl<B: AutodiffBackend> TrainStep<Train<B>, ClassificationOutput<B>> for TinyClassifier<B> {
    fn step(&self, item: Train<B>) -> TrainOutput<ClassificationOutput<B>> {
        let output = self.forward(item);
        let grads = output.loss.backward();

        TrainOutput::new(self, grads, output)
    }
}

impl<B: Backend> ValidStep<Train<B>, ClassificationOutput<B>> for TinyClassifier<B> {
    fn step(&self, item: Train<B>) -> ClassificationOutput<B> {
        self.forward(item)
    }
}

impl<B: AutodiffBackend> Model<B> for TinyClassifier<B> {
    fn freeze_backbone(self) -> Self {
        Self {
            embedding: self.embedding.no_grad(),
            output: self.output,
        }
    }
}

/// A classifier keyed on the first word of each row, for deterministic evaluation tests
#[derive(Debug, Clone)]
pub struct FixedClassifier {
    /// Logits returned for rows starting with `хороший` or `отличный`
    pub positive: [f32; 2],

    /// Logits returned for every other row
    pub negative: [f32; 2],
}

impl<B: Backend> Classifier<B> for FixedClassifier {
    fn logits(&self, input: Infer<B>) -> Tensor<B, 2> {
        let [batch_size, _] = input.tokens.dims();
        let device = input.tokens.device();

        let first_words = input
            .tokens
            .slice([0..batch_size, 1..2])
            .into_data()
            .convert::<i64>()
            .value;

        let rows: Vec<Tensor<B, 2>> = first_words
            .into_iter()
            .map(|word| {
                let logits = if word == 4 || word == 7 {
                    self.positive
                } else {
                    self.negative
                };

                Tensor::<B, 1>::from_floats(logits, &device).reshape([1, 2])
            })
            .collect();

        Tensor::cat(rows, 0)
    }
}
