use bert_burn::{
    data::BertInferenceBatch,
    model::{BertModel, BertModelOutput},
};
use burn::{
    module::Module,
    nn::{Dropout, Linear},
    tensor::{
        backend::{AutodiffBackend, Backend},
        Tensor,
    },
    train::{ClassificationOutput, TrainOutput, TrainStep, ValidStep},
};

use crate::pipelines::sentiment::{self, batcher, classification_output, Classifier};

/// BERT for sequence Classification
#[derive(Module, Debug)]
pub struct Model<B: Backend> {
    /// The base BERT model
    pub model: BertModel<B>,

    /// Dropout applied to the pooled output
    pub dropout: Dropout,

    /// Linear layer for sequence classification
    pub output: Linear<B>,

    /// Total number of classes
    pub n_classes: usize,
}

/// Define model behavior
impl<B: Backend> Model<B> {
    /// Defines forward pass for training
    pub fn forward(&self, item: batcher::Train<B>) -> ClassificationOutput<B> {
        let output = self.logits(item.input);

        classification_output(output, item.targets)
    }
}

impl<B: Backend> Classifier<B> for Model<B> {
    fn logits(&self, input: batcher::Infer<B>) -> Tensor<B, 2> {
        let [batch_size, _seq_length] = input.tokens.dims();

        let BertModelOutput {
            pooled_output,
            hidden_states,
        } = self.model.forward(BertInferenceBatch {
            tokens: input.tokens,
            mask_pad: input.mask_pad,
        });

        let features = self.dropout.forward(pooled_output.unwrap_or(hidden_states));

        self.output
            .forward(features)
            .slice([0..batch_size, 0..1])
            .reshape([batch_size, self.n_classes])
    }
}

/// Define training step
impl<B: AutodiffBackend> TrainStep<batcher::Train<B>, ClassificationOutput<B>> for Model<B> {
    fn step(&self, item: batcher::Train<B>) -> TrainOutput<ClassificationOutput<B>> {
        // Run forward pass, calculate gradients and return them along with the output
        let output = self.forward(item);
        let grads = output.loss.backward();

        TrainOutput::new(self, grads, output)
    }
}

/// Define validation step
impl<B: Backend> ValidStep<batcher::Train<B>, ClassificationOutput<B>> for Model<B> {
    fn step(&self, item: batcher::Train<B>) -> ClassificationOutput<B> {
        self.forward(item)
    }
}

impl<B: AutodiffBackend> sentiment::Model<B> for Model<B> {
    fn freeze_backbone(self) -> Self {
        Self {
            model: self.model.no_grad(),
            ..self
        }
    }
}
