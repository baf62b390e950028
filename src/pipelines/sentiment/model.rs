use burn::{
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    tensor::{
        backend::{AutodiffBackend, Backend},
        Int, Tensor,
    },
    train::{ClassificationOutput, TrainStep},
};

use super::batcher::{Infer, Train};

/// A model that maps a batch of encoded reviews to class logits
pub trait Classifier<B: Backend> {
    /// Raw logits: [batch_size, n_classes]
    fn logits(&self, input: Infer<B>) -> Tensor<B, 2>;
}

/// A trait for models that can be fine-tuned for sentiment classification
pub trait Model<B: AutodiffBackend>:
    AutodiffModule<B> + TrainStep<Train<B>, ClassificationOutput<B>>
{
    /// Disable gradients for the pretrained body so only the classification head is trained
    fn freeze_backbone(self) -> Self;
}

/// Cross-entropy loss over logits, packaged for training and validation steps
pub fn classification_output<B: Backend>(
    output: Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
) -> ClassificationOutput<B> {
    let targets = targets.to_device(&output.device());

    let loss = CrossEntropyLossConfig::new()
        .init(&output.device())
        .forward(output.clone(), targets.clone());

    ClassificationOutput {
        loss,
        output,
        targets,
    }
}
