use burn::{
    data::dataloader::{self, batcher::Batcher as _},
    tensor::{backend::Backend, Bool, Int, Tensor},
};
use derive_new::new;

use crate::utils::tensors::{int_matrix, int_vector};

use super::dataset::Item;

/// An inference batch for sentiment classification
#[derive(Debug, Clone, new)]
pub struct Infer<B: Backend> {
    /// Token ids as a 2D tensor: [batch_size, max_seq_length]
    pub tokens: Tensor<B, 2, Int>,

    /// Padding mask, true at padded positions
    pub mask_pad: Tensor<B, 2, Bool>,
}

/// A training batch for sentiment classification
#[derive(Debug, Clone, new)]
pub struct Train<B: Backend> {
    /// Model input
    pub input: Infer<B>,

    /// Class ids for the batch
    pub targets: Tensor<B, 1, Int>,
}

/// Collects encoded items into tensors on a device
#[derive(Clone, new)]
pub struct Batcher<B: Backend> {
    /// Device on which to perform computation (e.g., CPU or CUDA device)
    device: B::Device,
}

/// Implement Batcher trait for Batcher struct for inference
impl<B: Backend> dataloader::batcher::Batcher<Item, Infer<B>> for Batcher<B> {
    /// Collects encoded items into an inference batch
    fn batch(&self, items: Vec<Item>) -> Infer<B> {
        let batch_size = items.len();
        let seq_length = items.first().map_or(0, |item| item.input_ids.len());

        let mut input_ids = Vec::with_capacity(batch_size * seq_length);
        let mut attention_mask = Vec::with_capacity(batch_size * seq_length);

        // Single-segment reviews: bert-burn embeds every token with type 0
        for item in items {
            input_ids.extend(item.input_ids);
            attention_mask.extend(item.attention_mask);
        }

        let tokens = int_matrix(&input_ids, batch_size, seq_length, &self.device);
        let attention = int_matrix::<B>(&attention_mask, batch_size, seq_length, &self.device);

        Infer {
            tokens,
            mask_pad: attention.equal_elem(0),
        }
    }
}

/// Implement Batcher trait for Batcher struct for training
impl<B: Backend> dataloader::batcher::Batcher<Item, Train<B>> for Batcher<B> {
    /// Collects labeled items into a training batch
    fn batch(&self, items: Vec<Item>) -> Train<B> {
        // Unlabeled datasets are rejected before a training loader is built
        let targets: Vec<i64> = items
            .iter()
            .map(|item| i64::from(item.target.unwrap_or_default()))
            .collect();

        let input: Infer<B> = self.batch(items);

        Train {
            input,
            targets: int_vector(&targets, &self.device),
        }
    }
}
