/// Tensor construction and extraction helpers
pub mod tensors;

/// Class id and label name mappings
pub mod classes;

/// Pretrained checkpoint resolution, locally or from the Hugging Face Hub
pub mod hugging_face;
