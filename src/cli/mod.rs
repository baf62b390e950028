/// CLI indexes: pretrained checkpoints
pub mod models;

pub use models::Model;
