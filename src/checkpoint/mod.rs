//! Checkpoint parsing
//!
//! Reads the two halves of a fetched checkpoint: the model configuration
//! (`config.json`) and the safetensors weight shards.

mod config;
mod tensors;

pub use config::ModelConfig;
pub use tensors::{TensorData, WeightShards};
