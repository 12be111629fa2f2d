//! Checkpoint acquisition
//!
//! Fetches checkpoints from the HuggingFace Hub (with authentication and
//! caching handled by hf-hub) or from a local directory, producing the same
//! [`ModelArtifact`] either way.

mod fetcher;
mod options;
mod types;

pub use fetcher::HubFetcher;
pub use options::FetchOptions;
pub use types::{ModelArtifact, WeightFormat, WeightShard};
