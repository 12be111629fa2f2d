//! Fetch options for checkpoint downloads.

use std::path::PathBuf;

/// Options controlling what a fetch downloads and where it lands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Repository revision (branch, tag, or commit SHA)
    pub revision: String,
    /// Weight filenames to download instead of the resolved defaults
    pub files: Vec<String>,
    /// Cache directory override
    pub cache_dir: Option<PathBuf>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            revision: "main".to_string(),
            files: Vec::new(),
            cache_dir: None,
        }
    }
}

impl FetchOptions {
    /// Set the revision to fetch
    #[must_use]
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    /// Download these weight files instead of resolving `model.safetensors`
    /// or the shard index
    #[must_use]
    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files = files;
        self
    }

    /// Override the cache directory
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }
}
