//! HuggingFace Hub checkpoint fetcher.
//!
//! Downloads `config.json`, `tokenizer.json`, and the safetensors weights
//! (single file or every shard named by `model.safetensors.index.json`)
//! through the hf-hub sync API, or assembles the same artifact from a local
//! checkpoint directory without touching the network.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{ConvertError, Result};

use super::options::FetchOptions;
use super::types::{ModelArtifact, WeightFormat, WeightShard};

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const WEIGHTS_FILE: &str = "model.safetensors";
const WEIGHTS_INDEX_FILE: &str = "model.safetensors.index.json";

/// Sharded checkpoint index: tensor name to shard filename
#[derive(Debug, Deserialize)]
struct ShardIndex {
    weight_map: std::collections::BTreeMap<String, String>,
}

/// HuggingFace Hub client wrapper
pub struct HubFetcher {
    token: Option<String>,
    cache_dir: PathBuf,
}

impl HubFetcher {
    /// Create a fetcher, resolving authentication from the environment
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: Self::resolve_token(),
            cache_dir: Self::default_cache_dir(),
        }
    }

    /// Create a fetcher with an explicit token
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            cache_dir: Self::default_cache_dir(),
        }
    }

    /// Set the cache directory
    #[must_use]
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Resolve token from the environment.
    ///
    /// Priority:
    /// 1. `HF_TOKEN` environment variable
    /// 2. `~/.huggingface/token` file
    #[must_use]
    pub fn resolve_token() -> Option<String> {
        if let Ok(token) = std::env::var("HF_TOKEN") {
            if !token.is_empty() {
                return Some(token);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let token_path = home.join(".huggingface").join("token");
            if let Ok(token) = std::fs::read_to_string(token_path) {
                let token = token.trim().to_string();
                if !token.is_empty() {
                    return Some(token);
                }
            }
        }

        None
    }

    fn default_cache_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("huggingface")
            .join("hub")
    }

    /// Check if the client has authentication
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Parse and validate a repository ID
    pub(crate) fn parse_repo_id(repo_id: &str) -> Result<(&str, &str)> {
        let parts: Vec<&str> = repo_id.split('/').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(ConvertError::InvalidRepoId {
                repo_id: repo_id.to_string(),
            });
        }
        Ok((parts[0], parts[1]))
    }

    /// Refuse weight filenames that would require parsing pickle
    fn check_weight_names(files: &[String]) -> Result<()> {
        for file in files {
            if let Some(format) = WeightFormat::from_filename(file) {
                if !format.is_safe() {
                    return Err(ConvertError::PickleWeights { file: file.clone() });
                }
            }
        }
        Ok(())
    }

    /// Build the hf-hub sync API client with optional authentication
    fn build_api(&self, cache_dir: PathBuf) -> Result<hf_hub::api::sync::Api> {
        let mut builder = hf_hub::api::sync::ApiBuilder::new().with_cache_dir(cache_dir);
        if let Some(token) = &self.token {
            builder = builder.with_token(Some(token.clone()));
        }
        builder.build().map_err(|e| ConvertError::DownloadFailed {
            repo: "huggingface.co".to_string(),
            message: format!("failed to initialize hub API: {e}"),
        })
    }

    /// Download one file, mapping 404s to a typed error
    fn download(
        repo: &hf_hub::api::sync::ApiRepo,
        repo_id: &str,
        file: &str,
    ) -> Result<PathBuf> {
        match repo.get(file) {
            Ok(path) => Ok(path),
            Err(hf_hub::api::sync::ApiError::RequestError(e)) => {
                if e.to_string().contains("404") {
                    Err(ConvertError::FileNotFound {
                        repo: repo_id.to_string(),
                        file: file.to_string(),
                    })
                } else {
                    Err(ConvertError::DownloadFailed {
                        repo: repo_id.to_string(),
                        message: e.to_string(),
                    })
                }
            }
            Err(e) => Err(ConvertError::DownloadFailed {
                repo: repo_id.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Fetch a checkpoint from the hub.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed repo ids, missing repos or files,
    /// pickle-only checkpoints, and network failures.
    pub fn fetch(&self, repo_id: &str, options: &FetchOptions) -> Result<ModelArtifact> {
        Self::parse_repo_id(repo_id)?;
        Self::check_weight_names(&options.files)?;

        let cache_dir = options
            .cache_dir
            .clone()
            .unwrap_or_else(|| self.cache_dir.clone());
        let api = self.build_api(cache_dir)?;

        let repo = if options.revision == "main" {
            api.model(repo_id.to_string())
        } else {
            api.repo(hf_hub::Repo::with_revision(
                repo_id.to_string(),
                hf_hub::RepoType::Model,
                options.revision.clone(),
            ))
        };

        // A missing config.json means the repo (or revision) itself is absent
        let config = Self::download(&repo, repo_id, CONFIG_FILE).map_err(|e| match e {
            ConvertError::FileNotFound { repo, .. } => ConvertError::ModelNotFound { repo },
            other => other,
        })?;
        let tokenizer = Self::download(&repo, repo_id, TOKENIZER_FILE)?;

        let weight_files = if options.files.is_empty() {
            Self::resolve_weight_files(&repo, repo_id)?
        } else {
            options.files.clone()
        };

        let mut weights = Vec::with_capacity(weight_files.len());
        for file in &weight_files {
            let path = Self::download(&repo, repo_id, file)?;
            weights.push(digest_shard(path)?);
        }

        Ok(ModelArtifact {
            config,
            tokenizer,
            weights,
        })
    }

    /// Resolve the weight file list: the shard index if present, otherwise
    /// the single-file default
    fn resolve_weight_files(
        repo: &hf_hub::api::sync::ApiRepo,
        repo_id: &str,
    ) -> Result<Vec<String>> {
        match Self::download(repo, repo_id, WEIGHTS_INDEX_FILE) {
            Ok(index_path) => shard_names(&index_path),
            Err(ConvertError::FileNotFound { .. }) => Ok(vec![WEIGHTS_FILE.to_string()]),
            Err(e) => Err(e),
        }
    }

    /// Assemble an artifact from a local checkpoint directory, no network.
    ///
    /// # Errors
    ///
    /// Returns an error when `config.json`, `tokenizer.json`, or the
    /// safetensors weights are missing, or when only pickle weights exist.
    pub fn fetch_local(dir: impl AsRef<Path>) -> Result<ModelArtifact> {
        let dir = dir.as_ref();
        let config = local_file(dir, CONFIG_FILE)?;
        let tokenizer = local_file(dir, TOKENIZER_FILE)?;

        let index = dir.join(WEIGHTS_INDEX_FILE);
        let weight_paths: Vec<PathBuf> = if index.is_file() {
            shard_names(&index)?
                .into_iter()
                .map(|name| dir.join(name))
                .collect()
        } else if dir.join(WEIGHTS_FILE).is_file() {
            vec![dir.join(WEIGHTS_FILE)]
        } else {
            scan_safetensors(dir)?
        };

        if weight_paths.is_empty() {
            return Err(missing_weights_error(dir));
        }

        let mut weights = Vec::with_capacity(weight_paths.len());
        for path in weight_paths {
            if !path.is_file() {
                return Err(ConvertError::FileNotFound {
                    repo: dir.display().to_string(),
                    file: path.display().to_string(),
                });
            }
            weights.push(digest_shard(path)?);
        }

        Ok(ModelArtifact {
            config,
            tokenizer,
            weights,
        })
    }
}

impl Default for HubFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a shard index and return its unique shard filenames, sorted
fn shard_names(index_path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(index_path)?;
    let index: ShardIndex = serde_json::from_str(&text)?;
    let unique: BTreeSet<String> = index.weight_map.into_values().collect();
    Ok(unique.into_iter().collect())
}

/// Hash a shard and record its size
fn digest_shard(path: PathBuf) -> Result<WeightShard> {
    let mut file = std::fs::File::open(&path)?;
    let mut hasher = Sha256::new();
    let size = std::io::copy(&mut file, &mut hasher)?;
    let sha256 = format!("{:x}", hasher.finalize());
    Ok(WeightShard { path, size, sha256 })
}

fn local_file(dir: &Path, name: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(ConvertError::FileNotFound {
            repo: dir.display().to_string(),
            file: name.to_string(),
        })
    }
}

/// Collect `*.safetensors` files in a directory, sorted by name
fn scan_safetensors(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("safetensors") {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// Distinguish "no weights" from "pickle-only weights" for the diagnostic
fn missing_weights_error(dir: &Path) -> ConvertError {
    for candidate in ["pytorch_model.bin", "pytorch_model.bin.index.json"] {
        if dir.join(candidate).is_file() {
            return ConvertError::PickleWeights {
                file: candidate.to_string(),
            };
        }
    }
    ConvertError::FileNotFound {
        repo: dir.display().to_string(),
        file: WEIGHTS_FILE.to_string(),
    }
}
