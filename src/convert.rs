//! End-to-end conversion pipeline
//!
//! Drives the full checkpoint-to-container conversion: acquire the
//! checkpoint, parse its config and tokenizer, then stream every tensor into
//! a single `.flm` file at the requested precision. The written file is read
//! back afterwards so a conversion only reports success for a container the
//! reader accepts.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::checkpoint::{ModelConfig, WeightShards};
use crate::cli::logging::{log, LogLevel};
use crate::error::{ConvertError, Result};
use crate::flm::{tensor_encoding, ExportDtype, FlmSummary, FlmWriter};
use crate::hub::{FetchOptions, HubFetcher, ModelArtifact};
use crate::vocab::Vocab;

/// Everything one conversion needs, resolved from CLI arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertRequest {
    /// Hub repository id (`org/name`) or a local checkpoint directory
    pub model: String,
    /// Repository revision (ignored for local directories)
    pub revision: String,
    /// Target precision for weight matrices
    pub dtype: ExportDtype,
    /// Output `.flm` path
    pub export_path: PathBuf,
    /// Download cache override
    pub cache_dir: Option<PathBuf>,
    /// Hub access token override
    pub token: Option<String>,
}

/// Result of a completed conversion
#[derive(Debug, Clone)]
pub struct ConversionReport {
    /// Path of the written container
    pub export_path: PathBuf,
    /// Container size in bytes
    pub file_size: u64,
    /// Number of tensors written
    pub tensor_count: usize,
    /// Number of vocabulary entries written
    pub vocab_size: usize,
    /// Total element count across all tensors
    pub param_count: u64,
    /// Precision the conversion targeted
    pub dtype: ExportDtype,
    /// Wall-clock time for the whole conversion
    pub duration: Duration,
}

impl ConversionReport {
    /// Format the container size as a human-readable string
    #[must_use]
    pub fn size_human(&self) -> String {
        human_bytes(self.file_size)
    }
}

/// Checkpoint-to-container converter
pub struct Converter {
    request: ConvertRequest,
    fetcher: HubFetcher,
}

impl Converter {
    /// Build a converter, wiring the request token into the hub client
    #[must_use]
    pub fn new(request: ConvertRequest) -> Self {
        let fetcher = match &request.token {
            Some(token) => HubFetcher::with_token(token),
            None => HubFetcher::new(),
        };
        Self { request, fetcher }
    }

    /// Run the conversion and return a report on the written container.
    ///
    /// # Errors
    ///
    /// Returns an error when the checkpoint cannot be acquired or parsed,
    /// when the output file cannot be written, or when the written container
    /// fails readback verification.
    pub fn run(&self, level: LogLevel) -> Result<ConversionReport> {
        let start = Instant::now();
        let request = &self.request;

        let artifact = self.acquire(level)?;
        log(
            level,
            LogLevel::Verbose,
            &format!(
                "  {} weight shard(s), {} total",
                artifact.weights.len(),
                human_bytes(artifact.weight_bytes())
            ),
        );
        for shard in &artifact.weights {
            log(
                level,
                LogLevel::Verbose,
                &format!(
                    "  {} ({}, sha256 {})",
                    shard.path.display(),
                    human_bytes(shard.size),
                    shard.sha256
                ),
            );
        }

        let config = ModelConfig::from_file(&artifact.config)?;
        let vocab = Vocab::from_tokenizer_file(&artifact.tokenizer)?;
        let shards = WeightShards::open(&artifact)?;
        log(
            level,
            LogLevel::Normal,
            &format!(
                "Checkpoint: {} tensors, {} parameters, {} vocab entries",
                shards.len(),
                shards.param_count(),
                vocab.len()
            ),
        );

        let metadata = config.metadata_pairs();
        let names = shards.tensor_names();

        let mut writer = FlmWriter::create(&request.export_path)?;
        writer.write_header(metadata.len() as u32, vocab.len() as u32, names.len() as u32)?;
        writer.write_metadata(&metadata)?;
        writer.write_vocab(vocab.entries())?;

        log(
            level,
            LogLevel::Normal,
            &format!("Converting {} tensors to {}", names.len(), request.dtype),
        );
        for &name in &names {
            let tensor = shards.tensor(name)?;
            let dtype = tensor_encoding(request.dtype, &tensor.shape, is_embedding(name));
            log(
                level,
                LogLevel::Verbose,
                &format!("  {} {:?} -> {}", name, tensor.shape, dtype),
            );
            writer.write_tensor(name, &tensor.shape, &tensor.data, dtype)?;
        }
        let file_size = writer.finish()?;

        verify_export(&request.export_path, metadata.len(), vocab.len(), names.len())?;

        let report = ConversionReport {
            export_path: request.export_path.clone(),
            file_size,
            tensor_count: names.len(),
            vocab_size: vocab.len(),
            param_count: shards.param_count(),
            dtype: request.dtype,
            duration: start.elapsed(),
        };
        log(
            level,
            LogLevel::Normal,
            &format!(
                "Wrote {} ({}, {} tensors) in {:.1}s",
                report.export_path.display(),
                report.size_human(),
                report.tensor_count,
                report.duration.as_secs_f64()
            ),
        );
        Ok(report)
    }

    /// Acquire the checkpoint from the hub or a local directory
    fn acquire(&self, level: LogLevel) -> Result<ModelArtifact> {
        let model = &self.request.model;
        if Path::new(model).is_dir() {
            log(
                level,
                LogLevel::Normal,
                &format!("Loading local checkpoint {model}"),
            );
            return HubFetcher::fetch_local(model);
        }

        log(
            level,
            LogLevel::Normal,
            &format!("Fetching {} (revision {})", model, self.request.revision),
        );
        let mut options = FetchOptions::default().with_revision(self.request.revision.clone());
        if let Some(dir) = &self.request.cache_dir {
            options = options.with_cache_dir(dir.clone());
        }
        self.fetcher.fetch(model, &options)
    }
}

/// Read the written container back and cross-check it against the header
/// counts the writer declared
fn verify_export(path: &Path, metadata: usize, vocab: usize, tensors: usize) -> Result<FlmSummary> {
    let summary = FlmSummary::read(path)?;
    let found = (
        summary.metadata.len(),
        summary.vocab.len(),
        summary.tensors.len(),
    );
    if found != (metadata, vocab, tensors) {
        return Err(ConvertError::Format {
            message: format!(
                "readback disagrees with export: wrote {metadata} metadata, {vocab} vocab, \
                 {tensors} tensor records, read back {}, {}, {}",
                found.0, found.1, found.2
            ),
        });
    }
    Ok(summary)
}

/// Embedding tables keep float precision even when quantization is requested
fn is_embedding(name: &str) -> bool {
    const SUFFIXES: [&str; 3] = [
        "embed_tokens.weight",
        "word_embeddings.weight",
        "wte.weight",
    ];
    SUFFIXES.iter().any(|suffix| {
        name.strip_suffix(suffix)
            .map_or(false, |head| head.is_empty() || head.ends_with('.'))
    })
}

fn human_bytes(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.2} GB", bytes as f64 / 1e9)
    } else if bytes >= 1_000_000 {
        format!("{:.2} MB", bytes as f64 / 1e6)
    } else if bytes >= 1_000 {
        format!("{:.2} KB", bytes as f64 / 1e3)
    } else {
        format!("{bytes} B")
    }
}
