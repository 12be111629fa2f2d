//! Command-line argument parsing
//!
//! The two positionals mirror the conversion scripts this tool replaces:
//! `hf2flm [EXPORT_PATH] [DTYPE]`. A lone positional names the output file;
//! the dtype can only be given once a path is.

use std::path::PathBuf;

use clap::Parser;

use crate::convert::ConvertRequest;
use crate::flm::ExportDtype;

/// Model repository converted when `--model` is not given
pub const DEFAULT_MODEL: &str = "Deci/DeciCoder-1b";

/// Convert a HuggingFace causal-LM checkpoint to a single-file FLM container
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "hf2flm")]
#[command(version)]
#[command(about = "Convert HuggingFace causal-LM checkpoints to .flm model containers")]
pub struct Cli {
    /// Output path (defaults to <model>-<dtype>.flm)
    #[arg(value_name = "EXPORT_PATH")]
    pub export_path: Option<PathBuf>,

    /// Target precision: float32, float16, int8, or int4
    #[arg(value_name = "DTYPE")]
    pub dtype: Option<ExportDtype>,

    /// Model repository id (org/name) or local checkpoint directory
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Repository revision (branch, tag, or commit SHA)
    #[arg(long, default_value = "main")]
    pub revision: String,

    /// Download cache directory
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// HuggingFace access token (defaults to HF_TOKEN or ~/.huggingface/token)
    #[arg(long)]
    pub token: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Fill in the positional defaults and produce a conversion request
    #[must_use]
    pub fn resolve(self) -> ConvertRequest {
        let dtype = self.dtype.unwrap_or_default();
        let export_path = self.export_path.unwrap_or_else(|| {
            PathBuf::from(format!("{}-{}.flm", default_stem(&self.model), dtype))
        });
        ConvertRequest {
            model: self.model,
            revision: self.revision,
            dtype,
            export_path,
            cache_dir: self.cache_dir,
            token: self.token,
        }
    }
}

/// Output filename stem for a model id or checkpoint path
fn default_stem(model: &str) -> String {
    if model == DEFAULT_MODEL {
        return "decicoder".to_string();
    }
    model
        .rsplit('/')
        .find(|part| !part.is_empty())
        .unwrap_or(model)
        .to_lowercase()
}
