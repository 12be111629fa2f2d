//! Error types for checkpoint conversion
//!
//! Every pipeline stage fails with a typed variant so the CLI can print one
//! diagnostic line and exit non-zero.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Errors that can occur while fetching, parsing, or exporting a checkpoint
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Invalid repository ID format
    #[error("Invalid repository ID format (expected 'org/name'): {repo_id}")]
    InvalidRepoId { repo_id: String },

    /// Model repository (or revision) not found
    #[error("Repository not found: {repo}")]
    ModelNotFound { repo: String },

    /// File missing from repository or local checkpoint directory
    #[error("File not found in {repo}: {file}")]
    FileNotFound { repo: String, file: String },

    /// Network-level download failure
    #[error("Download failed for {repo}: {message}")]
    DownloadFailed { repo: String, message: String },

    /// SECURITY: PyTorch pickle weights detected
    #[error(
        "SECURITY: {file} is a PyTorch pickle file and may contain arbitrary code; \
         convert the checkpoint to safetensors first"
    )]
    PickleWeights { file: String },

    /// Model config parsing error
    #[error("Failed to parse config.json: {message}")]
    ConfigParse { message: String },

    /// Tokenizer file parsing error
    #[error("Failed to parse tokenizer at {}: {message}", .path.display())]
    TokenizerParse { path: PathBuf, message: String },

    /// Safetensors shard parsing error
    #[error("Failed to parse safetensors shard {}: {message}", .path.display())]
    ShardParse { path: PathBuf, message: String },

    /// Source tensor stored in a dtype the converter cannot widen to f32
    #[error("Unsupported source dtype {dtype} for tensor {tensor}")]
    UnsupportedTensorDtype { tensor: String, dtype: String },

    /// Same tensor name appears in more than one shard
    #[error("Duplicate tensor name across shards: {name}")]
    DuplicateTensor { name: String },

    /// Tensor name not present in any shard
    #[error("Tensor not found in checkpoint: {name}")]
    TensorNotFound { name: String },

    /// Unrecognized export dtype string
    #[error("Unknown export dtype '{value}' (expected float32, float16, int8, or int4)")]
    UnknownDtype { value: String },

    /// Container layout violation found while writing or reading back
    #[error("Malformed FLM container: {message}")]
    Format { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConvertError {
    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DownloadFailed { .. })
    }

    /// Check if error is a security concern
    #[must_use]
    pub fn is_security_risk(&self) -> bool {
        matches!(self, Self::PickleWeights { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_failed_is_retryable() {
        let err = ConvertError::DownloadFailed {
            repo: "test/model".into(),
            message: "connection reset".into(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_model_not_found_not_retryable() {
        let err = ConvertError::ModelNotFound {
            repo: "test/model".into(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_pickle_is_security_risk() {
        let err = ConvertError::PickleWeights {
            file: "pytorch_model.bin".into(),
        };
        assert!(err.is_security_risk());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("safetensors"));
    }

    #[test]
    fn test_invalid_repo_id_display() {
        let err = ConvertError::InvalidRepoId {
            repo_id: "invalid".into(),
        };
        assert!(err.to_string().contains("org/name"));
    }

    #[test]
    fn test_unknown_dtype_names_accepted_set() {
        let err = ConvertError::UnknownDtype {
            value: "int7".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("int7"));
        assert!(msg.contains("float32"));
        assert!(msg.contains("float16"));
        assert!(msg.contains("int8"));
        assert!(msg.contains("int4"));
    }

    #[test]
    fn test_all_error_variants_display() {
        // Ensure all variants have proper Display
        let errors: Vec<ConvertError> = vec![
            ConvertError::InvalidRepoId {
                repo_id: "r".into(),
            },
            ConvertError::ModelNotFound { repo: "r".into() },
            ConvertError::FileNotFound {
                repo: "r".into(),
                file: "f".into(),
            },
            ConvertError::DownloadFailed {
                repo: "r".into(),
                message: "m".into(),
            },
            ConvertError::PickleWeights { file: "f".into() },
            ConvertError::ConfigParse {
                message: "m".into(),
            },
            ConvertError::TokenizerParse {
                path: PathBuf::from("p"),
                message: "m".into(),
            },
            ConvertError::ShardParse {
                path: PathBuf::from("p"),
                message: "m".into(),
            },
            ConvertError::UnsupportedTensorDtype {
                tensor: "t".into(),
                dtype: "I64".into(),
            },
            ConvertError::DuplicateTensor { name: "n".into() },
            ConvertError::TensorNotFound { name: "n".into() },
            ConvertError::UnknownDtype { value: "v".into() },
            ConvertError::Format {
                message: "m".into(),
            },
        ];

        for err in errors {
            let msg = err.to_string();
            assert!(
                !msg.is_empty(),
                "Error display should not be empty: {:?}",
                err
            );
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ConvertError = io_err.into();
        assert!(matches!(err, ConvertError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ConvertError = json_err.into();
        assert!(matches!(err, ConvertError::Json(_)));
    }
}
