//! hf2flm - HuggingFace checkpoint to FLM container converter.
//!
//! Converts a causal-LM checkpoint (config, tokenizer, and safetensors
//! weights) into a single `.flm` file that bundles everything an inference
//! runtime needs:
//! - Model hyperparameters as string metadata
//! - The byte-level vocabulary with token ids and scores
//! - Every weight tensor, stored as F32, F16, or per-row quantized Q8/Q4
//!
//! Checkpoints come from the HuggingFace Hub (`org/name` repository ids)
//! or from a local directory holding the same files. Pickle-format weights
//! are never read.
//!
//! # Example
//!
//! ```no_run
//! use hf2flm::{Converter, ConvertRequest, ExportDtype};
//! use hf2flm::cli::LogLevel;
//!
//! let request = ConvertRequest {
//!     model: "Deci/DeciCoder-1b".to_string(),
//!     revision: "main".to_string(),
//!     dtype: ExportDtype::Int8,
//!     export_path: "decicoder-int8.flm".into(),
//!     cache_dir: None,
//!     token: None,
//! };
//! let report = Converter::new(request).run(LogLevel::Normal)?;
//! println!("{} ({})", report.export_path.display(), report.size_human());
//! # Ok::<(), hf2flm::ConvertError>(())
//! ```

pub mod checkpoint;
pub mod cli;
pub mod convert;
pub mod error;
pub mod flm;
pub mod hub;
pub mod vocab;

pub use convert::{ConversionReport, Converter, ConvertRequest};
pub use error::{ConvertError, Result};
pub use flm::{ExportDtype, FlmSummary};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dtype_is_float16() {
        assert_eq!(ExportDtype::default(), ExportDtype::Float16);
    }

    #[test]
    fn test_error_is_exported_with_display() {
        let err = ConvertError::UnknownDtype {
            value: "fp8".to_string(),
        };
        assert!(err.to_string().contains("fp8"));
    }
}
