//! FLM single-file model container
//!
//! A `.flm` file packs model metadata, the tokenizer vocabulary, and every
//! weight tensor into one stream: a fixed header with section counts,
//! followed by the metadata, vocabulary, and tensor sections. See
//! [`FlmWriter`] for the byte layout and [`quant`] for the integer encodings.
//!
//! # Example
//!
//! ```ignore
//! use hf2flm::flm::{Dtype, FlmSummary, FlmWriter};
//!
//! let mut writer = FlmWriter::create("model.flm")?;
//! writer.write_header(0, 0, 1)?;
//! writer.write_tensor("w", &[2, 2], &[1.0, 2.0, 3.0, 4.0], Dtype::F16)?;
//! writer.finish()?;
//! let summary = FlmSummary::read("model.flm")?;
//! ```

mod dtype;
pub mod quant;
mod reader;
mod writer;

pub use dtype::{tensor_encoding, Dtype, ExportDtype};
pub use reader::{FlmSummary, TensorRecord};
pub use writer::FlmWriter;

/// Magic bytes opening every container
pub const FLM_MAGIC: [u8; 4] = *b"FLMC";

/// Container layout version written and accepted by this crate
pub const FLM_VERSION: u32 = 1;
