//! FLM container serialization.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! magic        [u8;4] = "FLMC"
//! version      u32    = 1
//! meta_count   u32
//! vocab_count  u32
//! tensor_count u32
//! meta entry:   string key + string value      (string = u32 len + UTF-8)
//! vocab entry:  u32 byte_len + bytes + u32 id + f32 score
//! tensor entry: string name + u32 n_dims + n_dims × u32 dims
//!               + u32 dtype tag + payload
//! ```
//!
//! Quantized payloads carry a `u32` row count up front so a reader can check
//! it against the declared dims; see [`crate::flm::quant`] for the row layout.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{ConvertError, Result};
use crate::vocab::VocabEntry;

use super::dtype::Dtype;
use super::quant::{quantize_q4_rows, quantize_q8_rows, row_split};
use super::{FLM_MAGIC, FLM_VERSION};

/// Streaming container writer.
///
/// Section counts are declared once in the header; `finish` refuses to
/// produce a container whose sections disagree with it.
pub struct FlmWriter<W: Write> {
    out: W,
    declared: Option<[u32; 3]>,
    written: [u32; 3],
    bytes: u64,
}

impl FlmWriter<BufWriter<File>> {
    /// Create the container file, creating missing parent directories.
    ///
    /// An existing file at `path` is overwritten.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> FlmWriter<W> {
    /// Wrap an arbitrary sink
    pub fn new(out: W) -> Self {
        Self {
            out,
            declared: None,
            written: [0; 3],
            bytes: 0,
        }
    }

    /// Write magic, version, and the declared section counts
    pub fn write_header(
        &mut self,
        meta_count: u32,
        vocab_count: u32,
        tensor_count: u32,
    ) -> Result<()> {
        self.put(&FLM_MAGIC)?;
        self.put_u32(FLM_VERSION)?;
        self.put_u32(meta_count)?;
        self.put_u32(vocab_count)?;
        self.put_u32(tensor_count)?;
        self.declared = Some([meta_count, vocab_count, tensor_count]);
        Ok(())
    }

    /// Append key/value pairs to the metadata section
    pub fn write_metadata(&mut self, pairs: &[(String, String)]) -> Result<()> {
        self.check_header()?;
        for (key, value) in pairs {
            self.put_str(key)?;
            self.put_str(value)?;
        }
        self.written[0] += pairs.len() as u32;
        Ok(())
    }

    /// Append entries to the vocabulary section
    pub fn write_vocab(&mut self, entries: &[VocabEntry]) -> Result<()> {
        self.check_header()?;
        for entry in entries {
            self.put_u32(entry.token.len() as u32)?;
            self.put(&entry.token)?;
            self.put_u32(entry.id)?;
            self.put_f32(entry.score)?;
        }
        self.written[1] += entries.len() as u32;
        Ok(())
    }

    /// Append one tensor record, converting `values` to the given encoding
    pub fn write_tensor(
        &mut self,
        name: &str,
        shape: &[usize],
        values: &[f32],
        dtype: Dtype,
    ) -> Result<()> {
        self.check_header()?;
        debug_assert_eq!(values.len(), shape.iter().product::<usize>());

        self.put_str(name)?;
        self.put_u32(shape.len() as u32)?;
        for &dim in shape {
            self.put_u32(dim as u32)?;
        }
        self.put_u32(dtype.tag())?;

        match dtype {
            Dtype::F32 => self.put(bytemuck::cast_slice(values))?,
            Dtype::F16 => {
                let mut buf = Vec::with_capacity(values.len() * 2);
                for &v in values {
                    buf.extend_from_slice(&half::f16::from_f32(v).to_le_bytes());
                }
                self.put(&buf)?;
            }
            Dtype::Q8 => {
                let (rows, cols) = row_split(shape);
                let q = quantize_q8_rows(values, rows, cols);
                self.put_u32(rows as u32)?;
                self.put(bytemuck::cast_slice(&q.scales))?;
                self.put(bytemuck::cast_slice(&q.data))?;
            }
            Dtype::Q4 => {
                let (rows, cols) = row_split(shape);
                let q = quantize_q4_rows(values, rows, cols);
                self.put_u32(rows as u32)?;
                for row in 0..rows {
                    self.put_f32(q.mins[row])?;
                    self.put_f32(q.scales[row])?;
                }
                self.put(&q.data)?;
            }
        }

        self.written[2] += 1;
        Ok(())
    }

    /// Flush and return total bytes written.
    ///
    /// Fails if the section counts disagree with the header.
    pub fn finish(mut self) -> Result<u64> {
        match self.declared {
            Some(declared) if declared == self.written => {}
            Some(declared) => {
                return Err(ConvertError::Format {
                    message: format!(
                        "section counts disagree with header: declared {declared:?}, \
                         wrote {:?} (meta, vocab, tensors)",
                        self.written
                    ),
                });
            }
            None => return Err(missing_header()),
        }
        self.out.flush()?;
        Ok(self.bytes)
    }

    fn check_header(&self) -> Result<()> {
        if self.declared.is_none() {
            return Err(missing_header());
        }
        Ok(())
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        self.bytes += bytes.len() as u64;
        Ok(())
    }

    fn put_u32(&mut self, v: u32) -> Result<()> {
        self.put(&v.to_le_bytes())
    }

    fn put_f32(&mut self, v: f32) -> Result<()> {
        self.put(&v.to_le_bytes())
    }

    fn put_str(&mut self, s: &str) -> Result<()> {
        self.put_u32(s.len() as u32)?;
        self.put(s.as_bytes())
    }
}

fn missing_header() -> ConvertError {
    ConvertError::Format {
        message: "header must be written before any section".to_string(),
    }
}
