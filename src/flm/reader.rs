//! FLM container verification.
//!
//! Parses a written container back into a structural summary, validating the
//! header, section counts, per-record layout, and payload sizes. Tensor
//! payload bytes are skipped, not decoded; the summary is for verification
//! and inspection, not inference.

use std::path::Path;

use crate::error::{ConvertError, Result};
use crate::vocab::VocabEntry;

use super::dtype::Dtype;
use super::quant::row_split;
use super::{FLM_MAGIC, FLM_VERSION};

/// Structural summary of a parsed container
#[derive(Debug, Clone)]
pub struct FlmSummary {
    /// Container format version
    pub version: u32,
    /// Metadata key/value pairs in file order
    pub metadata: Vec<(String, String)>,
    /// Vocabulary entries in file order
    pub vocab: Vec<VocabEntry>,
    /// Tensor records in file order
    pub tensors: Vec<TensorRecord>,
    /// Total file size in bytes
    pub file_size: usize,
}

/// Name, shape, and encoding of one stored tensor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorRecord {
    /// Tensor name
    pub name: String,
    /// Shape dimensions
    pub shape: Vec<usize>,
    /// Stored encoding
    pub dtype: Dtype,
}

impl TensorRecord {
    /// Element count
    #[must_use]
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }
}

impl FlmSummary {
    /// Read and parse a container file
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::parse(&data)
    }

    /// Parse a container from memory
    pub fn parse(data: &[u8]) -> Result<Self> {
        let (version, meta_count, vocab_count, tensor_count) = parse_header(data)?;
        let mut pos = 20;

        let mut metadata = Vec::with_capacity(meta_count as usize);
        for _ in 0..meta_count {
            let (key, next) = read_string(data, pos)?;
            let (value, next) = read_string(data, next)?;
            metadata.push((key, value));
            pos = next;
        }

        let mut vocab = Vec::with_capacity(vocab_count as usize);
        for _ in 0..vocab_count {
            let (entry, next) = read_vocab_entry(data, pos)?;
            vocab.push(entry);
            pos = next;
        }

        let mut tensors = Vec::with_capacity(tensor_count as usize);
        for _ in 0..tensor_count {
            let (record, next) = read_tensor_record(data, pos)?;
            tensors.push(record);
            pos = next;
        }

        if pos != data.len() {
            return Err(format_error(
                pos,
                format!("{} trailing bytes after last section", data.len() - pos),
            ));
        }

        Ok(Self {
            version,
            metadata,
            vocab,
            tensors,
            file_size: data.len(),
        })
    }
}

/// Parse and validate the 20-byte header, returning version and section counts
fn parse_header(data: &[u8]) -> Result<(u32, u32, u32, u32)> {
    if data.len() < 20 {
        return Err(format_error(0, "file too small: less than 20 bytes".into()));
    }
    if data[0..4] != FLM_MAGIC {
        return Err(format_error(
            0,
            format!(
                "invalid magic: expected 'FLMC', got '{}'",
                String::from_utf8_lossy(&data[0..4])
            ),
        ));
    }
    let version = u32::from_le_bytes(data[4..8].try_into().unwrap());
    if version != FLM_VERSION {
        return Err(format_error(
            4,
            format!("unsupported version {version} (expected {FLM_VERSION})"),
        ));
    }
    let meta_count = u32::from_le_bytes(data[8..12].try_into().unwrap());
    let vocab_count = u32::from_le_bytes(data[12..16].try_into().unwrap());
    let tensor_count = u32::from_le_bytes(data[16..20].try_into().unwrap());
    Ok((version, meta_count, vocab_count, tensor_count))
}

fn read_u32(data: &[u8], pos: usize) -> Result<(u32, usize)> {
    if pos + 4 > data.len() {
        return Err(truncation_error(pos));
    }
    let v = u32::from_le_bytes(data[pos..pos + 4].try_into().unwrap());
    Ok((v, pos + 4))
}

fn read_f32(data: &[u8], pos: usize) -> Result<(f32, usize)> {
    if pos + 4 > data.len() {
        return Err(truncation_error(pos));
    }
    let v = f32::from_le_bytes(data[pos..pos + 4].try_into().unwrap());
    Ok((v, pos + 4))
}

fn read_bytes<'d>(data: &'d [u8], pos: usize, len: usize) -> Result<(&'d [u8], usize)> {
    let end = pos.checked_add(len).ok_or_else(|| truncation_error(pos))?;
    if end > data.len() {
        return Err(truncation_error(pos));
    }
    Ok((&data[pos..end], end))
}

fn read_string(data: &[u8], pos: usize) -> Result<(String, usize)> {
    let (len, pos) = read_u32(data, pos)?;
    let (bytes, pos) = read_bytes(data, pos, len as usize)?;
    Ok((String::from_utf8_lossy(bytes).into_owned(), pos))
}

fn read_vocab_entry(data: &[u8], pos: usize) -> Result<(VocabEntry, usize)> {
    let (len, pos) = read_u32(data, pos)?;
    let (bytes, pos) = read_bytes(data, pos, len as usize)?;
    let token = bytes.to_vec();
    let (id, pos) = read_u32(data, pos)?;
    let (score, pos) = read_f32(data, pos)?;
    Ok((VocabEntry { token, id, score }, pos))
}

fn read_tensor_record(data: &[u8], pos: usize) -> Result<(TensorRecord, usize)> {
    let (name, pos) = read_string(data, pos)?;
    let (n_dims, mut pos) = read_u32(data, pos)?;

    let mut shape = Vec::with_capacity(n_dims as usize);
    for _ in 0..n_dims {
        let (dim, next) = read_u32(data, pos)?;
        shape.push(dim as usize);
        pos = next;
    }

    let (tag, pos) = read_u32(data, pos)?;
    let dtype = Dtype::from_tag(tag)
        .ok_or_else(|| format_error(pos - 4, format!("unknown dtype tag {tag} for '{name}'")))?;

    let pos = skip_payload(data, pos, &name, &shape, dtype)?;
    Ok((TensorRecord { name, shape, dtype }, pos))
}

/// Skip a tensor payload, validating its size against the declared shape
fn skip_payload(
    data: &[u8],
    pos: usize,
    name: &str,
    shape: &[usize],
    dtype: Dtype,
) -> Result<usize> {
    let numel = checked_numel(name, shape, pos)?;
    match dtype {
        Dtype::F32 => skip_exact(data, pos, numel, 4),
        Dtype::F16 => skip_exact(data, pos, numel, 2),
        Dtype::Q8 => {
            let (rows, cols, pos) = read_row_header(data, pos, name, shape)?;
            let pos = skip_exact(data, pos, rows, 4)?;
            skip_exact(data, pos, rows * cols, 1)
        }
        Dtype::Q4 => {
            let (rows, cols, pos) = read_row_header(data, pos, name, shape)?;
            let pos = skip_exact(data, pos, rows, 8)?;
            skip_exact(data, pos, rows * cols.div_ceil(2), 1)
        }
    }
}

/// Read a quantized payload's row count and check it against the shape
fn read_row_header(
    data: &[u8],
    pos: usize,
    name: &str,
    shape: &[usize],
) -> Result<(usize, usize, usize)> {
    let (stored, next) = read_u32(data, pos)?;
    let (rows, cols) = row_split(shape);
    if stored as usize != rows {
        return Err(format_error(
            pos,
            format!("'{name}' declares {stored} quantized rows, shape implies {rows}"),
        ));
    }
    Ok((rows, cols, next))
}

fn skip_exact(data: &[u8], pos: usize, count: usize, elem_size: usize) -> Result<usize> {
    let len = count
        .checked_mul(elem_size)
        .ok_or_else(|| truncation_error(pos))?;
    let (_, next) = read_bytes(data, pos, len)?;
    Ok(next)
}

fn checked_numel(name: &str, shape: &[usize], pos: usize) -> Result<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| format_error(pos, format!("shape of '{name}' overflows usize")))
}

fn format_error(pos: usize, message: String) -> ConvertError {
    ConvertError::Format {
        message: format!("{message} (at byte offset {pos})"),
    }
}

fn truncation_error(pos: usize) -> ConvertError {
    ConvertError::Format {
        message: format!("file truncated at byte offset {pos}"),
    }
}
