//! Precision tags: target precision on the CLI, tensor encodings on disk.

use std::fmt;
use std::str::FromStr;

use crate::error::ConvertError;

/// On-disk tensor encoding, stored as a u32 tag in each tensor record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Dtype {
    /// 32-bit float, little-endian
    F32 = 0,
    /// 16-bit IEEE float, little-endian
    F16 = 1,
    /// 8-bit symmetric per-row quantization
    Q8 = 2,
    /// 4-bit affine per-row quantization, two codes per byte
    Q4 = 3,
}

impl Dtype {
    /// Wire tag for this encoding
    #[must_use]
    pub fn tag(self) -> u32 {
        self as u32
    }

    /// Decode a wire tag
    #[must_use]
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(Self::F32),
            1 => Some(Self::F16),
            2 => Some(Self::Q8),
            3 => Some(Self::Q4),
            _ => None,
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::F32 => "F32",
            Self::F16 => "F16",
            Self::Q8 => "Q8",
            Self::Q4 => "Q4",
        };
        write!(f, "{name}")
    }
}

/// Target precision selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportDtype {
    /// Keep weights as 32-bit floats
    Float32,
    /// Convert weights to 16-bit floats
    #[default]
    Float16,
    /// Quantize weight matrices to 8 bits per element
    Int8,
    /// Quantize weight matrices to 4 bits per element
    Int4,
}

impl ExportDtype {
    /// Canonical spelling accepted on the command line
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Float32 => "float32",
            Self::Float16 => "float16",
            Self::Int8 => "int8",
            Self::Int4 => "int4",
        }
    }

    /// Container encoding for a quantization-eligible weight matrix
    #[must_use]
    pub fn tensor_dtype(self) -> Dtype {
        match self {
            Self::Float32 => Dtype::F32,
            Self::Float16 => Dtype::F16,
            Self::Int8 => Dtype::Q8,
            Self::Int4 => Dtype::Q4,
        }
    }

    /// Container encoding for tensors exempt from quantization
    #[must_use]
    pub fn exempt_dtype(self) -> Dtype {
        match self {
            Self::Float16 => Dtype::F16,
            _ => Dtype::F32,
        }
    }
}

impl FromStr for ExportDtype {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "float32" => Ok(Self::Float32),
            "float16" => Ok(Self::Float16),
            "int8" => Ok(Self::Int8),
            "int4" => Ok(Self::Int4),
            _ => Err(ConvertError::UnknownDtype {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ExportDtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pick the container encoding for one tensor under a target precision.
///
/// Vectors (1-dim tensors such as norm weights and biases) and embedding
/// tables keep full precision even under integer targets; quantizing them
/// costs accuracy out of proportion to the bytes saved.
#[must_use]
pub fn tensor_encoding(target: ExportDtype, shape: &[usize], is_embedding: bool) -> Dtype {
    if shape.len() < 2 || is_embedding {
        target.exempt_dtype()
    } else {
        target.tensor_dtype()
    }
}
