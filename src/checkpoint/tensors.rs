//! Safetensors weight loading.
//!
//! Holds the raw bytes of every shard and re-parses the zero-copy view on
//! each tensor access; the header walk is cheap next to the dtype widening,
//! and keeping plain `Vec<u8>` buffers sidesteps self-referential borrows.

use std::collections::BTreeMap;
use std::path::PathBuf;

use safetensors::SafeTensors;

use crate::error::{ConvertError, Result};
use crate::hub::ModelArtifact;

/// One tensor widened to f32
#[derive(Debug, Clone, PartialEq)]
pub struct TensorData {
    /// Shape dimensions
    pub shape: Vec<usize>,
    /// Row-major values
    pub data: Vec<f32>,
}

#[derive(Debug, Clone)]
struct TensorInfo {
    shard: usize,
    shape: Vec<usize>,
}

/// All weight shards of a checkpoint, indexed by tensor name
#[derive(Debug)]
pub struct WeightShards {
    shards: Vec<Vec<u8>>,
    paths: Vec<PathBuf>,
    index: BTreeMap<String, TensorInfo>,
}

impl WeightShards {
    /// Open every weight shard of a fetched checkpoint
    pub fn open(artifact: &ModelArtifact) -> Result<Self> {
        let paths: Vec<PathBuf> = artifact.weights.iter().map(|w| w.path.clone()).collect();
        Self::open_files(&paths)
    }

    /// Open safetensors files directly.
    ///
    /// Tensor names must be unique across all shards.
    pub fn open_files(paths: &[PathBuf]) -> Result<Self> {
        let mut shards = Vec::with_capacity(paths.len());
        let mut index = BTreeMap::new();

        for (shard_idx, path) in paths.iter().enumerate() {
            let bytes = std::fs::read(path)?;
            {
                let parsed = SafeTensors::deserialize(&bytes)
                    .map_err(|e| shard_error(path, &e))?;
                for (name, view) in parsed.tensors() {
                    let info = TensorInfo {
                        shard: shard_idx,
                        shape: view.shape().to_vec(),
                    };
                    if index.insert(name.clone(), info).is_some() {
                        return Err(ConvertError::DuplicateTensor { name });
                    }
                }
            }
            shards.push(bytes);
        }

        Ok(Self {
            shards,
            paths: paths.to_vec(),
            index,
        })
    }

    /// Tensor names in sorted order
    #[must_use]
    pub fn tensor_names(&self) -> Vec<&str> {
        self.index.keys().map(String::as_str).collect()
    }

    /// Shape of a named tensor
    #[must_use]
    pub fn shape(&self, name: &str) -> Option<&[usize]> {
        self.index.get(name).map(|info| info.shape.as_slice())
    }

    /// Load one tensor, widening its elements to f32
    pub fn tensor(&self, name: &str) -> Result<TensorData> {
        let info = self
            .index
            .get(name)
            .ok_or_else(|| ConvertError::TensorNotFound {
                name: name.to_string(),
            })?;
        let path = &self.paths[info.shard];
        let parsed = SafeTensors::deserialize(&self.shards[info.shard])
            .map_err(|e| shard_error(path, &e))?;
        let view = parsed.tensor(name).map_err(|e| shard_error(path, &e))?;
        let data = widen_to_f32(name, view.dtype(), view.data())?;
        Ok(TensorData {
            shape: info.shape.clone(),
            data,
        })
    }

    /// Number of tensors across all shards
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when the checkpoint holds no tensors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Total element count across all tensors
    #[must_use]
    pub fn param_count(&self) -> u64 {
        self.index
            .values()
            .map(|info| info.shape.iter().map(|&d| d as u64).product::<u64>())
            .sum()
    }
}

fn shard_error(path: &std::path::Path, err: &safetensors::SafeTensorError) -> ConvertError {
    ConvertError::ShardParse {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Decode raw little-endian tensor bytes to f32 values
fn widen_to_f32(name: &str, dtype: safetensors::Dtype, raw: &[u8]) -> Result<Vec<f32>> {
    use safetensors::Dtype;
    match dtype {
        Dtype::F32 => Ok(raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()),
        Dtype::F16 => Ok(raw
            .chunks_exact(2)
            .map(|b| half::f16::from_le_bytes([b[0], b[1]]).to_f32())
            .collect()),
        Dtype::BF16 => Ok(raw
            .chunks_exact(2)
            .map(|b| half::bf16::from_le_bytes([b[0], b[1]]).to_f32())
            .collect()),
        Dtype::F64 => Ok(raw
            .chunks_exact(8)
            .map(|b| {
                f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32
            })
            .collect()),
        other => Err(ConvertError::UnsupportedTensorDtype {
            tensor: name.to_string(),
            dtype: format!("{other:?}"),
        }),
    }
}
