//! Type definitions for checkpoint fetching.

use std::path::PathBuf;

/// Weight file format detected from a filename
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightFormat {
    /// SafeTensors format (recommended, secure)
    SafeTensors,
    /// PyTorch pickle format (SECURITY RISK, never parsed)
    PyTorchPickle,
}

impl WeightFormat {
    /// Detect format from filename
    #[must_use]
    pub fn from_filename(filename: &str) -> Option<Self> {
        if filename.ends_with(".safetensors") {
            Some(Self::SafeTensors)
        } else if filename.ends_with(".bin")
            || filename.ends_with(".pt")
            || filename.ends_with(".pth")
        {
            Some(Self::PyTorchPickle)
        } else {
            None
        }
    }

    /// Check if format is safe (no arbitrary code execution)
    #[must_use]
    pub fn is_safe(self) -> bool {
        matches!(self, Self::SafeTensors)
    }
}

/// One downloaded (or locally found) weight shard
#[derive(Debug, Clone)]
pub struct WeightShard {
    /// Local path of the shard
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Hex-encoded SHA-256 of the file contents
    pub sha256: String,
}

/// Local paths of everything the converter needs for one checkpoint
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    /// Path of `config.json`
    pub config: PathBuf,
    /// Path of `tokenizer.json`
    pub tokenizer: PathBuf,
    /// Weight shards in deterministic (sorted filename) order
    pub weights: Vec<WeightShard>,
}

impl ModelArtifact {
    /// Total weight bytes across all shards
    #[must_use]
    pub fn weight_bytes(&self) -> u64 {
        self.weights.iter().map(|w| w.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safetensors_detected_and_safe() {
        let format = WeightFormat::from_filename("model.safetensors").unwrap();
        assert_eq!(format, WeightFormat::SafeTensors);
        assert!(format.is_safe());
    }

    #[test]
    fn test_sharded_safetensors_detected() {
        let format = WeightFormat::from_filename("model-00001-of-00002.safetensors").unwrap();
        assert_eq!(format, WeightFormat::SafeTensors);
    }

    #[test]
    fn test_pickle_variants_detected_and_unsafe() {
        for name in ["pytorch_model.bin", "model.pt", "weights.pth"] {
            let format = WeightFormat::from_filename(name).unwrap();
            assert_eq!(format, WeightFormat::PyTorchPickle);
            assert!(!format.is_safe());
        }
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(WeightFormat::from_filename("config.json"), None);
        assert_eq!(WeightFormat::from_filename("model.gguf"), None);
    }

    #[test]
    fn test_artifact_weight_bytes() {
        let artifact = ModelArtifact {
            config: PathBuf::from("config.json"),
            tokenizer: PathBuf::from("tokenizer.json"),
            weights: vec![
                WeightShard {
                    path: PathBuf::from("a.safetensors"),
                    size: 100,
                    sha256: String::new(),
                },
                WeightShard {
                    path: PathBuf::from("b.safetensors"),
                    size: 250,
                    sha256: String::new(),
                },
            ],
        };
        assert_eq!(artifact.weight_bytes(), 350);
    }
}
