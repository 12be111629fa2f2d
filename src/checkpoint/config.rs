//! Model `config.json` parsing.
//!
//! The typed fields cover the llama-family keys the converter reports on;
//! everything else is preserved untyped so the container metadata section
//! carries the complete configuration.

use std::path::Path;

use serde::Deserialize;

use crate::error::{ConvertError, Result};

/// Parsed model configuration with unrecognized fields preserved
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Architecture family, e.g. "llama"
    #[serde(default)]
    pub model_type: Option<String>,
    /// Model class names, e.g. ["DeciCoderForCausalLM"]
    #[serde(default)]
    pub architectures: Option<Vec<String>>,
    /// Source checkpoint precision
    #[serde(default)]
    pub torch_dtype: Option<String>,
    #[serde(default)]
    pub vocab_size: Option<u64>,
    #[serde(default)]
    pub hidden_size: Option<u64>,
    #[serde(default)]
    pub intermediate_size: Option<u64>,
    #[serde(default)]
    pub num_hidden_layers: Option<u64>,
    #[serde(default)]
    pub num_attention_heads: Option<u64>,
    /// Grouped-query attention KV head count
    #[serde(default)]
    pub num_key_value_heads: Option<u64>,
    #[serde(default)]
    pub max_position_embeddings: Option<u64>,
    #[serde(default)]
    pub rms_norm_eps: Option<f64>,
    #[serde(default)]
    pub rope_theta: Option<f64>,
    /// Everything else, including bos/eos ids (which some configs store as
    /// lists)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ModelConfig {
    /// Read and parse a `config.json`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse a configuration from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ConvertError::ConfigParse {
            message: e.to_string(),
        })
    }

    /// Flatten the configuration to ordered key/value string pairs.
    ///
    /// Typed fields come first in declaration order, then the preserved
    /// fields sorted by key. String values are stored raw; everything else
    /// as compact JSON.
    #[must_use]
    pub fn metadata_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(12 + self.extra.len());

        if let Some(v) = &self.model_type {
            pairs.push(("model_type".to_string(), v.clone()));
        }
        if let Some(v) = &self.architectures {
            let value = serde_json::Value::from(v.clone()).to_string();
            pairs.push(("architectures".to_string(), value));
        }
        if let Some(v) = &self.torch_dtype {
            pairs.push(("torch_dtype".to_string(), v.clone()));
        }
        push_number(&mut pairs, "vocab_size", self.vocab_size);
        push_number(&mut pairs, "hidden_size", self.hidden_size);
        push_number(&mut pairs, "intermediate_size", self.intermediate_size);
        push_number(&mut pairs, "num_hidden_layers", self.num_hidden_layers);
        push_number(&mut pairs, "num_attention_heads", self.num_attention_heads);
        push_number(&mut pairs, "num_key_value_heads", self.num_key_value_heads);
        push_number(
            &mut pairs,
            "max_position_embeddings",
            self.max_position_embeddings,
        );
        push_float(&mut pairs, "rms_norm_eps", self.rms_norm_eps);
        push_float(&mut pairs, "rope_theta", self.rope_theta);

        // serde_json's map keeps keys sorted, so this order is stable
        for (key, value) in &self.extra {
            pairs.push((key.clone(), scalar_string(value)));
        }
        pairs
    }
}

fn push_number(pairs: &mut Vec<(String, String)>, key: &str, value: Option<u64>) {
    if let Some(v) = value {
        pairs.push((key.to_string(), v.to_string()));
    }
}

fn push_float(pairs: &mut Vec<(String, String)>, key: &str, value: Option<f64>) {
    if let Some(v) = value {
        pairs.push((key.to_string(), v.to_string()));
    }
}

/// Strings stay raw, everything else becomes compact JSON
fn scalar_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
