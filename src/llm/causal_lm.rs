use crate::llm::hub::ModelFiles;
use crate::llm::kind::Architecture;
use crate::utils::error::{McqError, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::{gemma2, llama, mistral};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum WeightDtype {
    F16,
    Bf16,
    F32,
}

impl WeightDtype {
    pub fn as_dtype(&self) -> DType {
        match self {
            WeightDtype::F16 => DType::F16,
            WeightDtype::Bf16 => DType::BF16,
            WeightDtype::F32 => DType::F32,
        }
    }
}

impl FromStr for WeightDtype {
    type Err = McqError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "f16" => Ok(WeightDtype::F16),
            "bf16" => Ok(WeightDtype::Bf16),
            "f32" => Ok(WeightDtype::F32),
            other => Err(McqError::InvalidConfigValueError {
                field: "dtype".to_string(),
                value: other.to_string(),
                reason: "Supported dtypes: f16, bf16, f32".to_string(),
            }),
        }
    }
}

/// Where and how the weights are materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOptions {
    pub revision: String,
    pub cpu: bool,
    pub dtype: Option<WeightDtype>,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            revision: "main".to_string(),
            cpu: false,
            dtype: None,
        }
    }
}

impl ModelOptions {
    pub fn device(&self) -> Result<Device> {
        if self.cpu {
            Ok(Device::Cpu)
        } else {
            Ok(Device::cuda_if_available(0)?)
        }
    }

    /// 未指定時：GPU 用 bf16，CPU 用 f32
    pub fn dtype_for(&self, device: &Device) -> DType {
        match self.dtype {
            Some(dtype) => dtype.as_dtype(),
            None if device.is_cuda() => DType::BF16,
            None => DType::F32,
        }
    }
}

enum Backbone {
    Gemma2(gemma2::Model),
    Llama {
        model: llama::Llama,
        config: llama::Config,
        cache: llama::Cache,
    },
    Mistral(mistral::Model),
}

/// A loaded decoder-only model with its per-sequence KV state.
pub struct CausalLm {
    backbone: Backbone,
    dtype: DType,
    device: Device,
}

impl CausalLm {
    pub fn load(arch: Architecture, files: &ModelFiles, dtype: DType, device: &Device) -> Result<Self> {
        let config_bytes = std::fs::read(&files.config)?;
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&files.weights, dtype, device)? };

        let backbone = match arch {
            Architecture::Gemma2 => {
                let config: gemma2::Config = serde_json::from_slice(&config_bytes)?;
                Backbone::Gemma2(gemma2::Model::new(false, &config, vb)?)
            }
            Architecture::Llama => {
                let config: llama::LlamaConfig = serde_json::from_slice(&config_bytes)?;
                let config = config.into_config(false);
                let cache = llama::Cache::new(true, dtype, &config, device)?;
                let model = llama::Llama::load(vb, &config)?;
                Backbone::Llama {
                    model,
                    config,
                    cache,
                }
            }
            Architecture::Mistral => {
                let config: mistral::Config = serde_json::from_slice(&config_bytes)?;
                Backbone::Mistral(mistral::Model::new(&config, vb)?)
            }
        };

        Ok(Self {
            backbone,
            dtype,
            device: device.clone(),
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Drops the KV cache so the next forward starts a fresh sequence.
    pub fn reset(&mut self) -> Result<()> {
        match &mut self.backbone {
            Backbone::Gemma2(model) => model.clear_kv_cache(),
            Backbone::Llama { config, cache, .. } => {
                *cache = llama::Cache::new(true, self.dtype, config, &self.device)?;
            }
            Backbone::Mistral(model) => model.clear_kv_cache(),
        }
        Ok(())
    }

    /// Runs one decoding step and returns the next-token logits as a 1-D f32 tensor.
    pub fn forward(&mut self, input: &Tensor, seqlen_offset: usize) -> Result<Tensor> {
        let logits = match &mut self.backbone {
            Backbone::Gemma2(model) => model.forward(input, seqlen_offset)?.squeeze(0)?.squeeze(0)?,
            Backbone::Llama { model, cache, .. } => {
                model.forward(input, seqlen_offset, cache)?.squeeze(0)?
            }
            Backbone::Mistral(model) => model.forward(input, seqlen_offset)?.squeeze(0)?.squeeze(0)?,
        };
        Ok(logits.to_dtype(DType::F32)?)
    }
}
