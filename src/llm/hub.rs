use crate::utils::error::{McqError, Result};
use hf_hub::api::sync::{Api, ApiRepo};
use hf_hub::{Repo, RepoType};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

const SAFETENSORS_INDEX: &str = "model.safetensors.index.json";
const SINGLE_SAFETENSORS: &str = "model.safetensors";

/// Local paths of everything needed to build a model, resolved through the hub cache.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub tokenizer: PathBuf,
    pub config: PathBuf,
    pub weights: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct SafetensorsIndex {
    weight_map: std::collections::HashMap<String, String>,
}

/// 下載（或從快取取得）模型檔案
pub fn fetch_model_files(repo_id: &str, revision: &str) -> Result<ModelFiles> {
    tracing::info!("📥 Resolving {} (revision {}) from the hub", repo_id, revision);
    let api = Api::new()?;
    let repo = api.repo(Repo::with_revision(
        repo_id.to_string(),
        RepoType::Model,
        revision.to_string(),
    ));

    let tokenizer = repo.get("tokenizer.json")?;
    let config = repo.get("config.json")?;
    let weights = fetch_weights(&repo)?;
    tracing::debug!("Resolved {} weight file(s) for {}", weights.len(), repo_id);

    Ok(ModelFiles {
        tokenizer,
        config,
        weights,
    })
}

fn fetch_weights(repo: &ApiRepo) -> Result<Vec<PathBuf>> {
    match repo.get(SAFETENSORS_INDEX) {
        Ok(index_path) => {
            let index = std::fs::read(index_path)?;
            shard_names(&index)?
                .iter()
                .map(|name| repo.get(name).map_err(McqError::from))
                .collect()
        }
        Err(e) => {
            // 小模型只有單一檔案
            tracing::debug!("No safetensors index ({}), trying {}", e, SINGLE_SAFETENSORS);
            Ok(vec![repo.get(SINGLE_SAFETENSORS)?])
        }
    }
}

/// Distinct shard file names referenced by a `model.safetensors.index.json`, sorted.
pub fn shard_names(index_json: &[u8]) -> Result<Vec<String>> {
    let index: SafetensorsIndex = serde_json::from_slice(index_json)?;
    let shards: BTreeSet<String> = index.weight_map.into_values().collect();
    if shards.is_empty() {
        return Err(McqError::ConfigError {
            message: format!("{} lists no weight files", SAFETENSORS_INDEX),
        });
    }
    Ok(shards.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_names_are_deduplicated_and_sorted() {
        let index = br#"{
            "metadata": {"total_size": 123},
            "weight_map": {
                "model.embed_tokens.weight": "model-00002-of-00002.safetensors",
                "model.layers.0.mlp.up_proj.weight": "model-00001-of-00002.safetensors",
                "lm_head.weight": "model-00002-of-00002.safetensors"
            }
        }"#;
        assert_eq!(
            shard_names(index).unwrap(),
            vec![
                "model-00001-of-00002.safetensors".to_string(),
                "model-00002-of-00002.safetensors".to_string()
            ]
        );
    }

    #[test]
    fn test_shard_names_rejects_empty_map() {
        let err = shard_names(br#"{"weight_map": {}}"#).unwrap_err();
        assert!(matches!(err, McqError::ConfigError { .. }));
    }

    #[test]
    fn test_shard_names_rejects_bad_json() {
        let err = shard_names(b"not json").unwrap_err();
        assert!(matches!(err, McqError::SerializationError(_)));
    }
}
