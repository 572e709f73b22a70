//! Bridges [`CandleEmbeddingModel`] into `reelforge_core::collaborators::Embedder`.
//!
//! Candle inference is synchronous and CPU (or GPU) bound; every call is pushed onto
//! `tokio::task::spawn_blocking` so it doesn't stall the async runtime the engine drives.

use std::sync::Arc;

use async_trait::async_trait;
use reelforge_core::collaborators::Embedder;
use reelforge_core::errors::CoreError;

use crate::config::EmbeddingConfig;
use crate::embedding::CandleEmbeddingModel;
use crate::EmbeddingModel;

/// `Embedder` backed by a locally loaded Candle model.
pub struct CandleEmbedder {
    model: Arc<CandleEmbeddingModel>,
    model_id: String,
    dimension: usize,
}

impl CandleEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, crate::error::ModelError> {
        let model = CandleEmbeddingModel::new(config)?;
        let model_id = model.model_id().to_string();
        let dimension = model.dimension();
        Ok(Self {
            model: Arc::new(model),
            model_id,
            dimension,
        })
    }
}

fn to_core_error(model_id: &str, err: crate::error::ModelError) -> CoreError {
    CoreError::CollaboratorUnavailable {
        collaborator: "Embedder".to_string(),
        reason: format!("{model_id}: {err}"),
    }
}

#[async_trait]
impl Embedder for CandleEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, CoreError> {
        let model = self.model.clone();
        let text = text.to_string();
        let model_id = self.model_id.clone();
        tokio::task::spawn_blocking(move || model.embed(&[text.as_str()]))
            .await
            .map_err(|e| CoreError::Internal(format!("embedding task panicked: {e}")))?
            .map_err(|e| to_core_error(&model_id, e))?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::Internal("embedder returned no vectors".to_string()))
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CoreError> {
        let model = self.model.clone();
        let owned = texts.to_vec();
        let model_id = self.model_id.clone();
        tokio::task::spawn_blocking(move || {
            let refs: Vec<&str> = owned.iter().map(|s| s.as_str()).collect();
            model.embed(&refs)
        })
        .await
        .map_err(|e| CoreError::Internal(format!("embedding task panicked: {e}")))?
        .map_err(|e| to_core_error(&model_id, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_core_error_names_the_embedder_collaborator() {
        let err = to_core_error("sentence-transformers/all-MiniLM-L6-v2", crate::error::ModelError::tokenization("boom"));
        match err {
            CoreError::CollaboratorUnavailable { collaborator, reason } => {
                assert_eq!(collaborator, "Embedder");
                assert!(reason.contains("boom"));
            }
            other => panic!("expected CollaboratorUnavailable, got {other:?}"),
        }
    }
}
