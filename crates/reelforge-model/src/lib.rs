//! # reelforge-model
//!
//! ML inference layer for Reelforge - local text embeddings.
//!
//! This crate is the **single source of truth** for ML model inference in Reelforge.
//! It provides:
//!
//! - **Embedding models**: Bi-encoder models for generating text embeddings
//! - **Model locator**: Runtime path resolution for bundled models
//! - **Unified config**: Single source of truth for embedding configuration
//! - **Core adapter**: [`core_adapter::CandleEmbedder`], the `reelforge_core::collaborators::Embedder`
//!   implementation the engine is actually wired against
//!
//! ## Design Principles
//!
//! 1. **Production-only**: No mock implementations. Test doubles live in `reelforge-core::testing`.
//! 2. **Local-first**: Default is embedded Candle inference with disk-based models.
//! 3. **Provider-agnostic**: Traits don't leak Candle internals.
//! 4. **Models as disk assets**: Models are shipped with the release, not embedded in binary.
//!
//! ## Model Location
//!
//! Models are searched in this order:
//! 1. `$REELFORGE_MODELS_DIR` environment variable
//! 2. `~/.reelforge/models` user directory
//! 3. `{exe_dir}/models` next to the binary
//!
//! ## Features
//!
//! - `embedded` (default): Local Candle inference with disk-based models
//! - `ollama`: Remote inference via Ollama API (future)
//!
//! ## Usage
//!
//! ```ignore
//! use reelforge_model::{EmbeddingModel, create_embedding_model, EmbeddingConfig};
//!
//! let config = EmbeddingConfig::default();
//! let model = create_embedding_model(&config)?;
//!
//! let embeddings = model.embed(&["Hello, world!"])?;
//! assert_eq!(embeddings[0].len(), model.dimension());
//! ```

pub mod config;
pub mod error;
pub mod model_locator;

#[cfg(feature = "embedded")]
mod embedding;

#[cfg(feature = "embedded")]
pub mod core_adapter;

// Re-export error types
pub use error::{ModelError, ModelResult};

// Re-export config types (canonical source of truth)
pub use config::{
    DevicePreference, EmbeddingConfig, EmbeddingProviderKind, HuggingFaceModelConfig,
    ModelArchitecture, ModelInfo,
};

// Re-export model locator
pub use model_locator::{
    default_locator, ModelLocator, DEFAULT_EMBEDDING_MODEL_NAME, EMBEDDINGS_SUBDIR,
    REELFORGE_MODELS_DIR_ENV, REQUIRED_MODEL_FILES,
};

// Default model ID (full HuggingFace identifier)
pub const DEFAULT_EMBEDDING_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

// ============================================================================
// Embedding Model Trait
// ============================================================================

/// Trait for embedding models (bi-encoders).
///
/// Generates dense vector embeddings from text inputs. These embeddings
/// can be used for semantic search via cosine similarity.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across threads.
pub trait EmbeddingModel: Send + Sync + std::fmt::Debug {
    /// Generate embeddings for a batch of texts.
    ///
    /// # Arguments
    ///
    /// * `texts` - Slice of text strings to embed
    ///
    /// # Returns
    ///
    /// A vector of embeddings, one per input text.
    /// Each embedding is a normalized f32 vector of length `dimension()`.
    fn embed(&self, texts: &[&str]) -> ModelResult<Vec<Vec<f32>>>;

    /// Generate embeddings for owned strings.
    ///
    /// Convenience method that calls `embed` with string slices.
    fn embed_batch(&self, texts: &[String]) -> ModelResult<Vec<Vec<f32>>> {
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        self.embed(&refs)
    }

    /// Warm up the model by running a dummy inference.
    ///
    /// This pre-loads weights and triggers any JIT compilation.
    fn warm_up(&self) -> ModelResult<()> {
        let _ = self.embed(&["warmup"])?;
        Ok(())
    }

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Get the maximum sequence length supported.
    fn max_sequence_length(&self) -> usize;

    /// Get model information (ID, dimension, architecture).
    fn model_info(&self) -> &ModelInfo;

    /// Get the model ID.
    fn model_id(&self) -> &str {
        &self.model_info().model_id
    }
}

// ============================================================================
// Factory Functions
// ============================================================================

/// Create an embedding model from configuration.
///
/// # Features
///
/// - With `embedded` feature: Creates `CandleEmbeddingModel`
///
/// # Note
///
/// Ollama provider is reserved for future use but not yet implemented.
///
/// # Errors
///
/// Returns `ModelError` if model loading fails.
#[cfg(feature = "embedded")]
pub fn create_embedding_model(config: &EmbeddingConfig) -> ModelResult<Box<dyn EmbeddingModel>> {
    match config.provider {
        EmbeddingProviderKind::Candle => {
            let model = embedding::CandleEmbeddingModel::new(config)?;
            Ok(Box::new(model))
        }
        EmbeddingProviderKind::Ollama => Err(ModelError::ProviderNotAvailable {
            provider: "ollama".to_string(),
            reason: "Ollama provider is planned for a future release. Use 'candle' for now."
                .to_string(),
        }),
    }
}

#[cfg(not(feature = "embedded"))]
pub fn create_embedding_model(config: &EmbeddingConfig) -> ModelResult<Box<dyn EmbeddingModel>> {
    Err(ModelError::ProviderNotAvailable {
        provider: config.provider.to_string(),
        reason: "No embedding providers available. Enable 'embedded' or 'ollama' feature."
            .to_string(),
    })
}

// ============================================================================
// Re-export implementations (feature-gated)
// ============================================================================

#[cfg(feature = "embedded")]
pub use embedding::CandleEmbeddingModel;

#[cfg(feature = "embedded")]
pub use core_adapter::CandleEmbedder;
