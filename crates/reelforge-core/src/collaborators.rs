//! External collaborator traits (§6).
//!
//! The catalog store, embedder, vector store and generator are explicitly out of scope for
//! this core, which depends only on their interfaces. Concrete implementations (e.g.
//! `reelforge-db`'s LanceDB-backed `VectorStore`, `reelforge-model`'s Candle-backed
//! `Embedder`, `reelforge-llm`'s HTTP-backed `Generator`) live in sibling crates and are
//! wired in by the caller (see `reelforge-cli`'s startup wiring). `reelforge-core` itself
//! depends on nothing but these trait definitions plus its own domain model.

use async_trait::async_trait;

use crate::errors::CoreError;
use crate::model::{Credit, Item, ItemId};

/// A filter over catalog items, used both by `iter_items` and by SIM/CR candidate pools.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    pub kinds: Vec<crate::model::ItemKind>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub genre_slugs_any: Vec<String>,
    pub language: Option<String>,
    pub exclude_ids: Vec<ItemId>,
}

/// Opaque cursor for paginated catalog iteration.
pub type Cursor = Option<String>;

/// A mutation event the catalog store publishes; IDX subscribes to these (§4.1
/// `on_catalog_change`).
#[derive(Debug, Clone)]
pub enum CatalogMutation {
    ItemUpserted(ItemId),
    ItemDeleted(ItemId),
    CreditUpserted { item_id: ItemId, person_id: String },
    GenreLinkChanged(ItemId),
    ReviewChanged(ItemId),
    PersonAggregateDirty(String),
}

/// The relational catalog store (items, people, genres, reviews, calendar events). Owned
/// externally; the core reads it and writes only its two derived record kinds back through
/// the dedicated `upsert_scoring_profile`/`upsert_embedding` methods.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_item(&self, id: &ItemId) -> Result<Option<Item>, CoreError>;

    async fn iter_items(
        &self,
        filter: &CatalogFilter,
        cursor: Cursor,
    ) -> Result<(Vec<Item>, Cursor), CoreError>;

    async fn get_credits(&self, item_id: &ItemId) -> Result<Vec<Credit>, CoreError>;

    async fn upsert_scoring_profile(
        &self,
        profile: crate::model::ScoringProfile,
    ) -> Result<(), CoreError>;

    async fn upsert_embedding(
        &self,
        record: crate::model::EmbeddingRecord,
    ) -> Result<(), CoreError>;

    async fn get_scoring_profile(
        &self,
        id: &ItemId,
    ) -> Result<Option<crate::model::ScoringProfile>, CoreError>;

    async fn get_embedding(
        &self,
        id: &ItemId,
    ) -> Result<Option<crate::model::EmbeddingRecord>, CoreError>;

    async fn delete_derived(&self, id: &ItemId) -> Result<(), CoreError>;
}

/// Text-embedding backend. Deterministic for a given model id.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_id(&self) -> &str;
    fn dimension(&self) -> usize;

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, CoreError>;
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CoreError>;
}

/// A single vector-store hit: (id, cosine similarity, opaque metadata).
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub item_id: ItemId,
    pub cosine: f32,
    pub metadata: serde_json::Value,
}

/// Vector index abstraction used by SIM and maintained by IDX.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn upsert(
        &self,
        item_id: &ItemId,
        vector: &[f32],
        metadata: serde_json::Value,
    ) -> Result<(), CoreError>;

    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        filter: &CatalogFilter,
    ) -> Result<Vec<VectorHit>, CoreError>;

    async fn delete(&self, item_id: &ItemId) -> Result<(), CoreError>;
}

/// One streamed chunk of generator output.
#[derive(Debug, Clone)]
pub struct GenerationChunk {
    pub text: String,
    pub is_final: bool,
}

/// Parameters controlling a single generator call.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

/// The local/remote generative model server.
#[async_trait]
pub trait Generator: Send + Sync {
    fn model_id(&self) -> &str;
    fn context_window(&self) -> u32;

    /// Stream a completion for `prompt`. `cache_hint`, if present, names a previously
    /// cached prefix the generator may resume from.
    async fn stream(
        &self,
        prompt: &str,
        params: &GenerationParams,
        cache_hint: Option<&str>,
    ) -> Result<tokio::sync::mpsc::Receiver<Result<GenerationChunk, CoreError>>, CoreError>;
}

/// Optional hydration source for items (movie DB, music DB, streaming preview service).
/// Opaque to the core; IDX may call it to enrich an item before chunking, but nothing in
/// CR/SIM/CAG depends on its shape.
#[async_trait]
pub trait ExternalMetadataSource: Send + Sync {
    async fn hydrate(&self, item_id: &ItemId) -> Result<Option<serde_json::Value>, CoreError>;
}
