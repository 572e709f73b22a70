//! In-memory test doubles for every collaborator trait (SPEC_FULL.md §10.4).
//!
//! Used across `idx`/`sim`/`cr`/`cag`/`cache` unit tests and by `reelforge-cli`'s
//! integration tests so the whole pipeline can run without a real catalog store, vector
//! store, embedder or generator.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::collaborators::{
    CatalogFilter, CatalogStore, Cursor, Embedder, GenerationChunk, GenerationParams, Generator,
    VectorHit, VectorStore,
};
use crate::errors::CoreError;
use crate::model::{Credit, EmbeddingRecord, Item, ItemId, ScoringProfile};

/// A plain in-memory `CatalogStore`. Iteration ignores `cursor`/pagination (tests use small
/// fixtures); `filter` is applied on `kinds`/`year_min`/`year_max` only.
#[derive(Default)]
pub struct InMemoryCatalogStore {
    items: Mutex<HashMap<ItemId, Item>>,
    credits: Mutex<HashMap<ItemId, Vec<Credit>>>,
    profiles: Mutex<HashMap<ItemId, ScoringProfile>>,
    embeddings: Mutex<HashMap<ItemId, EmbeddingRecord>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_item(&self, item: Item) {
        self.items.lock().expect("poisoned").insert(item.id.clone(), item);
    }

    pub fn seed_credits(&self, item_id: &ItemId, credits: Vec<Credit>) {
        self.credits.lock().expect("poisoned").insert(item_id.clone(), credits);
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn get_item(&self, id: &ItemId) -> Result<Option<Item>, CoreError> {
        Ok(self.items.lock().expect("poisoned").get(id).cloned())
    }

    async fn iter_items(&self, filter: &CatalogFilter, _cursor: Cursor) -> Result<(Vec<Item>, Cursor), CoreError> {
        let items = self.items.lock().expect("poisoned");
        let filtered: Vec<Item> = items
            .values()
            .filter(|item| filter.kinds.is_empty() || filter.kinds.contains(&item.kind))
            .filter(|item| filter.year_min.map_or(true, |min| item.release_year().map_or(true, |y| y >= min)))
            .filter(|item| filter.year_max.map_or(true, |max| item.release_year().map_or(true, |y| y <= max)))
            .filter(|item| !filter.exclude_ids.contains(&item.id))
            .cloned()
            .collect();
        Ok((filtered, None))
    }

    async fn get_credits(&self, item_id: &ItemId) -> Result<Vec<Credit>, CoreError> {
        Ok(self.credits.lock().expect("poisoned").get(item_id).cloned().unwrap_or_default())
    }

    async fn upsert_scoring_profile(&self, profile: ScoringProfile) -> Result<(), CoreError> {
        self.profiles.lock().expect("poisoned").insert(profile.item_id.clone(), profile);
        Ok(())
    }

    async fn upsert_embedding(&self, record: EmbeddingRecord) -> Result<(), CoreError> {
        self.embeddings.lock().expect("poisoned").insert(record.item_id.clone(), record);
        Ok(())
    }

    async fn get_scoring_profile(&self, id: &ItemId) -> Result<Option<ScoringProfile>, CoreError> {
        Ok(self.profiles.lock().expect("poisoned").get(id).cloned())
    }

    async fn get_embedding(&self, id: &ItemId) -> Result<Option<EmbeddingRecord>, CoreError> {
        Ok(self.embeddings.lock().expect("poisoned").get(id).cloned())
    }

    async fn delete_derived(&self, id: &ItemId) -> Result<(), CoreError> {
        self.profiles.lock().expect("poisoned").remove(id);
        self.embeddings.lock().expect("poisoned").remove(id);
        Ok(())
    }
}

/// Deterministic fake embedder: hashes the input text into a fixed-size vector so identical
/// text always produces identical (already near-unit-norm) output.
pub struct FakeEmbedder {
    pub model_id: String,
    pub dimension: usize,
    pub fail: bool,
}

impl FakeEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            model_id: "fake-embedder-v1".to_string(),
            dimension,
            fail: false,
        }
    }

    fn hash_embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % self.dimension] += (byte as f32) / 255.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, CoreError> {
        if self.fail {
            return Err(CoreError::CollaboratorUnavailable {
                collaborator: "Embedder".to_string(),
                reason: "fake embedder configured to fail".to_string(),
            });
        }
        Ok(self.hash_embed(text))
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CoreError> {
        if self.fail {
            return Err(CoreError::CollaboratorUnavailable {
                collaborator: "Embedder".to_string(),
                reason: "fake embedder configured to fail".to_string(),
            });
        }
        Ok(texts.iter().map(|t| self.hash_embed(t)).collect())
    }
}

/// Brute-force in-memory vector store: cosine similarity over everything upserted.
#[derive(Default)]
pub struct FakeVectorStore {
    vectors: Mutex<HashMap<ItemId, (Vec<f32>, serde_json::Value)>>,
}

impl FakeVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for FakeVectorStore {
    async fn upsert(&self, item_id: &ItemId, vector: &[f32], metadata: serde_json::Value) -> Result<(), CoreError> {
        self.vectors
            .lock()
            .expect("poisoned")
            .insert(item_id.clone(), (vector.to_vec(), metadata));
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize, filter: &CatalogFilter) -> Result<Vec<VectorHit>, CoreError> {
        let vectors = self.vectors.lock().expect("poisoned");
        let mut hits: Vec<VectorHit> = vectors
            .iter()
            .filter(|(id, _)| !filter.exclude_ids.contains(id))
            .map(|(id, (v, meta))| VectorHit {
                item_id: id.clone(),
                cosine: cosine(vector, v),
                metadata: meta.clone(),
            })
            .collect();
        hits.sort_by(|a, b| b.cosine.partial_cmp(&a.cosine).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }

    async fn delete(&self, item_id: &ItemId) -> Result<(), CoreError> {
        self.vectors.lock().expect("poisoned").remove(item_id);
        Ok(())
    }
}

/// Scripted fake generator: replies with a single fixed chunk, or fails, per construction.
pub struct FakeGenerator {
    pub model_id: String,
    pub context_window: u32,
    pub scripted_response: String,
    pub fail: bool,
}

impl FakeGenerator {
    pub fn new(scripted_response: impl Into<String>) -> Self {
        Self {
            model_id: "fake-generator-v1".to_string(),
            context_window: 8192,
            scripted_response: scripted_response.into(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(String::new())
        }
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn context_window(&self) -> u32 {
        self.context_window
    }

    async fn stream(
        &self,
        _prompt: &str,
        _params: &GenerationParams,
        _cache_hint: Option<&str>,
    ) -> Result<tokio::sync::mpsc::Receiver<Result<GenerationChunk, CoreError>>, CoreError> {
        if self.fail {
            return Err(CoreError::CollaboratorUnavailable {
                collaborator: "Generator".to_string(),
                reason: "fake generator configured to fail".to_string(),
            });
        }
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        let response = self.scripted_response.clone();
        tokio::spawn(async move {
            let _ = tx
                .send(Ok(GenerationChunk {
                    text: response,
                    is_final: true,
                }))
                .await;
        });
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemKind;

    fn sample_item(id: &str) -> Item {
        Item {
            id: id.to_string(),
            kind: ItemKind::Film,
            title: "Test".into(),
            original_title: None,
            release_date: None,
            runtime_seconds: None,
            maturity_rating: None,
            popularity: 0.0,
            external_rating: None,
            external_vote_count: 0,
            personal_rating: None,
            language: None,
            overview: String::new(),
            tagline: None,
            poster_ref: None,
            backdrop_ref: None,
            status: "released".into(),
            custom_attributes: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn in_memory_catalog_store_round_trips_items() {
        let store = InMemoryCatalogStore::new();
        store.seed_item(sample_item("i1"));
        let fetched = store.get_item(&"i1".to_string()).await.unwrap();
        assert!(fetched.is_some());
        assert!(store.get_item(&"missing".to_string()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fake_embedder_is_deterministic() {
        let embedder = FakeEmbedder::new(8);
        let a = embedder.embed_one("hello").await.unwrap();
        let b = embedder.embed_one("hello").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn fake_vector_store_ranks_by_cosine() {
        let store = FakeVectorStore::new();
        store.upsert(&"a".to_string(), &[1.0, 0.0], serde_json::Value::Null).await.unwrap();
        store.upsert(&"b".to_string(), &[0.0, 1.0], serde_json::Value::Null).await.unwrap();
        let hits = store.query(&[1.0, 0.0], 2, &CatalogFilter::default()).await.unwrap();
        assert_eq!(hits[0].item_id, "a");
    }

    #[tokio::test]
    async fn fake_generator_streams_scripted_response() {
        let generator = FakeGenerator::new("hello world");
        let mut rx = generator
            .stream("prompt", &GenerationParams { max_output_tokens: 10, temperature: 0.0 }, None)
            .await
            .unwrap();
        let chunk = rx.recv().await.unwrap().unwrap();
        assert_eq!(chunk.text, "hello world");
        assert!(chunk.is_final);
    }

    #[tokio::test]
    async fn fake_generator_can_be_scripted_to_fail() {
        let generator = FakeGenerator::failing();
        let result = generator
            .stream("prompt", &GenerationParams { max_output_tokens: 10, temperature: 0.0 }, None)
            .await;
        assert!(result.is_err());
    }
}
