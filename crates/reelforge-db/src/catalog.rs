//! JSONL-file-backed `CatalogStore`.
//!
//! The relational catalog (items, people, genres, reviews) is out of scope for
//! `reelforge-core` — it's an external collaborator the engine reads through the
//! `CatalogStore` trait. This is the one concrete implementation shipped in this crate: a
//! directory of JSONL files, loaded into memory on open and rewritten wholesale on every
//! mutation, the same load/flush shape as [`crate::vector::SimpleFileVectorIndex`].
//!
//! Real deployments are expected to point `reelforge-cli` at a proper relational store;
//! this one exists so the engine has something real and runnable to sit on top of.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use reelforge_core::collaborators::{CatalogFilter, CatalogStore, Cursor};
use reelforge_core::errors::CoreError;
use reelforge_core::model::{Credit, EmbeddingRecord, Item, ItemId, ScoringProfile};
use tracing::debug;

const ITEMS_FILENAME: &str = "items.jsonl";
const CREDITS_FILENAME: &str = "credits.jsonl";
const PROFILES_FILENAME: &str = "scoring_profiles.jsonl";
const EMBEDDINGS_FILENAME: &str = "embeddings.jsonl";

#[derive(serde::Serialize, serde::Deserialize)]
struct CreditsRow {
    item_id: ItemId,
    credits: Vec<Credit>,
}

/// A `CatalogStore` backed by four JSONL files in a directory.
pub struct JsonCatalogStore {
    dir: PathBuf,
    items: RwLock<HashMap<ItemId, Item>>,
    credits: RwLock<HashMap<ItemId, Vec<Credit>>>,
    profiles: RwLock<HashMap<ItemId, ScoringProfile>>,
    embeddings: RwLock<HashMap<ItemId, EmbeddingRecord>>,
}

fn io_err(path: &Path, err: impl std::fmt::Display) -> CoreError {
    CoreError::Other(anyhow::anyhow!(
        "catalog store I/O error at {}: {}",
        path.display(),
        err
    ))
}

fn load_jsonl<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, CoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path).map_err(|e| io_err(path, e))?;
    let reader = BufReader::new(file);
    let mut rows = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| io_err(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(&line) {
            Ok(row) => rows.push(row),
            Err(e) => debug!(path = %path.display(), line = line_num + 1, error = %e, "skipping invalid catalog row"),
        }
    }
    Ok(rows)
}

fn save_jsonl<T: serde::Serialize>(path: &Path, rows: impl Iterator<Item = T>) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(path, e))?;
    }
    let mut file = File::create(path).map_err(|e| io_err(path, e))?;
    for row in rows {
        let line = serde_json::to_string(&row)?;
        writeln!(file, "{line}").map_err(|e| io_err(path, e))?;
    }
    Ok(())
}

impl JsonCatalogStore {
    /// Open (or create) a catalog store rooted at `dir`. Existing JSONL files are loaded
    /// eagerly; a missing file is treated as empty rather than an error.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let dir = dir.into();
        let items: HashMap<ItemId, Item> = load_jsonl::<Item>(&dir.join(ITEMS_FILENAME))?
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();
        let credits: HashMap<ItemId, Vec<Credit>> = load_jsonl::<CreditsRow>(&dir.join(CREDITS_FILENAME))?
            .into_iter()
            .map(|row| (row.item_id, row.credits))
            .collect();
        let profiles: HashMap<ItemId, ScoringProfile> =
            load_jsonl::<ScoringProfile>(&dir.join(PROFILES_FILENAME))?
                .into_iter()
                .map(|p| (p.item_id.clone(), p))
                .collect();
        let embeddings: HashMap<ItemId, EmbeddingRecord> =
            load_jsonl::<EmbeddingRecord>(&dir.join(EMBEDDINGS_FILENAME))?
                .into_iter()
                .map(|e| (e.item_id.clone(), e))
                .collect();

        Ok(Self {
            dir,
            items: RwLock::new(items),
            credits: RwLock::new(credits),
            profiles: RwLock::new(profiles),
            embeddings: RwLock::new(embeddings),
        })
    }

    /// Seed (or replace) an item directly, bypassing any external ingest pipeline.
    pub fn put_item(&self, item: Item) -> Result<(), CoreError> {
        self.items.write().expect("poisoned").insert(item.id.clone(), item);
        self.flush_items()
    }

    /// Seed (or replace) the credits for an item.
    pub fn put_credits(&self, item_id: &ItemId, credits: Vec<Credit>) -> Result<(), CoreError> {
        self.credits.write().expect("poisoned").insert(item_id.clone(), credits);
        self.flush_credits()
    }

    fn flush_items(&self) -> Result<(), CoreError> {
        let items = self.items.read().expect("poisoned");
        save_jsonl(&self.dir.join(ITEMS_FILENAME), items.values())
    }

    fn flush_credits(&self) -> Result<(), CoreError> {
        let credits = self.credits.read().expect("poisoned");
        let rows = credits.iter().map(|(item_id, credits)| CreditsRow {
            item_id: item_id.clone(),
            credits: credits.clone(),
        });
        save_jsonl(&self.dir.join(CREDITS_FILENAME), rows)
    }

    fn flush_profiles(&self) -> Result<(), CoreError> {
        let profiles = self.profiles.read().expect("poisoned");
        save_jsonl(&self.dir.join(PROFILES_FILENAME), profiles.values())
    }

    fn flush_embeddings(&self) -> Result<(), CoreError> {
        let embeddings = self.embeddings.read().expect("poisoned");
        save_jsonl(&self.dir.join(EMBEDDINGS_FILENAME), embeddings.values())
    }
}

#[async_trait]
impl CatalogStore for JsonCatalogStore {
    async fn get_item(&self, id: &ItemId) -> Result<Option<Item>, CoreError> {
        Ok(self.items.read().expect("poisoned").get(id).cloned())
    }

    async fn iter_items(&self, filter: &CatalogFilter, _cursor: Cursor) -> Result<(Vec<Item>, Cursor), CoreError> {
        let items = self.items.read().expect("poisoned");
        let filtered: Vec<Item> = items
            .values()
            .filter(|item| filter.kinds.is_empty() || filter.kinds.contains(&item.kind))
            .filter(|item| filter.year_min.map_or(true, |min| item.release_year().map_or(true, |y| y >= min)))
            .filter(|item| filter.year_max.map_or(true, |max| item.release_year().map_or(true, |y| y <= max)))
            .filter(|item| filter.language.as_ref().map_or(true, |lang| item.language.as_deref() == Some(lang.as_str())))
            .filter(|item| !filter.exclude_ids.contains(&item.id))
            .cloned()
            .collect();
        Ok((filtered, None))
    }

    async fn get_credits(&self, item_id: &ItemId) -> Result<Vec<Credit>, CoreError> {
        Ok(self.credits.read().expect("poisoned").get(item_id).cloned().unwrap_or_default())
    }

    async fn upsert_scoring_profile(&self, profile: ScoringProfile) -> Result<(), CoreError> {
        self.profiles.write().expect("poisoned").insert(profile.item_id.clone(), profile);
        self.flush_profiles()
    }

    async fn upsert_embedding(&self, record: EmbeddingRecord) -> Result<(), CoreError> {
        self.embeddings.write().expect("poisoned").insert(record.item_id.clone(), record);
        self.flush_embeddings()
    }

    async fn get_scoring_profile(&self, id: &ItemId) -> Result<Option<ScoringProfile>, CoreError> {
        Ok(self.profiles.read().expect("poisoned").get(id).cloned())
    }

    async fn get_embedding(&self, id: &ItemId) -> Result<Option<EmbeddingRecord>, CoreError> {
        Ok(self.embeddings.read().expect("poisoned").get(id).cloned())
    }

    async fn delete_derived(&self, id: &ItemId) -> Result<(), CoreError> {
        self.profiles.write().expect("poisoned").remove(id);
        self.embeddings.write().expect("poisoned").remove(id);
        self.flush_profiles()?;
        self.flush_embeddings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelforge_core::model::ItemKind;

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
    async fn round_trips_items_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = JsonCatalogStore::open(dir.path()).unwrap();
            store.put_item(sample_item("i1")).unwrap();
        }
        let reopened = JsonCatalogStore::open(dir.path()).unwrap();
        let item = reopened.get_item(&"i1".to_string()).await.unwrap();
        assert!(item.is_some());
    }

    #[tokio::test]
    async fn delete_derived_clears_profile_and_embedding_but_keeps_item() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonCatalogStore::open(dir.path()).unwrap();
        store.put_item(sample_item("i1")).unwrap();
        store
            .upsert_scoring_profile(ScoringProfile {
                item_id: "i1".into(),
                kind: ItemKind::Film,
                release_year: None,
                runtime_seconds: None,
                maturity_rating: None,
                language: None,
                external_rating: None,
                personal_rating: None,
                popularity: 0.0,
                genre_slugs: vec![],
                director_aggregate: None,
                writer_aggregate: None,
                cast_aggregate: vec![],
                custom_scalars: HashMap::new(),
            })
            .await
            .unwrap();

        store.delete_derived(&"i1".to_string()).await.unwrap();

        assert!(store.get_scoring_profile(&"i1".to_string()).await.unwrap().is_none());
        assert!(store.get_item(&"i1".to_string()).await.unwrap().is_some());
    }
}
