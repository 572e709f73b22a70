//! Bridges [`VectorIndexBackend`](crate::vector::VectorIndexBackend) into
//! `reelforge_core::collaborators::VectorStore`.
//!
//! The backend's own filter (base/branch/source_type/tags/revision_id) was built for
//! source-code indexing and doesn't line up with [`CatalogFilter`]'s item-catalog shape
//! (kinds/year range/genres/language/exclude_ids). Rather than force one into the other,
//! this adapter queries the backend unfiltered, over-fetching, and applies `CatalogFilter`
//! itself against the JSON payload each vector was upserted with. The payload is expected
//! to carry the fields SIM and IDX already put there: `kind`, `release_year`, `genre_slugs`,
//! `language`.
//!
//! Backends key vectors by `u64`; catalog items are keyed by string `ItemId`. The adapter
//! derives a stable id via `DefaultHasher` and carries the original string alongside the
//! caller's metadata so results map back without a side table.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use reelforge_core::collaborators::{CatalogFilter, VectorHit, VectorStore};
use reelforge_core::errors::CoreError;
use reelforge_core::model::{ItemId, ItemKind};

use crate::vector::{VectorId, VectorIndexBackend, VectorInsert};

/// Factor applied to `k` when querying the backend, to leave room for post-filtering.
const OVER_FETCH_FACTOR: usize = 4;

/// Key under which the adapter stashes the original string item id inside the payload.
const ITEM_ID_FIELD: &str = "__item_id";

fn vector_id_for(item_id: &ItemId) -> VectorId {
    let mut hasher = DefaultHasher::new();
    item_id.hash(&mut hasher);
    VectorId::new(hasher.finish())
}

fn to_core_error(err: crate::error::DbError) -> CoreError {
    CoreError::CollaboratorUnavailable {
        collaborator: "VectorStore".to_string(),
        reason: err.to_string(),
    }
}

fn passes_filter(payload: &serde_json::Value, item_id: &ItemId, filter: &CatalogFilter) -> bool {
    if filter.exclude_ids.contains(item_id) {
        return false;
    }
    if !filter.kinds.is_empty() {
        let kind = payload
            .get("kind")
            .and_then(|v| v.as_str())
            .and_then(|s| serde_json::from_value::<ItemKind>(serde_json::Value::String(s.to_string())).ok());
        match kind {
            Some(kind) if filter.kinds.contains(&kind) => {}
            _ => return false,
        }
    }
    if filter.year_min.is_some() || filter.year_max.is_some() {
        let year = payload.get("release_year").and_then(|v| v.as_i64()).map(|y| y as i32);
        match year {
            Some(year) => {
                if filter.year_min.is_some_and(|min| year < min) {
                    return false;
                }
                if filter.year_max.is_some_and(|max| year > max) {
                    return false;
                }
            }
            None => return false,
        }
    }
    if !filter.genre_slugs_any.is_empty() {
        let genres: Vec<String> = payload
            .get("genre_slugs")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|g| g.as_str().map(String::from)).collect())
            .unwrap_or_default();
        if !filter.genre_slugs_any.iter().any(|g| genres.contains(g)) {
            return false;
        }
    }
    if let Some(lang) = &filter.language {
        let payload_lang = payload.get("language").and_then(|v| v.as_str());
        if payload_lang != Some(lang.as_str()) {
            return false;
        }
    }
    true
}

/// `VectorStore` backed by a [`VectorIndexBackend`] (LanceDB or the JSONL "simple" backend).
pub struct BackendVectorStore {
    backend: Arc<dyn VectorIndexBackend>,
}

impl BackendVectorStore {
    pub fn new(backend: Arc<dyn VectorIndexBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl VectorStore for BackendVectorStore {
    async fn upsert(&self, item_id: &ItemId, vector: &[f32], metadata: serde_json::Value) -> Result<(), CoreError> {
        let mut payload = metadata;
        if let serde_json::Value::Object(map) = &mut payload {
            map.insert(ITEM_ID_FIELD.to_string(), serde_json::Value::String(item_id.clone()));
        } else {
            payload = serde_json::json!({ ITEM_ID_FIELD: item_id });
        }

        let insert = VectorInsert::new(vector_id_for(item_id), vector.to_vec(), payload);
        self.backend.upsert(&[insert]).map_err(to_core_error)?;
        self.backend.flush().map_err(to_core_error)
    }

    async fn query(&self, vector: &[f32], k: usize, filter: &CatalogFilter) -> Result<Vec<VectorHit>, CoreError> {
        let fetch = k.saturating_mul(OVER_FETCH_FACTOR).max(k);
        let results = self.backend.query(vector, fetch, None).map_err(to_core_error)?;

        let mut hits = Vec::with_capacity(k);
        for result in results {
            let Some(item_id) = result.payload.get(ITEM_ID_FIELD).and_then(|v| v.as_str()) else {
                continue;
            };
            let item_id = item_id.to_string();
            if !passes_filter(&result.payload, &item_id, filter) {
                continue;
            }
            hits.push(VectorHit {
                item_id,
                cosine: result.score,
                metadata: result.payload,
            });
            if hits.len() >= k {
                break;
            }
        }
        Ok(hits)
    }

    async fn delete(&self, item_id: &ItemId) -> Result<(), CoreError> {
        self.backend.delete(&[vector_id_for(item_id)]).map_err(to_core_error)?;
        self.backend.flush().map_err(to_core_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_item_id_hashes_to_same_vector_id() {
        let a = vector_id_for(&"movie-1".to_string());
        let b = vector_id_for(&"movie-1".to_string());
        assert_eq!(a, b);
    }

    #[test]
    fn filter_rejects_excluded_ids() {
        let filter = CatalogFilter {
            exclude_ids: vec!["movie-1".to_string()],
            ..Default::default()
        };
        assert!(!passes_filter(&serde_json::json!({}), &"movie-1".to_string(), &filter));
    }

    #[test]
    fn filter_matches_on_kind_and_year_range() {
        let filter = CatalogFilter {
            kinds: vec![ItemKind::Film],
            year_min: Some(2000),
            year_max: Some(2010),
            ..Default::default()
        };
        let payload = serde_json::json!({ "kind": "film", "release_year": 2005 });
        assert!(passes_filter(&payload, &"movie-1".to_string(), &filter));

        let too_old = serde_json::json!({ "kind": "film", "release_year": 1990 });
        assert!(!passes_filter(&too_old, &"movie-1".to_string(), &filter));
    }
}
