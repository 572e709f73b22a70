//! IDX — Indexer (§4.1).
//!
//! Derives and maintains [`ScoringProfile`] and [`EmbeddingRecord`] for every catalog item so
//! CR and SIM can operate without touching normalized catalog tables. The canonical chunk
//! recipe and the atomic profile+embedding publish are the load-bearing invariants here.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::collaborators::{CatalogMutation, CatalogStore, Embedder, VectorStore};
use crate::constants::{CHUNK_MAX_CAST_NAMES, CHUNK_MAX_REVIEW_TAGS};
use crate::errors::CoreError;
use crate::model::{
    AttributeValue, Credit, CreditRole, EmbeddingProvenance, EmbeddingRecord, Item, ItemId,
    ScoringProfile,
};

/// Per-item outcome of a bulk reindex. IDX failures are isolated per item (§7): a bulk
/// reindex reports this map and continues rather than aborting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReindexOutcome {
    Indexed,
    /// Profile was written but the embedding backend was unreachable; marked stale.
    IndexedWithStaleEmbedding { reason: String },
    /// The item vanished between read and write; treated as an implicit delete.
    SourceMissingTreatedAsDelete,
}

/// Report returned by [`Indexer::reindex_bulk`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexReport {
    pub outcomes: HashMap<ItemId, ReindexOutcomeSerializable>,
}

/// A serializable mirror of [`ReindexOutcome`] (kept separate so the enum above can grow
/// structured error payloads without touching the wire shape lightly).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReindexOutcomeSerializable {
    Indexed,
    Stale { reason: String },
    Deleted,
}

impl From<ReindexOutcome> for ReindexOutcomeSerializable {
    fn from(outcome: ReindexOutcome) -> Self {
        match outcome {
            ReindexOutcome::Indexed => Self::Indexed,
            ReindexOutcome::IndexedWithStaleEmbedding { reason } => Self::Stale { reason },
            ReindexOutcome::SourceMissingTreatedAsDelete => Self::Deleted,
        }
    }
}

/// Builds the canonical, deterministic, versioned text chunk for an item (§4.1). A change
/// to this function's composition must also bump `chunk_recipe_id`.
pub fn build_canonical_chunk(item: &Item, credits: &[Credit], genre_names: &[String], review_tags: &[String]) -> String {
    let mut lines = Vec::new();
    lines.push(item.title.clone());
    if let Some(original) = &item.original_title {
        if original != &item.title {
            lines.push(original.clone());
        }
    }
    lines.push(item.overview.clone());
    if let Some(tagline) = &item.tagline {
        lines.push(tagline.clone());
    }

    let mut cast: Vec<&Credit> = credits.iter().filter(|c| c.role == CreditRole::Cast).collect();
    cast.sort_by_key(|c| c.billing_order.unwrap_or(u32::MAX));
    let top_cast: Vec<String> = cast
        .iter()
        .take(CHUNK_MAX_CAST_NAMES)
        .map(|c| c.person_id.clone())
        .collect();
    lines.push(top_cast.join(", "));

    let directors: Vec<String> = credits
        .iter()
        .filter(|c| matches!(&c.role, CreditRole::Crew(dept) if dept.contains("director")))
        .map(|c| c.person_id.clone())
        .collect();
    lines.push(directors.join(", "));

    let writers: Vec<String> = credits
        .iter()
        .filter(|c| matches!(&c.role, CreditRole::Crew(dept) if dept.contains("writ")))
        .map(|c| c.person_id.clone())
        .collect();
    lines.push(writers.join(", "));

    lines.push(genre_names.join(", "));

    let mut deduped_tags: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for tag in review_tags {
        if seen.insert(tag.as_str()) {
            deduped_tags.push(tag.clone());
            if deduped_tags.len() >= CHUNK_MAX_REVIEW_TAGS {
                break;
            }
        }
    }
    lines.push(deduped_tags.join(", "));

    if let Some(year) = item.release_year() {
        lines.push(year.to_string());
    }
    lines.push(format!("{:?}", item.kind).to_lowercase());

    lines.join("\n")
}

/// Build the [`ScoringProfile`] for an item from itself, its credits, and derived
/// person-aggregate lookups. Pure; does not touch the embedding backend.
pub fn build_scoring_profile(
    item: &Item,
    credits: &[Credit],
    genre_slugs: &[String],
    person_aggregates: &HashMap<String, Option<f64>>,
) -> ScoringProfile {
    let director_aggregate = credits
        .iter()
        .filter(|c| matches!(&c.role, CreditRole::Crew(dept) if dept.contains("director")))
        .filter_map(|c| person_aggregates.get(&c.person_id).copied().flatten())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));

    let writer_aggregate = credits
        .iter()
        .filter(|c| matches!(&c.role, CreditRole::Crew(dept) if dept.contains("writ")))
        .filter_map(|c| person_aggregates.get(&c.person_id).copied().flatten())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));

    let mut cast: Vec<&Credit> = credits.iter().filter(|c| c.role == CreditRole::Cast).collect();
    cast.sort_by_key(|c| c.billing_order.unwrap_or(u32::MAX));
    let cast_aggregate: Vec<f64> = cast
        .iter()
        .filter_map(|c| person_aggregates.get(&c.person_id).copied().flatten())
        .collect();

    let creator_ids: Vec<String> = credits
        .iter()
        .filter(|c| matches!(&c.role, CreditRole::Crew(_)))
        .map(|c| c.person_id.clone())
        .collect();
    let mut custom_scalars = item.custom_attributes.clone();
    custom_scalars.insert(
        "creator_ids".to_string(),
        AttributeValue::TextArray(creator_ids),
    );

    ScoringProfile {
        item_id: item.id.clone(),
        kind: item.kind,
        release_year: item.release_year(),
        runtime_seconds: item.runtime_seconds,
        maturity_rating: item.maturity_rating.clone(),
        language: item.language.clone(),
        external_rating: item.external_rating,
        personal_rating: item.personal_rating,
        popularity: item.popularity,
        genre_slugs: genre_slugs.to_vec(),
        director_aggregate,
        writer_aggregate,
        cast_aggregate,
        custom_scalars,
    }
}

/// The Indexer. Generic over its collaborators so it can run against in-memory test doubles
/// or real backends without the core depending on either.
pub struct Indexer<'a> {
    pub catalog: &'a dyn CatalogStore,
    pub embedder: &'a dyn Embedder,
    pub vector_store: &'a dyn VectorStore,
    pub chunk_recipe_id: String,
}

/// The subset of a `ScoringProfile` the vector store's own metadata payload needs so SIM's
/// `BackendVectorStore`-style adapters can post-filter hits without a side table (kind,
/// release_year, genre_slugs, language).
fn vector_metadata(profile: &ScoringProfile) -> serde_json::Value {
    serde_json::json!({
        "kind": profile.kind,
        "release_year": profile.release_year,
        "genre_slugs": profile.genre_slugs,
        "language": profile.language,
    })
}

impl<'a> Indexer<'a> {
    /// `reindex(item_id)` — rebuild both derived records for one item, published atomically.
    pub async fn reindex(&self, item_id: &ItemId, credits: &[Credit], genre_names: &[String], genre_slugs: &[String], review_tags: &[String], person_aggregates: &HashMap<String, Option<f64>>) -> Result<ReindexOutcome, CoreError> {
        let item = match self.catalog.get_item(item_id).await? {
            Some(item) => item,
            None => {
                self.catalog.delete_derived(item_id).await?;
                let _ = self.vector_store.delete(item_id).await;
                return Ok(ReindexOutcome::SourceMissingTreatedAsDelete);
            }
        };

        let profile = build_scoring_profile(&item, credits, genre_slugs, person_aggregates);
        let metadata = vector_metadata(&profile);
        let chunk = build_canonical_chunk(&item, credits, genre_names, review_tags);

        match self.embedder.embed_one(&chunk).await {
            Ok(vector) => {
                let normalized = l2_normalize(vector);
                match self.vector_store.upsert(item_id, &normalized, metadata).await {
                    Ok(()) => {
                        // Atomic publish: both writes happen together before either is visible.
                        self.catalog.upsert_scoring_profile(profile).await?;
                        self.catalog
                            .upsert_embedding(EmbeddingRecord {
                                item_id: item_id.clone(),
                                vector: normalized,
                                provenance: EmbeddingProvenance {
                                    model_id: self.embedder.model_id().to_string(),
                                    chunk_recipe_id: self.chunk_recipe_id.clone(),
                                    produced_at: chrono::Utc::now(),
                                },
                                stale: false,
                            })
                            .await?;
                        Ok(ReindexOutcome::Indexed)
                    }
                    Err(err) => {
                        // The vector store couldn't be reached; the profile is still written
                        // and the existing embedding (if any) is left untouched, same as an
                        // embedder failure.
                        self.catalog.upsert_scoring_profile(profile).await?;
                        tracing::warn!(item_id = %item_id, error = %err, "vector store unreachable during reindex");
                        Ok(ReindexOutcome::IndexedWithStaleEmbedding {
                            reason: err.to_string(),
                        })
                    }
                }
            }
            Err(err) => {
                // Profile is still written; the existing embedding (if any) is left alone
                // and the entry is marked stale rather than removed.
                self.catalog.upsert_scoring_profile(profile).await?;
                tracing::warn!(item_id = %item_id, error = %err, "embedding backend unreachable during reindex");
                Ok(ReindexOutcome::IndexedWithStaleEmbedding {
                    reason: err.to_string(),
                })
            }
        }
    }

    /// `invalidate(item_id)` — remove derived records.
    pub async fn invalidate(&self, item_id: &ItemId) -> Result<(), CoreError> {
        self.catalog.delete_derived(item_id).await?;
        self.vector_store.delete(item_id).await
    }

    /// `on_catalog_change(event)` — route a mutation to the right recompute.
    pub fn affected_items(&self, event: &CatalogMutation) -> Vec<ItemId> {
        match event {
            CatalogMutation::ItemUpserted(id) | CatalogMutation::GenreLinkChanged(id) | CatalogMutation::ReviewChanged(id) => {
                vec![id.clone()]
            }
            CatalogMutation::CreditUpserted { item_id, .. } => vec![item_id.clone()],
            CatalogMutation::ItemDeleted(_) | CatalogMutation::PersonAggregateDirty(_) => vec![],
        }
    }
}

/// L2-normalize a vector to within float precision; §8 invariant 1 requires every stored
/// embedding to be normalized to within `1e-6`.
pub fn l2_normalize(vector: Vec<f32>) -> Vec<f32> {
    let norm = (vector.iter().map(|v| (*v as f64) * (*v as f64)).sum::<f64>()).sqrt();
    if norm <= f64::EPSILON {
        return vector;
    }
    vector.into_iter().map(|v| (v as f64 / norm) as f32).collect()
}

/// Vote-count-weighted mean of a person's credited items' external ratings (§4.1). Items
/// with zero vote count contribute nothing; a person with no rated credits is `None`
/// ("unrated", the §4.3 neutral element).
pub fn weighted_person_aggregate(ratings_and_votes: &[(f64, u64)]) -> Option<f64> {
    let total_votes: u64 = ratings_and_votes.iter().map(|(_, v)| v).sum();
    if total_votes == 0 {
        return None;
    }
    let weighted_sum: f64 = ratings_and_votes.iter().map(|(r, v)| r * (*v as f64)).sum();
    Some(weighted_sum / total_votes as f64)
}

/// Tracks which persons' aggregates need recomputation (§4.1, §9). A single writer lock is
/// implied by requiring `&mut self` on the mutating methods; readers use
/// [`PersonDirtySet::is_dirty`] which takes `&self`.
#[derive(Debug, Default)]
pub struct PersonDirtySet {
    dirty: HashSet<String>,
}

impl PersonDirtySet {
    pub fn mark_dirty(&mut self, person_id: impl Into<String>) {
        self.dirty.insert(person_id.into());
    }

    pub fn is_dirty(&self, person_id: &str) -> bool {
        self.dirty.contains(person_id)
    }

    /// Drain the dirty set before recomputing; callers recompute lazily right before the
    /// next CR call that needs these aggregates.
    pub fn drain(&mut self) -> Vec<String> {
        self.dirty.drain().collect()
    }
}

/// Persisted mapping of (chunk-recipe-id, embedder-model-id) → count of items indexed under
/// that provenance. The optional provenance ledger from §6, implemented unconditionally
/// per SPEC_FULL.md §11.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvenanceLedger {
    pub counts: HashMap<(String, String), u64>,
}

impl ProvenanceLedger {
    pub fn record(&mut self, chunk_recipe_id: &str, model_id: &str) {
        *self
            .counts
            .entry((chunk_recipe_id.to_string(), model_id.to_string()))
            .or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Item, ItemKind};
    use chrono::NaiveDate;
    use std::collections::HashMap as Map;

    fn sample_item() -> Item {
        Item {
            id: "I1".into(),
            kind: ItemKind::Film,
            title: "Dune".into(),
            original_title: None,
            release_date: NaiveDate::from_ymd_opt(2021, 10, 22),
            runtime_seconds: Some(9240),
            maturity_rating: Some("PG-13".into()),
            popularity: 88.0,
            external_rating: Some(8.0),
            external_vote_count: 10_000,
            personal_rating: None,
            language: Some("en".into()),
            overview: "A duke's son leads a rebellion.".into(),
            tagline: Some("Beyond fear, destiny awaits.".into()),
            poster_ref: None,
            backdrop_ref: None,
            status: "released".into(),
            custom_attributes: Map::new(),
        }
    }

    #[test]
    fn canonical_chunk_includes_all_recipe_fields_in_order() {
        let item = sample_item();
        let credits = vec![Credit {
            item_id: "I1".into(),
            person_id: "p-villeneuve".into(),
            role: CreditRole::Crew("directing-director".into()),
            billing_order: None,
            character_name: None,
        }];
        let chunk = build_canonical_chunk(&item, &credits, &["sci-fi".to_string()], &["epic".to_string()]);
        assert!(chunk.starts_with("Dune\n"));
        assert!(chunk.contains("p-villeneuve"));
        assert!(chunk.contains("sci-fi"));
        assert!(chunk.contains("epic"));
        assert!(chunk.ends_with("film"));
    }

    #[test]
    fn canonical_chunk_dedupes_and_caps_review_tags() {
        let item = sample_item();
        let tags: Vec<String> = (0..20).map(|i| format!("tag{}", i % 5)).collect();
        let chunk = build_canonical_chunk(&item, &[], &[], &tags);
        let tag_line = chunk.lines().nth(6).unwrap();
        assert_eq!(tag_line.split(", ").count(), 5);
    }

    #[test]
    fn l2_normalize_produces_unit_vector() {
        let v = vec![3.0_f32, 4.0];
        let normalized = l2_normalize(v);
        let norm: f32 = normalized.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn l2_normalize_leaves_zero_vector_untouched() {
        let v = vec![0.0_f32, 0.0];
        assert_eq!(l2_normalize(v.clone()), v);
    }

    #[test]
    fn weighted_person_aggregate_weights_by_votes() {
        let ratings = vec![(9.0, 1000), (5.0, 10)];
        let agg = weighted_person_aggregate(&ratings).unwrap();
        assert!(agg > 8.9 && agg < 9.0);
    }

    #[test]
    fn weighted_person_aggregate_zero_votes_is_unrated() {
        assert_eq!(weighted_person_aggregate(&[(9.0, 0)]), None);
    }

    #[test]
    fn person_dirty_set_tracks_and_drains() {
        let mut set = PersonDirtySet::default();
        set.mark_dirty("p1");
        assert!(set.is_dirty("p1"));
        let drained = set.drain();
        assert_eq!(drained, vec!["p1".to_string()]);
        assert!(!set.is_dirty("p1"));
    }

    #[test]
    fn provenance_ledger_counts_by_recipe_and_model() {
        let mut ledger = ProvenanceLedger::default();
        ledger.record("v1", "model-a");
        ledger.record("v1", "model-a");
        ledger.record("v2", "model-a");
        assert_eq!(ledger.counts[&("v1".to_string(), "model-a".to_string())], 2);
        assert_eq!(ledger.counts[&("v2".to_string(), "model-a".to_string())], 1);
    }

    #[tokio::test]
    async fn reindex_publishes_the_vector_into_the_vector_store() {
        use crate::testing::{FakeEmbedder, FakeVectorStore, InMemoryCatalogStore};

        let catalog = InMemoryCatalogStore::new();
        catalog.seed_item(sample_item());
        let embedder = FakeEmbedder::new(8);
        let vector_store = FakeVectorStore::new();
        let indexer = Indexer {
            catalog: &catalog,
            embedder: &embedder,
            vector_store: &vector_store,
            chunk_recipe_id: "v1".to_string(),
        };

        let outcome = indexer
            .reindex(&"I1".to_string(), &[], &[], &[], &[], &Map::new())
            .await
            .unwrap();
        assert!(matches!(outcome, ReindexOutcome::Indexed));

        // A probe identical to the item's own chunk should retrieve it back out of the
        // vector store IDX just populated.
        let chunk = build_canonical_chunk(&sample_item(), &[], &[], &[]);
        let probe = l2_normalize(embedder.embed_one(&chunk).await.unwrap());
        let hits = vector_store.query(&probe, 1, &crate::collaborators::CatalogFilter::default()).await.unwrap();
        assert_eq!(hits[0].item_id, "I1");
    }

    #[tokio::test]
    async fn invalidate_removes_the_vector_alongside_the_catalog_derived_records() {
        use crate::testing::{FakeEmbedder, FakeVectorStore, InMemoryCatalogStore};

        let catalog = InMemoryCatalogStore::new();
        catalog.seed_item(sample_item());
        let embedder = FakeEmbedder::new(8);
        let vector_store = FakeVectorStore::new();
        let indexer = Indexer {
            catalog: &catalog,
            embedder: &embedder,
            vector_store: &vector_store,
            chunk_recipe_id: "v1".to_string(),
        };
        indexer
            .reindex(&"I1".to_string(), &[], &[], &[], &[], &Map::new())
            .await
            .unwrap();

        indexer.invalidate(&"I1".to_string()).await.unwrap();

        let hits = vector_store
            .query(&[0.0; 8], 10, &crate::collaborators::CatalogFilter::default())
            .await
            .unwrap();
        assert!(hits.is_empty());
    }
}
