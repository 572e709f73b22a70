//! The catalog data model (§3).
//!
//! Entities here are semantic and storage-agnostic: `reelforge-core` never persists them
//! itself except for the two derived records it owns outright (`ScoringProfile`,
//! `EmbeddingRecord`) plus `PersonaProfile`/`CagCacheEntry` bookkeeping. Everything else is
//! read through [`crate::collaborators::CatalogStore`].

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Stable item identifier.
pub type ItemId = String;

/// Stable person identifier.
pub type PersonId = String;

/// Genre taxonomy slug, e.g. `"sci-fi"`.
pub type GenreSlug = String;

/// Kind of media artifact. Fixed after an item is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Film,
    Series,
    Anime,
    Documentary,
    Album,
    Track,
}

/// A scalar or array value in an item's open custom-attribute bag.
///
/// Attribute names are restricted to `[a-z0-9_]+`; unknown shapes are rejected at the
/// `custom.*` criterion boundary with `CoreError::UnknownAttributeTag`, never guessed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    Text(String),
    TextArray(Vec<String>),
}

/// A single media artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    pub title: String,
    pub original_title: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub runtime_seconds: Option<u32>,
    pub maturity_rating: Option<String>,
    pub popularity: f64,
    pub external_rating: Option<f64>,
    pub external_vote_count: u64,
    pub personal_rating: Option<f64>,
    pub language: Option<String>,
    pub overview: String,
    pub tagline: Option<String>,
    pub poster_ref: Option<String>,
    pub backdrop_ref: Option<String>,
    pub status: String,
    pub custom_attributes: HashMap<String, AttributeValue>,
}

impl Item {
    /// Release year, if a release date is known.
    pub fn release_year(&self) -> Option<i32> {
        use chrono::Datelike;
        self.release_date.map(|d| d.year())
    }
}

/// A taxonomy node. Forms a forest: many roots, one parent per node, no cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genre {
    pub slug: GenreSlug,
    pub display_name: String,
    pub parent_slug: Option<GenreSlug>,
    pub category: Option<String>,
    pub active: bool,
}

/// Cast/crew record. The aggregate rating is recomputed lazily by IDX (§4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub display_name: String,
    pub department: String,
    pub aggregate_rating: Option<f64>,
}

/// Role an item/person credit can carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditRole {
    Cast,
    /// `crew-<department>-<job>`, e.g. `crew-directing-director`.
    Crew(String),
}

/// Ternary relation (item, person, role). Unique on (item, person, role).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credit {
    pub item_id: ItemId,
    pub person_id: PersonId,
    pub role: CreditRole,
    pub billing_order: Option<u32>,
    pub character_name: Option<String>,
}

/// (item, genre, weight) link. A single (item, genre) pair appears at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenreLink {
    pub item_id: ItemId,
    pub genre_slug: GenreSlug,
    /// In `[0, 1]`; expresses primary vs secondary.
    pub weight: f64,
}

/// Personal rating + text + watched date + tags, bound to exactly one item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub item_id: ItemId,
    /// In `[0, 10]`.
    pub rating: f64,
    pub text: String,
    pub watched_date: NaiveDate,
    pub tags: Vec<String>,
}

/// Append-only watch event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchEvent {
    pub item_id: ItemId,
    pub timestamp: DateTime<Utc>,
    pub completion_fraction: f64,
    pub source_tag: String,
}

/// Named, reusable CR configuration. Immutable-on-use: a running recommendation captures
/// a config snapshot ([`crate::cr::CriteriaConfig`]) rather than a live reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriteriaPreset {
    pub id: String,
    pub name: String,
    pub config: crate::cr::CriteriaConfig,
}

/// Per-item denormalized record consumed by CR (owned exclusively by IDX).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringProfile {
    pub item_id: ItemId,
    pub kind: ItemKind,
    pub release_year: Option<i32>,
    pub runtime_seconds: Option<u32>,
    pub maturity_rating: Option<String>,
    pub language: Option<String>,
    pub external_rating: Option<f64>,
    pub personal_rating: Option<f64>,
    pub popularity: f64,
    pub genre_slugs: Vec<GenreSlug>,
    pub director_aggregate: Option<f64>,
    pub writer_aggregate: Option<f64>,
    pub cast_aggregate: Vec<f64>,
    pub custom_scalars: HashMap<String, AttributeValue>,
}

/// Embedding provenance: which model and chunk recipe produced a vector, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingProvenance {
    pub model_id: String,
    pub chunk_recipe_id: String,
    pub produced_at: DateTime<Utc>,
}

/// Per-item vector + metadata pointer + provenance (owned exclusively by IDX).
///
/// Invariant: exactly one current embedding per item; the vector is L2-normalized to
/// within 1e-6 (§8 invariant 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub item_id: ItemId,
    pub vector: Vec<f32>,
    pub provenance: EmbeddingProvenance,
    /// Set when the embedding backend was unreachable at write time; the vector is the
    /// last-known-good one.
    pub stale: bool,
}

/// Named critical voice used by CAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaProfile {
    pub id: String,
    pub display_name: String,
    pub system_preamble: String,
    pub style_constraints: Vec<String>,
    pub forbidden_topics: Vec<String>,
}

/// Key for a reusable generator prefix state in the CAG cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CagCacheKey {
    pub persona_id: Option<String>,
    pub generator_model_id: String,
    pub chunk_recipe_id: String,
    pub normalized_context_fingerprint: String,
}

/// (context fingerprint → reusable prefix state) entry. Bounded by a configured MiB
/// ceiling; LRU-evicted. Owned exclusively by CAG.
#[derive(Debug, Clone)]
pub struct CagCacheEntry {
    pub key: CagCacheKey,
    pub prefix_state: Vec<u8>,
    pub size_bytes: u64,
    pub last_used: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_release_year_reads_through_naive_date() {
        let item = Item {
            id: "i1".into(),
            kind: ItemKind::Film,
            title: "Test".into(),
            original_title: None,
            release_date: NaiveDate::from_ymd_opt(1999, 3, 31),
            runtime_seconds: Some(8160),
            maturity_rating: None,
            popularity: 0.0,
            external_rating: Some(8.7),
            external_vote_count: 100,
            personal_rating: None,
            language: Some("en".into()),
            overview: String::new(),
            tagline: None,
            poster_ref: None,
            backdrop_ref: None,
            status: "released".into(),
            custom_attributes: HashMap::new(),
        };
        assert_eq!(item.release_year(), Some(1999));
    }
}
