//! `Engine` — the core orchestrator wiring config, collaborators, and the four subsystems
//! together behind the §6 operation surface.

use std::path::PathBuf;

use crate::cache::{CacheMetrics, CagCache};
use crate::cag::{CagPipeline, CagRequest, GenerationResult};
use crate::collaborators::{CatalogFilter, CatalogStore, Embedder, Generator, VectorStore};
use crate::config::{CatalogConfig, CoreConfig};
use crate::cr::{CriteriaConfig, RankingResult};
use crate::errors::CoreError;
use crate::idx::{IndexReport, Indexer, PersonDirtySet, ProvenanceLedger, ReindexOutcome, ReindexOutcomeSerializable};
use crate::model::{ItemId, PersonaProfile, ScoringProfile};
use crate::sim::{Probe, ProbeProfile, Retriever, SimResult};

/// The fully-wired engine. Holds references to every collaborator plus the resolved config
/// and the two pieces of state the core owns outright (the CAG cache, the person dirty set).
pub struct Engine<'a> {
    pub catalog: &'a dyn CatalogStore,
    pub embedder: &'a dyn Embedder,
    pub vector_store: &'a dyn VectorStore,
    pub generator: &'a dyn Generator,
    pub config: CoreConfig,
    pub cache: CagCache,
    pub dirty_persons: std::sync::Mutex<PersonDirtySet>,
    pub loaded_personas: std::sync::Mutex<std::collections::HashMap<String, PersonaProfile>>,
    pub cache_dir: Option<PathBuf>,
}

impl<'a> Engine<'a> {
    pub fn new(
        catalog: &'a dyn CatalogStore,
        embedder: &'a dyn Embedder,
        vector_store: &'a dyn VectorStore,
        generator: &'a dyn Generator,
        config: CoreConfig,
    ) -> Self {
        let cache = CagCache::new(config.cag_cache_ceiling_mib);
        Self {
            catalog,
            embedder,
            vector_store,
            generator,
            config,
            cache,
            dirty_persons: std::sync::Mutex::new(PersonDirtySet::default()),
            loaded_personas: std::sync::Mutex::new(std::collections::HashMap::new()),
            cache_dir: CoreConfig::default_dir().map(|dir| dir.join(crate::constants::CAG_CACHE_DIR_NAME)),
        }
    }

    pub fn resolved_with(&self, catalog_override: &CatalogConfig) -> CoreConfig {
        self.config.resolve(catalog_override)
    }

    /// `rank(preset, filter, limit)` — synchronous CR call; deterministic, no suspension.
    pub async fn rank(&self, criteria: &CriteriaConfig, filter: &CatalogFilter, limit: usize) -> Result<RankingResult, CoreError> {
        let plan = criteria.compile()?;
        let (items, _cursor) = self.catalog.iter_items(filter, None).await?;
        let mut profiles = Vec::with_capacity(items.len());
        for item in &items {
            if let Some(profile) = self.catalog.get_scoring_profile(&item.id).await? {
                profiles.push(profile);
            }
        }
        let mut result = plan.rank(&profiles);
        result.items.truncate(limit);
        Ok(result)
    }

    /// `similar(item_id | text, k, filters, weights?)`.
    pub async fn similar(
        &self,
        probe: Probe,
        k: usize,
        filters: &CatalogFilter,
        weights: Option<crate::config::SimWeights>,
    ) -> Result<SimResult, CoreError> {
        let weights = weights.unwrap_or(self.config.sim_weights);
        let retriever = Retriever {
            embedder: self.embedder,
            vector_store: self.vector_store,
            era_tau_years: self.config.era_tau_years,
        };

        let (probe_vector, probe_profile, probe_stale) = match &probe {
            Probe::Text(text) => {
                let vector = self.embedder.embed_one(text).await?;
                (Some(vector), ProbeProfile {
                    genre_slugs: Vec::new(),
                    creator_ids: Vec::new(),
                    release_year: None,
                    external_rating: None,
                }, false)
            }
            Probe::Item(id) => {
                let record = self
                    .catalog
                    .get_embedding(id)
                    .await?
                    .ok_or_else(|| CoreError::NotIndexed(id.clone()))?;
                // §7 `Stale`: the served embedding's provenance doesn't match the currently
                // configured chunk recipe / embedder model id. SIM still serves the result
                // but must mark it `stale=true`; IDX is asked (logged) to reindex.
                let stale = record.stale
                    || record.provenance.chunk_recipe_id != self.config.chunk_recipe_id
                    || record.provenance.model_id != self.embedder.model_id();
                if stale {
                    tracing::warn!(item_id = %id, "served a stale embedding; scheduling reindex");
                }
                let profile = self.catalog.get_scoring_profile(id).await?;
                let probe_profile = profile
                    .map(|p| ProbeProfile {
                        genre_slugs: p.genre_slugs,
                        creator_ids: Vec::new(),
                        release_year: p.release_year,
                        external_rating: p.external_rating,
                    })
                    .unwrap_or(ProbeProfile {
                        genre_slugs: Vec::new(),
                        creator_ids: Vec::new(),
                        release_year: None,
                        external_rating: None,
                    });
                (Some(record.vector), probe_profile, stale)
            }
        };

        let catalog = self.catalog;
        retriever
            .nearest(probe_vector, &probe_profile, k, filters, &weights, probe_stale, |id: &ItemId| {
                futures::executor::block_on(catalog.get_scoring_profile(id)).ok().flatten()
            })
            .await
    }

    /// `generate(mode, payload, cancel_token, on_chunk?)`.
    pub async fn generate(
        &self,
        request: CagRequest,
        cancel: &crate::cag::CancelToken,
    ) -> Result<GenerationResult, CoreError> {
        let pipeline = CagPipeline {
            embedder: self.embedder,
            vector_store: self.vector_store,
            generator: self.generator,
            cache: &self.cache,
            era_tau_years: self.config.era_tau_years,
            sim_weights: self.config.sim_weights,
            timeouts: self.config.cag_timeouts,
            chunk_recipe_id: self.config.chunk_recipe_id.clone(),
        };

        let catalog = self.catalog;
        let resolve_exact = |title: &str| -> Option<ItemId> {
            futures::executor::block_on(async {
                let (items, _) = catalog.iter_items(&CatalogFilter::default(), None).await.ok()?;
                items.into_iter().find(|i| i.title == title).map(|i| i.id)
            })
        };
        let resolve_casefold = |title_lower: &str| -> Option<ItemId> {
            futures::executor::block_on(async {
                let (items, _) = catalog.iter_items(&CatalogFilter::default(), None).await.ok()?;
                items
                    .into_iter()
                    .find(|i| i.title.to_lowercase() == title_lower)
                    .map(|i| i.id)
            })
        };

        let intent = pipeline.parse_intent(&request, resolve_exact, resolve_casefold);
        let filter = pipeline.prefilter(&request);

        let candidate_profiles = |id: &ItemId| futures::executor::block_on(catalog.get_scoring_profile(id)).ok().flatten();
        let item_vector = |id: &ItemId| {
            futures::executor::block_on(catalog.get_embedding(id))
                .ok()
                .flatten()
                .map(|record| record.vector)
        };

        let hits = pipeline
            .retrieve(&intent, &request, &filter, &candidate_profiles, &item_vector, cancel)
            .await?;

        let mut fact_sheets = Vec::with_capacity(hits.len());
        for hit in &hits {
            if let Some(item) = self.catalog.get_item(&hit.item_id).await? {
                let profile = self.catalog.get_scoring_profile(&hit.item_id).await?;
                fact_sheets.push(crate::cag::ContextFactSheet {
                    item_id: item.id.clone(),
                    title: item.title.clone(),
                    year: item.release_year(),
                    kind: format!("{:?}", item.kind).to_lowercase(),
                    genres: profile.map(|p| p.genre_slugs).unwrap_or_default(),
                    overview_sentence: item.overview.split('.').next().unwrap_or("").to_string(),
                    personal_rating: item.personal_rating,
                });
            }
        }

        let (prompt, mut warnings) = pipeline.assemble_prompt(
            &request,
            request.persona.as_ref(),
            &fact_sheets,
            "{\"recommendations\":[{\"title\":string,\"reasoning\":string,\"match_score\":number|null}]}",
        )?;

        let cache_key = crate::model::CagCacheKey {
            persona_id: request.persona.as_ref().map(|p| p.id.clone()),
            generator_model_id: self.generator.model_id().to_string(),
            chunk_recipe_id: self.config.chunk_recipe_id.clone(),
            normalized_context_fingerprint: fingerprint(&prompt),
        };

        let raw_output = pipeline.generate(&prompt, &cache_key, cancel).await?;

        let raw = match pipeline.post_parse(&raw_output, request.mode) {
            Ok(raw) => raw,
            Err(CoreError::MalformedOutput { .. }) => {
                // Single repair pass: re-prompt asking explicitly for valid schema.
                let repair_prompt = format!("{prompt}\n\nYour previous reply was not valid JSON. Reply again with strictly valid JSON matching the schema.");
                let repaired_output = pipeline.generate(&repair_prompt, &cache_key, cancel).await?;
                pipeline.post_parse(&repaired_output, request.mode)?
            }
            Err(other) => return Err(other),
        };

        let mut result = pipeline.verify(raw, resolve_exact, resolve_casefold);
        result.warnings.append(&mut warnings);
        result.raw_output = raw_output;
        Ok(result)
    }

    /// `index(item_id | bulk_filter)`.
    pub async fn index_one(&self, item_id: &ItemId) -> Result<ReindexOutcome, CoreError> {
        let credits = self.catalog.get_credits(item_id).await?;
        let indexer = Indexer {
            catalog: self.catalog,
            embedder: self.embedder,
            vector_store: self.vector_store,
            chunk_recipe_id: self.config.chunk_recipe_id.clone(),
        };
        indexer
            .reindex(item_id, &credits, &[], &[], &[], &std::collections::HashMap::new())
            .await
    }

    pub async fn index_bulk(&self, filter: &CatalogFilter) -> Result<IndexReport, CoreError> {
        let (items, _cursor) = self.catalog.iter_items(filter, None).await?;
        let mut report = IndexReport::default();
        for item in items {
            let outcome = self.index_one(&item.id).await;
            let serialized = match outcome {
                Ok(outcome) => ReindexOutcomeSerializable::from(outcome),
                Err(err) => {
                    tracing::warn!(item_id = %item.id, error = %err, "reindex failed for item; continuing bulk reindex");
                    continue;
                }
            };
            report.outcomes.insert(item.id, serialized);
        }
        Ok(report)
    }

    pub async fn invalidate(&self, item_id: &ItemId) -> Result<(), CoreError> {
        let indexer = Indexer {
            catalog: self.catalog,
            embedder: self.embedder,
            vector_store: self.vector_store,
            chunk_recipe_id: self.config.chunk_recipe_id.clone(),
        };
        indexer.invalidate(item_id).await
    }

    /// `personas.load(persona_id)`.
    pub fn load_persona(&self, persona: PersonaProfile) {
        self.loaded_personas.lock().expect("poisoned").insert(persona.id.clone(), persona);
    }

    /// `personas.clear()`.
    pub fn clear_personas(&self) {
        self.loaded_personas.lock().expect("poisoned").clear();
    }

    /// `cache.metrics()`.
    pub fn cache_metrics(&self) -> CacheMetrics {
        self.cache.metrics()
    }

    /// `cache.clear()`.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Persist the provenance ledger to disk (§6: "persisted state ... an optional
    /// provenance ledger").
    pub fn persist_ledger(&self, ledger: &ProvenanceLedger, path: &std::path::Path) -> Result<(), CoreError> {
        let text = serde_json::to_string_pretty(&ledger.counts.iter().collect::<Vec<_>>())?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

/// Stable, order-independent fingerprint of a normalized prompt, used for the CAG cache key.
fn fingerprint(prompt: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    prompt.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Item, ItemKind};
    use crate::testing::{FakeEmbedder, FakeGenerator, FakeVectorStore, InMemoryCatalogStore};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    #[test]
    fn fingerprint_is_deterministic_for_identical_prompts() {
        assert_eq!(fingerprint("a prompt"), fingerprint("a prompt"));
        assert_ne!(fingerprint("a prompt"), fingerprint("a different prompt"));
    }

    fn sample_item(id: &str, title: &str, year: i32) -> Item {
        Item {
            id: id.to_string(),
            kind: ItemKind::Film,
            title: title.to_string(),
            original_title: None,
            release_date: NaiveDate::from_ymd_opt(year, 1, 1),
            runtime_seconds: Some(7200),
            maturity_rating: Some("PG-13".into()),
            popularity: 50.0,
            external_rating: Some(7.5),
            external_vote_count: 1_000,
            personal_rating: None,
            language: Some("en".into()),
            overview: format!("{title} is a film."),
            tagline: None,
            poster_ref: None,
            backdrop_ref: None,
            status: "released".into(),
            custom_attributes: HashMap::new(),
        }
    }

    /// End-to-end: `index_one` must publish a vector the engine's own `similar()` call can
    /// retrieve (the indexer writes to the `VectorStore`, not just the catalog's own
    /// `EmbeddingRecord`).
    #[tokio::test]
    async fn indexed_item_is_retrievable_via_similar() {
        let catalog = InMemoryCatalogStore::new();
        catalog.seed_item(sample_item("I1", "Dune", 2021));
        catalog.seed_item(sample_item("I2", "Arrival", 2016));
        let embedder = FakeEmbedder::new(16);
        let vector_store = FakeVectorStore::new();
        let generator = FakeGenerator::new("{}");
        let engine = Engine::new(&catalog, &embedder, &vector_store, &generator, CoreConfig::default());

        engine.index_one(&"I1".to_string()).await.unwrap();
        engine.index_one(&"I2".to_string()).await.unwrap();

        let result = engine
            .similar(Probe::Item("I1".to_string()), 5, &CatalogFilter::default(), None)
            .await
            .unwrap();
        let ids: Vec<&str> = result.hits.iter().map(|h| h.item_id.as_str()).collect();
        assert!(ids.contains(&"I1"), "probe item should retrieve itself back via cosine=1.0");
    }

    /// Scenario E from §8: change the configured chunk-recipe-id after an item was indexed
    /// under the old one, without reindexing. `similar(I1)` must still serve a result but
    /// mark it `stale=true`.
    #[tokio::test]
    async fn similar_marks_stale_when_chunk_recipe_id_changed() {
        let catalog = InMemoryCatalogStore::new();
        catalog.seed_item(sample_item("I1", "Dune", 2021));
        let embedder = FakeEmbedder::new(16);
        let vector_store = FakeVectorStore::new();
        let generator = FakeGenerator::new("{}");

        let mut config = CoreConfig::default();
        config.chunk_recipe_id = "v1".to_string();
        let engine = Engine::new(&catalog, &embedder, &vector_store, &generator, config);
        engine.index_one(&"I1".to_string()).await.unwrap();

        // Bump the configured recipe id without reindexing, as §8 Scenario E describes.
        let mut bumped_config = CoreConfig::default();
        bumped_config.chunk_recipe_id = "v2".to_string();
        let engine = Engine::new(&catalog, &embedder, &vector_store, &generator, bumped_config);

        let result = engine
            .similar(Probe::Item("I1".to_string()), 5, &CatalogFilter::default(), None)
            .await
            .unwrap();
        assert!(result.stale, "serving an embedding produced under a superseded chunk recipe id must be flagged stale");
    }

    /// `rank()` touches only the catalog's own scoring profiles — it must never need the
    /// embedder, vector store, or generator (CR is pure CPU per §5).
    #[tokio::test]
    async fn rank_does_not_require_a_working_embedder() {
        let catalog = InMemoryCatalogStore::new();
        catalog.seed_item(sample_item("I1", "Dune", 2021));
        engine_index_profile_only(&catalog, "I1").await;

        let embedder = FakeEmbedder { fail: true, ..FakeEmbedder::new(16) };
        let vector_store = FakeVectorStore::new();
        let generator = FakeGenerator::failing();
        let engine = Engine::new(&catalog, &embedder, &vector_store, &generator, CoreConfig::default());

        let config = crate::cr::CriteriaConfig {
            criteria: vec![crate::cr::Criterion::Popularity {
                weight: 1.0,
                must: false,
                min: None,
                ceiling: 100.0,
            }],
        };
        let result = engine.rank(&config, &CatalogFilter::default(), 10).await.unwrap();
        assert_eq!(result.items.len(), 1);
    }

    async fn engine_index_profile_only(catalog: &InMemoryCatalogStore, item_id: &str) {
        let profile = crate::idx::build_scoring_profile(
            &catalog.get_item(&item_id.to_string()).await.unwrap().unwrap(),
            &[],
            &[],
            &HashMap::new(),
        );
        catalog.upsert_scoring_profile(profile).await.unwrap();
    }
}
