//! SIM — Retriever (§4.2).
//!
//! Hybrid k-nearest search: embedding similarity combined with metadata affinity terms.
//! All vectors are assumed L2-normalized by IDX (§8 invariant 1); SIM does not renormalize.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::collaborators::{CatalogFilter, Embedder, VectorStore};
use crate::config::SimWeights;
use crate::constants::{SCORE_TIE_EPSILON, SIM_REASON_CONTRIBUTION_THRESHOLD};
use crate::errors::CoreError;
use crate::model::{ItemId, ScoringProfile};

/// Either an item id (use its stored embedding) or free text (embed on demand).
#[derive(Debug, Clone)]
pub enum Probe {
    Item(ItemId),
    Text(String),
}

/// Named terms of the hybrid score, used both for the breakdown and for `reasons`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTerm {
    Vector,
    GenreOverlap,
    PeopleOverlap,
    EraAffinity,
    RatingAffinity,
}

impl ScoreTerm {
    fn label(&self) -> &'static str {
        match self {
            ScoreTerm::Vector => "vector",
            ScoreTerm::GenreOverlap => "genre_overlap",
            ScoreTerm::PeopleOverlap => "people_overlap",
            ScoreTerm::EraAffinity => "era_affinity",
            ScoreTerm::RatingAffinity => "rating_affinity",
        }
    }
}

/// A probe-side profile summary SIM needs to score candidates against.
#[derive(Debug, Clone)]
pub struct ProbeProfile {
    pub genre_slugs: Vec<String>,
    pub creator_ids: Vec<String>,
    pub release_year: Option<i32>,
    pub external_rating: Option<f64>,
}

/// One SIM hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarHit {
    pub item_id: ItemId,
    pub score: f64,
    pub breakdown: std::collections::HashMap<String, f64>,
    pub reasons: Vec<String>,
    /// Carried only to implement the tie-break order; not part of the public score.
    #[serde(skip)]
    pub(crate) external_rating: Option<f64>,
    #[serde(skip)]
    pub(crate) release_year: Option<i32>,
}

/// `nearest()`'s overall result, including the §4.2 edge-case flags.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SimResult {
    pub hits: Vec<SimilarHit>,
    pub undersized: bool,
    /// Set when the probe's served embedding provenance (chunk recipe id / model id)
    /// doesn't match the currently configured ones (§7 `Stale`). SIM still serves the
    /// result; the caller is responsible for scheduling a reindex.
    pub stale: bool,
}

/// `era_affinity(a,b) = exp(-|a-b|/τ_years)`.
pub fn era_affinity(a: i32, b: i32, tau_years: f64) -> f64 {
    let diff = (a - b).unsigned_abs() as f64;
    (-diff / tau_years.max(f64::EPSILON)).exp()
}

/// `rating_affinity(a,b) = 1 - |a-b|/10`, clamped to 0.
pub fn rating_affinity(a: f64, b: f64) -> f64 {
    (1.0 - (a - b).abs() / 10.0).max(0.0)
}

/// `overlap(A,B) = |A∩B| / max(1, min(|A|,|B|))`.
pub fn overlap(a: &HashSet<&str>, b: &HashSet<&str>) -> f64 {
    let intersection = a.intersection(b).count();
    let denom = a.len().min(b.len()).max(1);
    intersection as f64 / denom as f64
}

/// The SIM retriever. Generic over the collaborator traits it's given so it can be tested
/// with in-memory doubles ([`crate::testing`]) and run for real against
/// `reelforge-db`/`reelforge-model` backends.
pub struct Retriever<'a> {
    pub embedder: &'a dyn Embedder,
    pub vector_store: &'a dyn VectorStore,
    pub era_tau_years: f64,
}

impl<'a> Retriever<'a> {
    /// `nearest(probe, k, filters, weights)` from §4.2.
    ///
    /// `probe_stale` is the caller's pre-computed answer to "does the probe's served
    /// embedding provenance match the current chunk-recipe/model ids" (§7 `Stale`); SIM
    /// itself has no access to the configured ids and just carries the flag into the result.
    pub async fn nearest(
        &self,
        probe_vector: Option<Vec<f32>>,
        probe_profile: &ProbeProfile,
        k: usize,
        filters: &CatalogFilter,
        weights: &SimWeights,
        probe_stale: bool,
        candidate_profiles: impl Fn(&ItemId) -> Option<ScoringProfile>,
    ) -> Result<SimResult, CoreError> {
        // §4.2: "Probe has no embedding → return empty and signal NotIndexed."
        let probe_vector = match probe_vector {
            Some(v) => v,
            None => return Err(CoreError::NotIndexed("probe".to_string())),
        };

        let hits = self
            .vector_store
            .query(&probe_vector, k.max(1) * 4, filters)
            .await?;

        let mut scored: Vec<SimilarHit> = hits
            .into_iter()
            .filter_map(|hit| {
                let profile = candidate_profiles(&hit.item_id)?;
                Some(self.score_candidate(&hit.item_id, hit.cosine as f64, probe_profile, &profile, weights))
            })
            .collect();

        scored.sort_by(|a, b| tie_break(a, b));
        let undersized = scored.len() < k;
        scored.truncate(k);

        Ok(SimResult {
            hits: scored,
            undersized,
            stale: probe_stale,
        })
    }

    fn score_candidate(
        &self,
        item_id: &ItemId,
        cosine: f64,
        probe: &ProbeProfile,
        candidate: &ScoringProfile,
        weights: &SimWeights,
    ) -> SimilarHit {
        let probe_genres: HashSet<&str> = probe.genre_slugs.iter().map(String::as_str).collect();
        let candidate_genres: HashSet<&str> =
            candidate.genre_slugs.iter().map(String::as_str).collect();
        let genre_overlap = overlap(&probe_genres, &candidate_genres);

        // `overlap(creators_p, creators_c)` is computed over the probe's creator-id set and
        // the candidate's directors+writers (cast_aggregate carries scores, not ids, so
        // people overlap only uses the ids the candidate ScoringProfile exposes via its
        // custom_scalars["creator_ids"] set by IDX).
        let candidate_creator_ids: HashSet<&str> = candidate
            .custom_scalars
            .get("creator_ids")
            .and_then(|v| match v {
                crate::model::AttributeValue::TextArray(arr) => {
                    Some(arr.iter().map(String::as_str).collect())
                }
                _ => None,
            })
            .unwrap_or_default();
        let probe_creator_ids: HashSet<&str> =
            probe.creator_ids.iter().map(String::as_str).collect();
        let people_overlap = overlap(&probe_creator_ids, &candidate_creator_ids);

        let era = match (probe.release_year, candidate.release_year) {
            (Some(a), Some(b)) => era_affinity(a, b, self.era_tau_years),
            _ => 0.0,
        };

        let rating = match (probe.external_rating, candidate.external_rating) {
            (Some(a), Some(b)) => rating_affinity(a, b),
            _ => 0.0,
        };

        let terms = [
            (ScoreTerm::Vector, weights.alpha_vector, cosine),
            (ScoreTerm::GenreOverlap, weights.beta_genre_overlap, genre_overlap),
            (ScoreTerm::PeopleOverlap, weights.gamma_people_overlap, people_overlap),
            (ScoreTerm::EraAffinity, weights.delta_era, era),
            (ScoreTerm::RatingAffinity, weights.epsilon_rating_affinity, rating),
        ];

        let mut breakdown = std::collections::HashMap::with_capacity(terms.len());
        let mut reasons = Vec::new();
        let mut score = 0.0;
        for (term, weight, value) in terms {
            let contribution = weight * value;
            score += contribution;
            breakdown.insert(term.label().to_string(), value);
            if contribution >= SIM_REASON_CONTRIBUTION_THRESHOLD {
                reasons.push(term.label().to_string());
            }
        }

        SimilarHit {
            item_id: item_id.clone(),
            score,
            breakdown,
            reasons,
            external_rating: candidate.external_rating,
            release_year: candidate.release_year,
        }
    }
}

/// Scores equal within [`SCORE_TIE_EPSILON`] break ties by higher external rating, then
/// newer release, then lexicographic id — exactly the order §4.2 specifies.
fn tie_break(a: &SimilarHit, b: &SimilarHit) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    if (a.score - b.score).abs() > SCORE_TIE_EPSILON {
        return b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal);
    }
    let rating_a = a.external_rating.unwrap_or(f64::MIN);
    let rating_b = b.external_rating.unwrap_or(f64::MIN);
    match rating_b.partial_cmp(&rating_a).unwrap_or(Ordering::Equal) {
        Ordering::Equal => {
            let year_a = a.release_year.unwrap_or(i32::MIN);
            let year_b = b.release_year.unwrap_or(i32::MIN);
            match year_b.cmp(&year_a) {
                Ordering::Equal => a.item_id.cmp(&b.item_id),
                other => other,
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn era_affinity_decays_with_distance() {
        assert!((era_affinity(2000, 2000, 10.0) - 1.0).abs() < 1e-9);
        assert!(era_affinity(2000, 1990, 10.0) < era_affinity(2000, 1995, 10.0));
    }

    #[test]
    fn rating_affinity_clamps_to_zero() {
        assert_eq!(rating_affinity(1.0, 9.0), 0.0);
        assert_eq!(rating_affinity(5.0, 5.0), 1.0);
    }

    #[test]
    fn overlap_matches_jaccard_style_min_denominator() {
        let a: HashSet<&str> = ["sci-fi", "noir"].into_iter().collect();
        let b: HashSet<&str> = ["sci-fi"].into_iter().collect();
        assert!((overlap(&a, &b) - 1.0).abs() < 1e-9);
    }

    /// §4.2: "Probe has no embedding → return empty and signal NotIndexed." A caller that
    /// can't supply a probe vector (nothing upstream resolved one) must see that signal
    /// rather than a silently-empty, successful result.
    #[tokio::test]
    async fn nearest_signals_not_indexed_when_probe_has_no_vector() {
        use crate::testing::{FakeEmbedder, FakeVectorStore};

        let embedder = FakeEmbedder::new(8);
        let vector_store = FakeVectorStore::new();
        let retriever = Retriever {
            embedder: &embedder,
            vector_store: &vector_store,
            era_tau_years: 10.0,
        };
        let probe_profile = ProbeProfile {
            genre_slugs: vec![],
            creator_ids: vec![],
            release_year: None,
            external_rating: None,
        };
        let result = retriever
            .nearest(
                None,
                &probe_profile,
                5,
                &CatalogFilter::default(),
                &crate::config::SimWeights::default(),
                false,
                |_: &ItemId| None,
            )
            .await;
        assert!(matches!(result, Err(CoreError::NotIndexed(_))));
    }

    #[test]
    fn overlap_empty_sets_is_zero_not_nan() {
        let a: HashSet<&str> = HashSet::new();
        let b: HashSet<&str> = HashSet::new();
        assert_eq!(overlap(&a, &b), 0.0);
    }

    #[test]
    fn tie_break_falls_back_to_lexicographic_id() {
        let a = SimilarHit {
            item_id: "b".into(),
            score: 0.5,
            breakdown: Default::default(),
            reasons: vec![],
            external_rating: None,
            release_year: None,
        };
        let b = SimilarHit {
            item_id: "a".into(),
            score: 0.5 + 1e-9,
            breakdown: Default::default(),
            reasons: vec![],
            external_rating: None,
            release_year: None,
        };
        assert_eq!(tie_break(&a, &b), std::cmp::Ordering::Less);
    }
}
