//! CR — Criteria Ranker (§4.3).
//!
//! The algorithmic centerpiece: given a candidate set of [`ScoringProfile`]s and a
//! [`CriteriaConfig`], produce a deterministic `[0,1]` match score per item plus a
//! breakdown and matched-criteria set. Per §9, criteria are modeled as a closed sum type
//! with one trait-like capability (`evaluate`), and a `CriteriaConfig` is pre-compiled into
//! a fixed evaluator plan so the hot scoring loop never does dynamic field-name lookup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CR_SCORE_EPSILON, DEFAULT_CAST_SCORE_TOP_N, DEFAULT_CR_PREFILTER_THRESHOLD,
    MATCHED_CRITERION_THRESHOLD,
};
use crate::errors::CoreError;
use crate::model::{AttributeValue, ItemId, ScoringProfile};

// ============================================================================
// CriteriaConfig — closed sum type of criterion kinds
// ============================================================================

/// Genre-match mode for the `genre` criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenreMatchMode {
    Any,
    All,
}

impl Default for GenreMatchMode {
    fn default() -> Self {
        Self::Any
    }
}

/// How a `custom.<name>` criterion should be evaluated, chosen from the scalar's shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomCriterionShape {
    Range { min: Option<f64>, max: Option<f64> },
    Equals { value: String },
    /// Set overlap, evaluated with Jaccard per the Open-Question decision in SPEC_FULL.md.
    Overlap { values: Vec<String> },
}

/// One recognized criterion kind, enumerated per the §4.3 table. Every variant carries its
/// own `weight` and `must` flag (the Open-Question decision: `must` is always explicit,
/// never inferred from `weight == 1.0`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Criterion {
    Genre {
        weight: f64,
        #[serde(default)]
        must: bool,
        values: Vec<String>,
        #[serde(default)]
        mode: GenreMatchMode,
    },
    MinRating {
        weight: f64,
        #[serde(default)]
        must: bool,
        value: f64,
    },
    MaxRating {
        weight: f64,
        #[serde(default)]
        must: bool,
        value: f64,
    },
    Runtime {
        weight: f64,
        #[serde(default)]
        must: bool,
        min: Option<u32>,
        max: Option<u32>,
        #[serde(default = "default_runtime_shoulder_seconds")]
        shoulder_seconds: u32,
    },
    ReleaseYear {
        weight: f64,
        #[serde(default)]
        must: bool,
        min: Option<i32>,
        max: Option<i32>,
        #[serde(default = "default_year_shoulder")]
        shoulder_years: i32,
    },
    MaturityRating {
        weight: f64,
        #[serde(default)]
        must: bool,
        values: Vec<String>,
    },
    Language {
        weight: f64,
        #[serde(default)]
        must: bool,
        values: Vec<String>,
    },
    DirectorScore {
        weight: f64,
        #[serde(default)]
        must: bool,
        min: f64,
    },
    ScreenwriterScore {
        weight: f64,
        #[serde(default)]
        must: bool,
        min: f64,
    },
    CastScore {
        weight: f64,
        #[serde(default)]
        must: bool,
        min: f64,
        #[serde(default = "default_cast_top_n")]
        top_n: usize,
    },
    Popularity {
        weight: f64,
        #[serde(default)]
        must: bool,
        min: Option<f64>,
        /// Normalization ceiling; popularity is divided by this and clamped to `[0,1]`.
        #[serde(default = "default_popularity_ceiling")]
        ceiling: f64,
    },
    Custom {
        weight: f64,
        #[serde(default)]
        must: bool,
        name: String,
        shape: CustomCriterionShape,
    },
}

fn default_runtime_shoulder_seconds() -> u32 {
    900
}
fn default_year_shoulder() -> i32 {
    3
}
fn default_cast_top_n() -> usize {
    DEFAULT_CAST_SCORE_TOP_N
}
fn default_popularity_ceiling() -> f64 {
    100.0
}

impl Criterion {
    fn weight(&self) -> f64 {
        match self {
            Criterion::Genre { weight, .. }
            | Criterion::MinRating { weight, .. }
            | Criterion::MaxRating { weight, .. }
            | Criterion::Runtime { weight, .. }
            | Criterion::ReleaseYear { weight, .. }
            | Criterion::MaturityRating { weight, .. }
            | Criterion::Language { weight, .. }
            | Criterion::DirectorScore { weight, .. }
            | Criterion::ScreenwriterScore { weight, .. }
            | Criterion::CastScore { weight, .. }
            | Criterion::Popularity { weight, .. }
            | Criterion::Custom { weight, .. } => *weight,
        }
    }

    fn must(&self) -> bool {
        match self {
            Criterion::Genre { must, .. }
            | Criterion::MinRating { must, .. }
            | Criterion::MaxRating { must, .. }
            | Criterion::Runtime { must, .. }
            | Criterion::ReleaseYear { must, .. }
            | Criterion::MaturityRating { must, .. }
            | Criterion::Language { must, .. }
            | Criterion::DirectorScore { must, .. }
            | Criterion::ScreenwriterScore { must, .. }
            | Criterion::CastScore { must, .. }
            | Criterion::Popularity { must, .. }
            | Criterion::Custom { must, .. } => *must,
        }
    }

    fn name(&self) -> String {
        match self {
            Criterion::Genre { .. } => "genre".to_string(),
            Criterion::MinRating { .. } => "min_rating".to_string(),
            Criterion::MaxRating { .. } => "max_rating".to_string(),
            Criterion::Runtime { .. } => "runtime".to_string(),
            Criterion::ReleaseYear { .. } => "release_year".to_string(),
            Criterion::MaturityRating { .. } => "maturity_rating".to_string(),
            Criterion::Language { .. } => "language".to_string(),
            Criterion::DirectorScore { .. } => "director_score".to_string(),
            Criterion::ScreenwriterScore { .. } => "screenwriter_score".to_string(),
            Criterion::CastScore { .. } => "cast_score".to_string(),
            Criterion::Popularity { .. } => "popularity".to_string(),
            Criterion::Custom { name, .. } => format!("custom.{name}"),
        }
    }

    /// The trait-like capability from §9: evaluate a profile, returning `None` when the
    /// criterion's data is absent for this item (the "neutral" case).
    fn evaluate(&self, profile: &ScoringProfile) -> Option<f64> {
        match self {
            Criterion::Genre { values, mode, .. } => {
                if values.is_empty() {
                    return None;
                }
                let item_genres: std::collections::HashSet<&str> =
                    profile.genre_slugs.iter().map(String::as_str).collect();
                let matched = values.iter().filter(|v| item_genres.contains(v.as_str())).count();
                let hit = match mode {
                    GenreMatchMode::Any => matched > 0,
                    GenreMatchMode::All => matched == values.len(),
                };
                Some(if hit { 1.0 } else { 0.0 })
            }
            Criterion::MinRating { value, .. } => {
                profile.external_rating.map(|r| linear_threshold(r, *value, true))
            }
            Criterion::MaxRating { value, .. } => {
                profile.external_rating.map(|r| linear_threshold(r, *value, false))
            }
            Criterion::Runtime { min, max, shoulder_seconds, .. } => {
                profile.runtime_seconds.map(|rt| {
                    window_score(rt as f64, min.map(|v| v as f64), max.map(|v| v as f64), *shoulder_seconds as f64)
                })
            }
            Criterion::ReleaseYear { min, max, shoulder_years, .. } => {
                profile.release_year.map(|y| {
                    window_score(y as f64, min.map(|v| v as f64), max.map(|v| v as f64), *shoulder_years as f64)
                })
            }
            Criterion::MaturityRating { values, .. } => profile.maturity_rating.as_ref().map(|m| {
                if values.iter().any(|v| v == m) {
                    1.0
                } else {
                    0.0
                }
            }),
            Criterion::Language { values, .. } => profile.language.as_ref().map(|l| {
                if values.iter().any(|v| v == l) {
                    1.0
                } else {
                    0.0
                }
            }),
            Criterion::DirectorScore { min, .. } => {
                profile.director_aggregate.map(|d| linear_threshold(d, *min, true))
            }
            Criterion::ScreenwriterScore { min, .. } => {
                profile.writer_aggregate.map(|w| linear_threshold(w, *min, true))
            }
            Criterion::CastScore { min, top_n, .. } => {
                if profile.cast_aggregate.is_empty() {
                    return None;
                }
                let mut sorted = profile.cast_aggregate.clone();
                sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
                let n = (*top_n).max(1).min(sorted.len());
                let mean = sorted[..n].iter().sum::<f64>() / n as f64;
                Some(linear_threshold(mean, *min, true))
            }
            Criterion::Popularity { min, ceiling, .. } => Some(match min {
                Some(min) => linear_threshold(profile.popularity, *min, true),
                None => (profile.popularity / ceiling.max(f64::EPSILON)).clamp(0.0, 1.0),
            }),
            Criterion::Custom { name, shape, .. } => evaluate_custom(profile, name, shape),
        }
    }
}

/// Linear ramp from 0 at `threshold - 1` to 1 at `threshold + 1` (0.5 at the threshold
/// itself), per the `min_rating`/`max_rating`/`director_score`/`screenwriter_score`/
/// `cast_score`/`popularity` shapes.
fn linear_threshold(value: f64, threshold: f64, rising: bool) -> f64 {
    let delta = if rising { value - threshold } else { threshold - value };
    (delta / 2.0 + 0.5).clamp(0.0, 1.0)
}

/// 1 inside `[min,max]`, linear decay of `shoulder` width outside either bound.
fn window_score(value: f64, min: Option<f64>, max: Option<f64>, shoulder: f64) -> f64 {
    let shoulder = shoulder.max(f64::EPSILON);
    if let Some(min) = min {
        if value < min {
            return (1.0 - (min - value) / shoulder).clamp(0.0, 1.0);
        }
    }
    if let Some(max) = max {
        if value > max {
            return (1.0 - (value - max) / shoulder).clamp(0.0, 1.0);
        }
    }
    1.0
}

fn jaccard(a: &std::collections::HashSet<&str>, b: &std::collections::HashSet<&str>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count().max(1);
    intersection as f64 / union as f64
}

fn evaluate_custom(profile: &ScoringProfile, name: &str, shape: &CustomCriterionShape) -> Option<f64> {
    let attr = profile.custom_scalars.get(name)?;
    match (attr, shape) {
        (AttributeValue::Number(n), CustomCriterionShape::Range { min, max }) => {
            Some(window_score(*n, *min, *max, 1.0))
        }
        (AttributeValue::Text(t), CustomCriterionShape::Equals { value }) => {
            Some(if t == value { 1.0 } else { 0.0 })
        }
        (AttributeValue::TextArray(arr), CustomCriterionShape::Overlap { values }) => {
            let a: std::collections::HashSet<&str> = arr.iter().map(String::as_str).collect();
            let b: std::collections::HashSet<&str> = values.iter().map(String::as_str).collect();
            Some(jaccard(&a, &b))
        }
        (AttributeValue::Bool(b), CustomCriterionShape::Equals { value }) => {
            Some(if (*b).to_string() == *value { 1.0 } else { 0.0 })
        }
        _ => None,
    }
}

/// A named, immutable-on-use CR configuration snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriteriaConfig {
    pub criteria: Vec<Criterion>,
}

impl CriteriaConfig {
    /// Reject malformed config at the call boundary: unknown criterion (impossible given
    /// the closed enum, kept for forward-compat with a `custom.*` empty-name case),
    /// negative/non-finite weight.
    pub fn validate(&self) -> Result<(), CoreError> {
        for criterion in &self.criteria {
            let w = criterion.weight();
            if !w.is_finite() || w < 0.0 {
                return Err(CoreError::InvalidWeight {
                    criterion: criterion.name(),
                    value: w,
                });
            }
            if let Criterion::Custom { name, .. } = criterion {
                if name.is_empty() || !name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
                    return Err(CoreError::UnknownAttributeTag(name.clone()));
                }
            }
        }
        Ok(())
    }

    /// Pre-compile into a fixed evaluator plan. Since `Criterion::evaluate` already
    /// dispatches on the closed sum type with no dynamic lookup, "compiling" here means
    /// validating once and handing back a plan object that owns the (already-parsed)
    /// criteria list — avoiding re-validation per item in the hot loop.
    pub fn compile(&self) -> Result<EvaluatorPlan, CoreError> {
        self.validate()?;
        Ok(EvaluatorPlan {
            criteria: self.criteria.clone(),
        })
    }
}

/// A validated, ready-to-score `CriteriaConfig`.
#[derive(Debug, Clone)]
pub struct EvaluatorPlan {
    criteria: Vec<Criterion>,
}

/// Per-item CR output: final score, per-criterion breakdown, and matched-criteria set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item_id: ItemId,
    pub score: f64,
    pub breakdown: HashMap<String, f64>,
    pub matched_criteria: Vec<String>,
    pub no_applicable_criteria: bool,
}

/// Full ranking result for one `rank()` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingResult {
    pub items: Vec<ScoredItem>,
    pub candidates_considered: usize,
}

impl EvaluatorPlan {
    /// Score and rank a candidate set. Pure, deterministic, `O(N·K)`, no suspension points
    /// and no global mutation per §5.
    pub fn rank(&self, profiles: &[ScoringProfile]) -> RankingResult {
        let candidates_considered = profiles.len();

        // Hard-filter stage: items failing a `must` criterion never reach scoring.
        let survivors: Vec<&ScoringProfile> = profiles
            .iter()
            .filter(|profile| {
                self.criteria.iter().all(|c| {
                    if !c.must() {
                        return true;
                    }
                    match c.evaluate(profile) {
                        Some(s) => s >= MATCHED_CRITERION_THRESHOLD,
                        None => false,
                    }
                })
            })
            .collect();

        let mut items: Vec<ScoredItem> = survivors
            .into_iter()
            .map(|profile| self.score_one(profile))
            .collect();

        items.sort_by(|a, b| tie_break_ordering(a, b, profiles));

        RankingResult {
            items,
            candidates_considered,
        }
    }

    fn score_one(&self, profile: &ScoringProfile) -> ScoredItem {
        let mut breakdown = HashMap::with_capacity(self.criteria.len());
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        let mut matched = Vec::new();

        for criterion in &self.criteria {
            if let Some(s) = criterion.evaluate(profile) {
                let name = criterion.name();
                let w = criterion.weight();
                numerator += w * s;
                denominator += w;
                if s >= MATCHED_CRITERION_THRESHOLD {
                    matched.push(name.clone());
                }
                breakdown.insert(name, s);
            }
        }

        let no_applicable_criteria = breakdown.is_empty();
        let score = if no_applicable_criteria {
            0.0
        } else {
            numerator / denominator.max(CR_SCORE_EPSILON)
        };

        ScoredItem {
            item_id: profile.item_id.clone(),
            score,
            breakdown,
            matched_criteria: matched,
            no_applicable_criteria,
        }
    }

    /// Whether the catalog size requires pre-filtering via genre/kind indexes before
    /// scoring, per §4.3's performance contract.
    pub fn requires_prefilter(candidate_count: usize, threshold: Option<usize>) -> bool {
        candidate_count > threshold.unwrap_or(DEFAULT_CR_PREFILTER_THRESHOLD)
    }
}

fn tie_break_ordering(a: &ScoredItem, b: &ScoredItem, profiles: &[ScoringProfile]) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal) {
        Ordering::Equal => {
            let pa = profiles.iter().find(|p| p.item_id == a.item_id);
            let pb = profiles.iter().find(|p| p.item_id == b.item_id);
            let rating_a = pa.and_then(|p| p.external_rating).unwrap_or(f64::MIN);
            let rating_b = pb.and_then(|p| p.external_rating).unwrap_or(f64::MIN);
            match rating_b.partial_cmp(&rating_a).unwrap_or(Ordering::Equal) {
                Ordering::Equal => {
                    let year_a = pa.and_then(|p| p.release_year).unwrap_or(i32::MIN);
                    let year_b = pb.and_then(|p| p.release_year).unwrap_or(i32::MIN);
                    match year_b.cmp(&year_a) {
                        Ordering::Equal => a.item_id.cmp(&b.item_id),
                        other => other,
                    }
                }
                other => other,
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemKind;
    use std::collections::HashMap as Map;

    fn profile(id: &str, genre: &[&str], rating: f64, year: i32, runtime: u32, director: f64) -> ScoringProfile {
        ScoringProfile {
            item_id: id.to_string(),
            kind: ItemKind::Film,
            release_year: Some(year),
            runtime_seconds: Some(runtime),
            maturity_rating: Some("PG-13".into()),
            language: Some("en".into()),
            external_rating: Some(rating),
            personal_rating: None,
            popularity: 50.0,
            genre_slugs: genre.iter().map(|s| s.to_string()).collect(),
            director_aggregate: Some(director),
            writer_aggregate: None,
            cast_aggregate: vec![],
            custom_scalars: Map::new(),
        }
    }

    /// Scenario A from §8: sci-fi preset ranking.
    #[test]
    fn scenario_a_scifi_preset_ranking() {
        let i1 = profile("I1", &["sci-fi"], 8.7, 1999, 8160, 8.0);
        let i2 = profile("I2", &["sci-fi", "noir"], 8.1, 1982, 7020, 8.5);
        let i3 = profile("I3", &["anime", "sci-fi"], 8.6, 1998, 1560, 7.2);

        let config = CriteriaConfig {
            criteria: vec![
                Criterion::Genre {
                    weight: 1.0,
                    must: false,
                    values: vec!["sci-fi".into()],
                    mode: GenreMatchMode::Any,
                },
                Criterion::MinRating {
                    weight: 0.8,
                    must: false,
                    value: 7.5,
                },
                Criterion::DirectorScore {
                    weight: 0.7,
                    must: false,
                    min: 7.5,
                },
            ],
        };
        let plan = config.compile().unwrap();
        let result = plan.rank(&[i1, i2, i3]);
        let order: Vec<&str> = result.items.iter().map(|i| i.item_id.as_str()).collect();
        assert_eq!(order, vec!["I2", "I1", "I3"]);
        for item in &result.items {
            assert!(item.score > 0.0 && item.score < 1.0);
            assert_eq!(item.breakdown.len(), 3);
        }
    }

    /// Scenario F from §8: missing data neutralizes a criterion.
    #[test]
    fn scenario_f_missing_language_is_neutralized() {
        let mut i4 = profile("I4", &["drama"], 7.0, 2005, 6000, 6.0);
        i4.language = None;

        let config = CriteriaConfig {
            criteria: vec![
                Criterion::Language {
                    weight: 0.5,
                    must: false,
                    values: vec!["en".into()],
                },
                Criterion::MinRating {
                    weight: 1.0,
                    must: false,
                    value: 5.0,
                },
            ],
        };
        let plan = config.compile().unwrap();
        let result = plan.rank(&[i4]);
        let scored = &result.items[0];
        assert!(!scored.breakdown.contains_key("language"));
        assert_eq!(scored.breakdown.len(), 1);
        // score should equal the min_rating-only contribution since language is excluded
        // from both numerator and denominator.
        assert!((scored.score - scored.breakdown["min_rating"]).abs() < 1e-9);
    }

    #[test]
    fn zero_active_criteria_scores_zero_and_flags() {
        let mut i = profile("I5", &[], 5.0, 2000, 5000, 5.0);
        i.external_rating = None;
        i.director_aggregate = None;

        let config = CriteriaConfig {
            criteria: vec![
                Criterion::MinRating {
                    weight: 1.0,
                    must: false,
                    value: 5.0,
                },
                Criterion::DirectorScore {
                    weight: 1.0,
                    must: false,
                    min: 5.0,
                },
            ],
        };
        let plan = config.compile().unwrap();
        let result = plan.rank(&[i]);
        assert_eq!(result.items[0].score, 0.0);
        assert!(result.items[0].no_applicable_criteria);
    }

    #[test]
    fn must_filter_removes_items_before_scoring() {
        let matches = profile("M1", &["sci-fi"], 9.0, 2000, 5000, 5.0);
        let fails = profile("M2", &["drama"], 9.0, 2000, 5000, 5.0);

        let config = CriteriaConfig {
            criteria: vec![Criterion::Genre {
                weight: 1.0,
                must: true,
                values: vec!["sci-fi".into()],
                mode: GenreMatchMode::Any,
            }],
        };
        let plan = config.compile().unwrap();
        let result = plan.rank(&[matches, fails]);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].item_id, "M1");
        assert_eq!(result.candidates_considered, 2);
    }

    #[test]
    fn weight_zero_contributes_nothing() {
        let i = profile("I6", &["drama"], 3.0, 2000, 5000, 2.0);
        let config = CriteriaConfig {
            criteria: vec![
                Criterion::MinRating {
                    weight: 0.0,
                    must: false,
                    value: 9.0,
                },
                Criterion::Genre {
                    weight: 1.0,
                    must: false,
                    values: vec!["drama".into()],
                    mode: GenreMatchMode::Any,
                },
            ],
        };
        let plan = config.compile().unwrap();
        let result = plan.rank(&[i]);
        // min_rating would score very low at rating=3 vs threshold=9, but weight=0 means it
        // cannot drag the final score down at all; genre=drama matches fully.
        assert_eq!(result.items[0].score, 1.0);
    }

    #[test]
    fn empty_candidate_set_returns_empty_with_zero_considered() {
        let config = CriteriaConfig {
            criteria: vec![Criterion::Popularity {
                weight: 1.0,
                must: false,
                min: None,
                ceiling: 100.0,
            }],
        };
        let plan = config.compile().unwrap();
        let result = plan.rank(&[]);
        assert!(result.items.is_empty());
        assert_eq!(result.candidates_considered, 0);
    }

    #[test]
    fn invalid_negative_weight_is_rejected() {
        let config = CriteriaConfig {
            criteria: vec![Criterion::Popularity {
                weight: -1.0,
                must: false,
                min: None,
                ceiling: 100.0,
            }],
        };
        assert!(config.compile().is_err());
    }

    #[test]
    fn custom_array_criterion_uses_jaccard_overlap() {
        let mut i = profile("I7", &["drama"], 7.0, 2000, 5000, 5.0);
        i.custom_scalars.insert(
            "mood".to_string(),
            AttributeValue::TextArray(vec!["gritty".into(), "slow".into()]),
        );
        let config = CriteriaConfig {
            criteria: vec![Criterion::Custom {
                weight: 1.0,
                must: false,
                name: "mood".into(),
                shape: CustomCriterionShape::Overlap {
                    values: vec!["gritty".into(), "fast".into()],
                },
            }],
        };
        let plan = config.compile().unwrap();
        let result = plan.rank(&[i]);
        // intersection={gritty}=1, union={gritty,slow,fast}=3 -> 1/3
        assert!((result.items[0].score - (1.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn tie_break_order_is_rating_then_year_then_id() {
        let a = profile("B", &["drama"], 8.0, 2010, 5000, 5.0);
        let b = profile("A", &["drama"], 8.0, 2010, 5000, 5.0);
        let config = CriteriaConfig {
            criteria: vec![Criterion::Genre {
                weight: 1.0,
                must: false,
                values: vec!["drama".into()],
                mode: GenreMatchMode::Any,
            }],
        };
        let plan = config.compile().unwrap();
        let result = plan.rank(&[a, b]);
        // identical score, rating, year -> lexicographic id ascending
        assert_eq!(result.items[0].item_id, "A");
        assert_eq!(result.items[1].item_id, "B");
    }
}
