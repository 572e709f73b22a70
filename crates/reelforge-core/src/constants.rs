//! Common constants used throughout reelforge-core.

// ============================================================================
// Home / config paths
// ============================================================================

/// The name of the global reelforge configuration directory, located at `~/.reelforge/`.
pub const REELFORGE_HOME_DIR: &str = ".reelforge";

/// The name of the global configuration file within [`REELFORGE_HOME_DIR`].
pub const GLOBAL_CONFIG_FILENAME: &str = "config.yaml";

/// The name of the catalog/workspace-level configuration override file.
pub const CATALOG_CONFIG_FILENAME: &str = "reelforge.yaml";

/// The directory (within [`REELFORGE_HOME_DIR`]) the CAG cache is stored in.
pub const CAG_CACHE_DIR_NAME: &str = "cag-cache";

/// Filename of the persisted provenance ledger (chunk-recipe-id/model-id → indexed count).
pub const PROVENANCE_LEDGER_FILENAME: &str = "provenance.json";

// ============================================================================
// IDX defaults
// ============================================================================

/// Version id of the canonical chunk recipe described in §4.1. Bump whenever the recipe's
/// field order or composition changes; a change forces reindex everywhere.
pub const DEFAULT_CHUNK_RECIPE_ID: &str = "v1";

/// Maximum number of top-billed cast names folded into the canonical chunk.
pub const CHUNK_MAX_CAST_NAMES: usize = 8;

/// Maximum number of deduped review tags folded into the canonical chunk.
pub const CHUNK_MAX_REVIEW_TAGS: usize = 16;

// ============================================================================
// SIM defaults
// ============================================================================

/// Default `τ_years` for `era_affinity`.
pub const DEFAULT_ERA_TAU_YEARS: f64 = 10.0;

/// Tolerance for the "scores equal" tie-break condition in §4.2/§4.3.
pub const SCORE_TIE_EPSILON: f64 = 1e-6;

// ============================================================================
// CR defaults
// ============================================================================

/// Denominator floor `ε` from the CR scoring formula in §4.3.
pub const CR_SCORE_EPSILON: f64 = 1e-9;

/// Candidate-count threshold `T` above which CR must pre-filter using genre/kind indexes.
pub const DEFAULT_CR_PREFILTER_THRESHOLD: usize = 50_000;

/// Matched-criteria threshold: a criterion is reported in `matched_criteria` when its score
/// is at least this value.
pub const MATCHED_CRITERION_THRESHOLD: f64 = 0.6;

/// Default `N` for `cast_score`'s "mean of top-N cast aggregates".
pub const DEFAULT_CAST_SCORE_TOP_N: usize = 3;

// ============================================================================
// CAG defaults
// ============================================================================

/// Default candidate pool cap for a generation request's pre-filter stage.
pub const DEFAULT_CAG_CANDIDATE_POOL_CAP: usize = 500;

/// Default number of retained context items after SIM retrieval ("top *M*").
pub const DEFAULT_CAG_RETRIEVAL_TOP_M: usize = 12;

/// Default CAG cache size ceiling, in MiB.
pub const DEFAULT_CAG_CACHE_CEILING_MIB: u64 = 256;

/// Reasons threshold: a hybrid-score term is surfaced in `reasons` when its contribution is
/// at least this value.
pub const SIM_REASON_CONTRIBUTION_THRESHOLD: f64 = 0.15;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsilons_are_small_and_positive() {
        assert!(CR_SCORE_EPSILON > 0.0 && CR_SCORE_EPSILON < 1e-6);
        assert!(SCORE_TIE_EPSILON > 0.0 && SCORE_TIE_EPSILON < 1e-4);
    }
}
