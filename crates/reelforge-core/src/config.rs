//! Configuration types for reelforge-core.
//!
//! Two layers, resolved in this order: [`CatalogConfig`] (per-catalog/workspace override) >
//! [`CoreConfig`] (user-level, `~/.reelforge/config.yaml`) > hard-coded defaults. Every
//! section exposes `.validate()`, which returns hard errors immediately but collects
//! warnings into a `Vec<String>` instead of failing.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    CATALOG_CONFIG_FILENAME, DEFAULT_CAG_CACHE_CEILING_MIB, DEFAULT_CAG_CANDIDATE_POOL_CAP,
    DEFAULT_CAG_RETRIEVAL_TOP_M, DEFAULT_CHUNK_RECIPE_ID, DEFAULT_CR_PREFILTER_THRESHOLD,
    DEFAULT_ERA_TAU_YEARS, GLOBAL_CONFIG_FILENAME, REELFORGE_HOME_DIR,
};
use crate::errors::CoreError;

// ============================================================================
// DevicePreference
// ============================================================================

/// Preference for the compute device used by a concrete `Embedder`/`Generator` backend.
/// The core itself never touches a device; this is plumbed through to `reelforge-model`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    #[default]
    Auto,
    Gpu,
    Cpu,
}

// ============================================================================
// SIM weights
// ============================================================================

/// SIM's hybrid score weights, `{α, β, γ, δ, ε}` from §4.2. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimWeights {
    #[serde(default = "default_alpha")]
    pub alpha_vector: f64,
    #[serde(default = "default_beta")]
    pub beta_genre_overlap: f64,
    #[serde(default = "default_gamma")]
    pub gamma_people_overlap: f64,
    #[serde(default = "default_delta")]
    pub delta_era: f64,
    #[serde(default = "default_epsilon")]
    pub epsilon_rating_affinity: f64,
}

fn default_alpha() -> f64 {
    0.5
}
fn default_beta() -> f64 {
    0.2
}
fn default_gamma() -> f64 {
    0.15
}
fn default_delta() -> f64 {
    0.1
}
fn default_epsilon() -> f64 {
    0.05
}

impl Default for SimWeights {
    fn default() -> Self {
        Self {
            alpha_vector: default_alpha(),
            beta_genre_overlap: default_beta(),
            gamma_people_overlap: default_gamma(),
            delta_era: default_delta(),
            epsilon_rating_affinity: default_epsilon(),
        }
    }
}

impl SimWeights {
    /// Hard errors first (negative/non-finite term, doesn't sum to ~1.0 within tolerance is
    /// a *warning*, not an error, per §4.2 which only requires weights to "sum to 1").
    pub fn validate(&self) -> Result<Vec<String>, CoreError> {
        let mut warnings = Vec::new();
        let terms = [
            ("alpha_vector", self.alpha_vector),
            ("beta_genre_overlap", self.beta_genre_overlap),
            ("gamma_people_overlap", self.gamma_people_overlap),
            ("delta_era", self.delta_era),
            ("epsilon_rating_affinity", self.epsilon_rating_affinity),
        ];
        for (name, value) in terms {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::InvalidWeights(format!(
                    "{name} must be finite and >= 0, got {value}"
                )));
            }
        }
        let sum: f64 = terms.iter().map(|(_, v)| v).sum();
        if (sum - 1.0).abs() > 1e-6 {
            warnings.push(format!(
                "SIM weights sum to {sum:.6}, expected 1.0; results will be scaled accordingly"
            ));
        }
        Ok(warnings)
    }
}

// ============================================================================
// CAG timeouts
// ============================================================================

/// Per-operation-class timeouts from §5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CagTimeouts {
    #[serde(default = "default_embed_ms")]
    pub embed_ms: u64,
    #[serde(default = "default_vector_search_ms")]
    pub vector_search_ms: u64,
    #[serde(default = "default_generate_first_token_ms")]
    pub generate_first_token_ms: u64,
    #[serde(default = "default_generate_total_ms")]
    pub generate_total_ms: u64,
}

fn default_embed_ms() -> u64 {
    2_000
}
fn default_vector_search_ms() -> u64 {
    1_000
}
fn default_generate_first_token_ms() -> u64 {
    5_000
}
fn default_generate_total_ms() -> u64 {
    60_000
}

impl Default for CagTimeouts {
    fn default() -> Self {
        Self {
            embed_ms: default_embed_ms(),
            vector_search_ms: default_vector_search_ms(),
            generate_first_token_ms: default_generate_first_token_ms(),
            generate_total_ms: default_generate_total_ms(),
        }
    }
}

impl CagTimeouts {
    pub fn validate(&self) -> Result<Vec<String>, CoreError> {
        let mut warnings = Vec::new();
        if self.embed_ms == 0 || self.vector_search_ms == 0 || self.generate_total_ms == 0 {
            return Err(CoreError::InvalidConfiguration {
                message: "CAG timeouts must all be > 0".into(),
            });
        }
        if self.generate_first_token_ms > self.generate_total_ms {
            warnings.push(
                "generate_first_token_ms exceeds generate_total_ms; first-token timeout will \
                 never trigger before the overall one"
                    .to_string(),
            );
        }
        Ok(warnings)
    }
}

// ============================================================================
// CoreConfig (global, user-level)
// ============================================================================

/// User-level configuration. Loaded from `~/.reelforge/config.yaml`, or defaults if absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreConfig {
    pub chunk_recipe_id: String,
    pub embedding_batch_size: usize,
    pub sim_weights: SimWeights,
    pub era_tau_years: f64,
    pub cr_prefilter_threshold: usize,
    pub cag_timeouts: CagTimeouts,
    pub cag_context_token_budget: u32,
    pub cag_candidate_pool_cap: usize,
    pub cag_retrieval_top_m: usize,
    pub cag_cache_ceiling_mib: u64,
    pub device: DevicePreference,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            chunk_recipe_id: DEFAULT_CHUNK_RECIPE_ID.to_string(),
            embedding_batch_size: 32,
            sim_weights: SimWeights::default(),
            era_tau_years: DEFAULT_ERA_TAU_YEARS,
            cr_prefilter_threshold: DEFAULT_CR_PREFILTER_THRESHOLD,
            cag_timeouts: CagTimeouts::default(),
            cag_context_token_budget: 4_000,
            cag_candidate_pool_cap: DEFAULT_CAG_CANDIDATE_POOL_CAP,
            cag_retrieval_top_m: DEFAULT_CAG_RETRIEVAL_TOP_M,
            cag_cache_ceiling_mib: DEFAULT_CAG_CACHE_CEILING_MIB,
            device: DevicePreference::Auto,
        }
    }
}

impl CoreConfig {
    /// Default directory holding the user-level config and the CAG cache.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(REELFORGE_HOME_DIR))
    }

    pub fn default_path() -> Option<PathBuf> {
        Self::default_dir().map(|dir| dir.join(GLOBAL_CONFIG_FILENAME))
    }

    /// Load from the default path, or return defaults if it doesn't exist.
    pub fn load_default() -> Result<Self, CoreError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&text)?;
        Ok(config)
    }

    /// Aggregate all sub-validations. Hard errors return immediately; warnings from every
    /// section are merged.
    pub fn validate(&self) -> Result<Vec<String>, CoreError> {
        let mut warnings = Vec::new();
        warnings.extend(self.sim_weights.validate()?);
        warnings.extend(self.cag_timeouts.validate()?);
        if self.embedding_batch_size == 0 {
            return Err(CoreError::InvalidConfiguration {
                message: "embeddingBatchSize must be > 0".into(),
            });
        }
        if self.cag_cache_ceiling_mib == 0 {
            return Err(CoreError::InvalidConfiguration {
                message: "cagCacheCeilingMib must be > 0".into(),
            });
        }
        if self.era_tau_years <= 0.0 || !self.era_tau_years.is_finite() {
            return Err(CoreError::InvalidConfiguration {
                message: "eraTauYears must be finite and > 0".into(),
            });
        }
        if self.cag_context_token_budget < 256 {
            warnings.push(format!(
                "cagContextTokenBudget is very small ({}); most references will be truncated",
                self.cag_context_token_budget
            ));
        }
        Ok(warnings)
    }
}

// ============================================================================
// CatalogConfig (per-catalog override)
// ============================================================================

/// Per-catalog/workspace override. Every field is optional; unset fields fall through to
/// [`CoreConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogConfig {
    pub sim_weights: Option<SimWeights>,
    pub era_tau_years: Option<f64>,
    pub cr_prefilter_threshold: Option<usize>,
    pub cag_timeouts: Option<CagTimeouts>,
    pub cag_context_token_budget: Option<u32>,
    pub cag_candidate_pool_cap: Option<usize>,
    pub cag_retrieval_top_m: Option<usize>,
    pub cag_cache_ceiling_mib: Option<u64>,
}

impl CatalogConfig {
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&text)?;
        Ok(config)
    }

    pub fn default_filename() -> &'static str {
        CATALOG_CONFIG_FILENAME
    }

    pub fn validate(&self) -> Result<Vec<String>, CoreError> {
        let mut warnings = Vec::new();
        if let Some(weights) = self.sim_weights {
            warnings.extend(weights.validate()?);
        }
        if let Some(timeouts) = self.cag_timeouts {
            warnings.extend(timeouts.validate()?);
        }
        Ok(warnings)
    }
}

impl CoreConfig {
    /// Merge a catalog-level override on top of this global config, logging each override
    /// at `debug!`.
    pub fn resolve(&self, catalog: &CatalogConfig) -> CoreConfig {
        let mut resolved = self.clone();
        if let Some(weights) = catalog.sim_weights {
            tracing::debug!(?weights, "catalog override: simWeights");
            resolved.sim_weights = weights;
        }
        if let Some(tau) = catalog.era_tau_years {
            tracing::debug!(tau, "catalog override: eraTauYears");
            resolved.era_tau_years = tau;
        }
        if let Some(t) = catalog.cr_prefilter_threshold {
            tracing::debug!(t, "catalog override: crPrefilterThreshold");
            resolved.cr_prefilter_threshold = t;
        }
        if let Some(timeouts) = catalog.cag_timeouts {
            tracing::debug!(?timeouts, "catalog override: cagTimeouts");
            resolved.cag_timeouts = timeouts;
        }
        if let Some(budget) = catalog.cag_context_token_budget {
            tracing::debug!(budget, "catalog override: cagContextTokenBudget");
            resolved.cag_context_token_budget = budget;
        }
        if let Some(cap) = catalog.cag_candidate_pool_cap {
            tracing::debug!(cap, "catalog override: cagCandidatePoolCap");
            resolved.cag_candidate_pool_cap = cap;
        }
        if let Some(m) = catalog.cag_retrieval_top_m {
            tracing::debug!(m, "catalog override: cagRetrievalTopM");
            resolved.cag_retrieval_top_m = m;
        }
        if let Some(mib) = catalog.cag_cache_ceiling_mib {
            tracing::debug!(mib, "catalog override: cagCacheCeilingMib");
            resolved.cag_cache_ceiling_mib = mib;
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sim_weights_sum_to_one() {
        let weights = SimWeights::default();
        let sum = weights.alpha_vector
            + weights.beta_genre_overlap
            + weights.gamma_people_overlap
            + weights.delta_era
            + weights.epsilon_rating_affinity;
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(weights.validate().unwrap().is_empty());
    }

    #[test]
    fn sim_weights_reject_negative_term() {
        let weights = SimWeights {
            alpha_vector: -0.1,
            ..SimWeights::default()
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn sim_weights_warn_when_not_summing_to_one() {
        let weights = SimWeights {
            alpha_vector: 0.9,
            ..SimWeights::default()
        };
        let warnings = weights.validate().unwrap();
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn cag_timeouts_reject_zero() {
        let timeouts = CagTimeouts {
            embed_ms: 0,
            ..CagTimeouts::default()
        };
        assert!(timeouts.validate().is_err());
    }

    #[test]
    fn core_config_validate_aggregates_warnings() {
        let config = CoreConfig {
            sim_weights: SimWeights {
                alpha_vector: 0.9,
                ..SimWeights::default()
            },
            cag_context_token_budget: 100,
            ..CoreConfig::default()
        };
        let warnings = config.validate().unwrap();
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn catalog_override_resolves_onto_global() {
        let global = CoreConfig::default();
        let catalog = CatalogConfig {
            era_tau_years: Some(5.0),
            ..CatalogConfig::default()
        };
        let resolved = global.resolve(&catalog);
        assert_eq!(resolved.era_tau_years, 5.0);
        assert_eq!(resolved.sim_weights, global.sim_weights);
    }
}
