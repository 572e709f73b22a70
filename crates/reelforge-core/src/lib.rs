//! # reelforge-core
//!
//! The core engine of a local-first media discovery system: catalog data model, the four
//! subsystems (IDX indexer, SIM retriever, CR criteria ranker, CAG generation pipeline), and
//! the collaborator traits external backends implement.
//!
//! This crate depends on nothing but the domain model and the traits it defines in
//! [`collaborators`] — concrete catalog stores, embedders, vector stores and generators live
//! in sibling crates (`reelforge-db`, `reelforge-model`, `reelforge-llm`) and are wired
//! together by [`Engine`] at the call site (see `reelforge-cli`).
//!
//! ## Modules
//!
//! - [`model`] – the catalog data model (§3)
//! - [`collaborators`] – external collaborator traits (§6)
//! - [`config`] – two-layer configuration (`CoreConfig`/`CatalogConfig`)
//! - [`constants`] – shared numeric/path defaults
//! - [`errors`] – [`errors::CoreError`] and the closed failure-kind taxonomy
//! - [`idx`] – Indexer: chunk recipe, reindex, provenance ledger
//! - [`sim`] – Retriever: hybrid vector + metadata similarity search
//! - [`cr`] – Criteria Ranker: deterministic weighted scoring
//! - [`cag`] – Context-Augmented Generation pipeline
//! - [`cache`] – the CAG prefix-state cache
//! - [`engine`] – [`Engine`], the orchestrator exposing the public operation surface
//! - [`testing`] – in-memory collaborator doubles for tests

pub mod cache;
pub mod cag;
pub mod collaborators;
pub mod config;
pub mod constants;
pub mod cr;
pub mod engine;
pub mod errors;
pub mod idx;
pub mod model;
pub mod sim;
pub mod testing;

pub use cache::{CacheMetrics, CagCache};
pub use cag::{CagMode, CagPipeline, CagRequest, CagState, GenerationResult};
pub use collaborators::{CatalogStore, Embedder, Generator, VectorStore};
pub use config::{CatalogConfig, CoreConfig};
pub use cr::{CriteriaConfig, Criterion, RankingResult, ScoredItem};
pub use engine::Engine;
pub use errors::{CoreError, ErrorKind};
pub use idx::{IndexReport, Indexer};
pub use sim::{Probe, Retriever, SimResult, SimilarHit};
