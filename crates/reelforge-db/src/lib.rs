//! # reelforge-db
//!
//! Infrastructure layer for Reelforge - catalog persistence and vector storage.
//!
//! This crate provides the "heavy" infrastructure implementations that are isolated
//! from the core domain logic in `reelforge-core`. By separating these concerns:
//!
//! - Changes to `reelforge-core` compile fast (no heavy DB deps)
//! - Vector storage backends can be swapped without changing domain logic
//! - Testing is easier with the in-memory doubles in `reelforge_core::testing`
//!
//! ## Architecture
//!
//! ```text
//! reelforge-cli → reelforge-core → (collaborator traits)
//!                     ↑
//!                reelforge-db (implements CatalogStore + VectorStore)
//!                reelforge-model (implements Embedder)
//!                reelforge-llm (implements Generator)
//! ```
//!
//! ## Features
//!
//! - `lancedb` (default): LanceDB vector storage with ANN search
//! - `simple`: Simple JSONL-based vector backend for testing
//!
//! ## Modules
//!
//! - `catalog`: JSONL-file-backed `CatalogStore`
//! - `vector`: Vector index backends (LanceDB, SimpleFile) plus config/metadata types
//! - `core_adapter`: `VectorStore` implementation wrapping a `vector::VectorIndexBackend`
//!
//! ## Usage
//!
//! ```ignore
//! use reelforge_db::vector::{VectorIndexConfig, open_vector_index};
//! use reelforge_db::core_adapter::BackendVectorStore;
//!
//! let config = VectorIndexConfig::new(384, "/path/to/index");
//! let backend = open_vector_index(&config)?;
//! let store = BackendVectorStore::new(backend);
//! ```

pub mod catalog;
pub mod core_adapter;
pub mod error;
pub mod vector;

pub use catalog::JsonCatalogStore;
pub use core_adapter::BackendVectorStore;
pub use error::{DbError, DbResult};
