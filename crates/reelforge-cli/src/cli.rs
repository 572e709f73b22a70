//! CLI definition and command dispatch for Reelforge.
//!
//! This module defines the command-line interface using `clap` and provides the `run()`
//! function that wires concrete collaborators into an `Engine` and dispatches commands to
//! it (§6).
//!
//! ## Configuration Precedence
//!
//! Configuration is resolved with the following precedence (highest to lowest):
//! 1. CLI flags (e.g., `--config`, `--catalog-dir`)
//! 2. Environment variables (`REELFORGE_CONFIG`, `REELFORGE_VERBOSE`, ...)
//! 3. Config file (`~/.reelforge/config.yaml` or path from `--config`/`REELFORGE_CONFIG`)
//! 4. Built-in defaults
//!
//! ## Exit Codes
//!
//! Mirrors `CoreError::exit_code()`: 0 success, 2 invalid input, 3 collaborator unavailable,
//! 4 malformed generator output, 5 overloaded, 1 everything else.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use reelforge_core::cag::{CagMode, CagRequest, CancelToken, GenerationResult, VerifiedRecommendation};
use reelforge_core::collaborators::CatalogFilter;
use reelforge_core::config::{CoreConfig, DevicePreference as CoreDevicePreference};
use reelforge_core::engine::Engine;
use reelforge_core::errors::CoreError;
use reelforge_core::model::{ItemId, ItemKind, PersonaProfile};
use reelforge_db::catalog::JsonCatalogStore;
use reelforge_db::core_adapter::BackendVectorStore;
use reelforge_db::vector::{open_vector_index, VectorIndexConfig};
use reelforge_llm::HttpGenerator;
use reelforge_model::core_adapter::CandleEmbedder;
use reelforge_model::{DevicePreference as ModelDevicePreference, EmbeddingConfig};

use crate::presets;
use crate::ui::progress::{Progress, ProgressMode};
use crate::ui::{table, ColorMode, MessageType, Style};

/// Version string including git commit hash.
const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

/// Reelforge – local-first media discovery engine.
#[derive(Parser, Debug)]
#[command(name = "reelforge")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (debug logging).
    #[arg(short, long, global = true, env = "REELFORGE_VERBOSE")]
    pub verbose: bool,

    /// Suppress progress and informational messages.
    #[arg(short, long, global = true, env = "REELFORGE_QUIET")]
    pub quiet: bool,

    /// Path to the global configuration file (default: ~/.reelforge/config.yaml).
    #[arg(long, global = true, env = "REELFORGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the catalog's JSONL files (default: current directory).
    #[arg(long, global = true, env = "REELFORGE_CATALOG_DIR")]
    pub catalog_dir: Option<PathBuf>,

    /// Directory holding the vector index (default: `<catalog-dir>/vectors`).
    #[arg(long, global = true, env = "REELFORGE_VECTOR_DIR")]
    pub vector_dir: Option<PathBuf>,

    /// Path to the criteria-preset file used by `rank --preset` (default:
    /// ~/.reelforge/presets.json).
    #[arg(long, global = true, env = "REELFORGE_PRESETS_FILE")]
    pub presets_file: Option<PathBuf>,

    /// Generator model id served at the generation endpoint.
    #[arg(long, global = true, env = "REELFORGE_GENERATOR_MODEL", default_value = "llama3.1")]
    pub generator_model: String,

    /// Generator model's context window, in tokens.
    #[arg(long, global = true, default_value_t = 8192)]
    pub generator_context_window: u32,

    /// Color output mode: always, never, or auto (default: auto).
    #[arg(long, global = true, env = "REELFORGE_COLOR", default_value = "auto")]
    pub color: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available top-level commands (§6).
#[derive(Subcommand, Debug)]
pub enum Command {
    /// IDX: (re)build the scoring profile and embedding for catalog items.
    #[command(subcommand)]
    Index(IndexCommand),

    /// IDX: reindex every item whose embedding provenance doesn't match the catalog's
    /// current chunk recipe id.
    #[command(after_help = r#"EXAMPLES:
    # Bring every stale embedding back up to date after a chunk-recipe bump
    reelforge reindex-if-recipe-changed
"#)]
    ReindexIfRecipeChanged,

    /// CAG: prompt-cache operations.
    #[command(subcommand)]
    Cache(CacheCommand),

    /// CR: rank catalog items against a named criteria preset.
    #[command(after_help = r#"EXAMPLES:
    # Rank against a saved preset, top 20 by default
    reelforge rank --preset cozy-night-in

    # Limit to the top 5, machine-readable
    reelforge rank --preset cozy-night-in --limit 5 --json
"#)]
    Rank {
        /// Id of the criteria preset to rank against.
        #[arg(long)]
        preset: String,

        /// Maximum number of ranked items to return.
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Output in JSON format.
        #[arg(long)]
        json: bool,
    },

    /// CAG: generate a creative recommendation from a request file.
    #[command(after_help = r#"EXAMPLES:
    # Mash up two references into a pitch
    reelforge generate --mode mashup --file request.json
"#)]
    Generate {
        /// Request mode.
        #[arg(long, value_enum)]
        mode: GenerateMode,

        /// Path to a JSON request payload (see `GenerateRequestFile`).
        #[arg(long)]
        file: PathBuf,

        /// Output in JSON format.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum IndexCommand {
    /// Reindex every item in the catalog.
    All,
    /// Reindex a single item by id.
    Item {
        /// Catalog item id.
        item_id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Clear the CAG prompt cache.
    Clear,
    /// Print CAG cache metrics (entries, size, hits, misses, evictions).
    Metrics {
        /// Output in JSON format.
        #[arg(long)]
        json: bool,
    },
}

/// CLI-facing mirror of `CagMode`, kept separate so `clap::ValueEnum` doesn't need to be
/// derived on a core type.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum GenerateMode {
    Mashup,
    HighConcept,
    Recommend,
    Similar,
    Chat,
}

impl From<GenerateMode> for CagMode {
    fn from(mode: GenerateMode) -> Self {
        match mode {
            GenerateMode::Mashup => CagMode::Mashup,
            GenerateMode::HighConcept => CagMode::HighConcept,
            GenerateMode::Recommend => CagMode::Recommend,
            GenerateMode::Similar => CagMode::Similar,
            GenerateMode::Chat => CagMode::Chat,
        }
    }
}

/// On-disk shape of a `generate --file` request payload.
///
/// `CagRequest` has no serde impl of its own (the core keeps wire shapes out of its
/// dependency surface), so the CLI owns this conversion.
#[derive(Debug, Deserialize)]
struct GenerateRequestFile {
    query_text: String,
    #[serde(default)]
    explicit_references: Vec<String>,
    #[serde(default)]
    excluded_kinds: Vec<ItemKind>,
    #[serde(default)]
    persona: Option<PersonaProfile>,
    #[serde(default)]
    context_token_budget: Option<u32>,
    #[serde(default)]
    candidate_pool_cap: Option<usize>,
    #[serde(default)]
    retrieval_top_m: Option<usize>,
}

fn collaborator_unavailable(collaborator: &str, reason: impl std::fmt::Display) -> CoreError {
    CoreError::CollaboratorUnavailable {
        collaborator: collaborator.to_string(),
        reason: reason.to_string(),
    }
}

fn core_device(device: ModelDevicePreference) -> CoreDevicePreference {
    match device {
        ModelDevicePreference::Auto => CoreDevicePreference::Auto,
        ModelDevicePreference::Gpu => CoreDevicePreference::Gpu,
        ModelDevicePreference::Cpu => CoreDevicePreference::Cpu,
    }
}

fn model_device(device: CoreDevicePreference) -> ModelDevicePreference {
    match device {
        CoreDevicePreference::Auto => ModelDevicePreference::Auto,
        CoreDevicePreference::Gpu => ModelDevicePreference::Gpu,
        CoreDevicePreference::Cpu => ModelDevicePreference::Cpu,
    }
}

/// Whether `command` ever reaches `Engine::index_one`/`index_bulk`/`generate` — the only
/// paths that touch the embedder, vector store, or generator. `rank` and `cache` are pure
/// catalog/CR or pure cache-bookkeeping operations and must not pay for loading a model.
fn needs_ml_collaborators(command: &Command) -> bool {
    matches!(
        command,
        Command::Index(_) | Command::ReindexIfRecipeChanged | Command::Generate { .. }
    )
}

/// Stand-ins wired in for commands that `needs_ml_collaborators` rules out, so `rank`/`cache`
/// never pay Candle model load or an HTTP generator handshake. Any call into one of these is
/// a dispatch bug, not a reachable runtime path.
mod unavailable {
    use async_trait::async_trait;
    use reelforge_core::collaborators::{
        CatalogFilter, Embedder, GenerationChunk, GenerationParams, Generator, VectorHit, VectorStore,
    };
    use reelforge_core::errors::CoreError;
    use reelforge_core::model::ItemId;

    fn err(collaborator: &str) -> CoreError {
        CoreError::CollaboratorUnavailable {
            collaborator: collaborator.to_string(),
            reason: "not wired for this command".to_string(),
        }
    }

    pub struct UnavailableEmbedder;

    #[async_trait]
    impl Embedder for UnavailableEmbedder {
        fn model_id(&self) -> &str {
            "unavailable"
        }
        fn dimension(&self) -> usize {
            0
        }
        async fn embed_one(&self, _text: &str) -> Result<Vec<f32>, CoreError> {
            Err(err("Embedder"))
        }
        async fn embed_many(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, CoreError> {
            Err(err("Embedder"))
        }
    }

    pub struct UnavailableVectorStore;

    #[async_trait]
    impl VectorStore for UnavailableVectorStore {
        async fn upsert(&self, _item_id: &ItemId, _vector: &[f32], _metadata: serde_json::Value) -> Result<(), CoreError> {
            Err(err("VectorStore"))
        }
        async fn query(&self, _vector: &[f32], _k: usize, _filter: &CatalogFilter) -> Result<Vec<VectorHit>, CoreError> {
            Err(err("VectorStore"))
        }
        async fn delete(&self, _item_id: &ItemId) -> Result<(), CoreError> {
            Err(err("VectorStore"))
        }
    }

    pub struct UnavailableGenerator;

    #[async_trait]
    impl Generator for UnavailableGenerator {
        fn model_id(&self) -> &str {
            "unavailable"
        }
        fn context_window(&self) -> u32 {
            0
        }
        async fn stream(
            &self,
            _prompt: &str,
            _params: &GenerationParams,
            _cache_hint: Option<&str>,
        ) -> Result<tokio::sync::mpsc::Receiver<Result<GenerationChunk, CoreError>>, CoreError> {
            Err(err("Generator"))
        }
    }
}

/// Parse the CLI, wire collaborators into an `Engine`, and dispatch the chosen command.
///
/// # Returns
///
/// `ExitCode::SUCCESS` on success, or the failure's `CoreError::exit_code()` mapped onto a
/// process exit code.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    let filter = format!("reelforge_core={log_level},reelforge_cli={log_level}");
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let color_mode = ColorMode::from_str(&cli.color).unwrap_or(ColorMode::Auto);
    let style = Style::new(color_mode);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!(
                "{}",
                style.error_with_context("Failed to start async runtime", Some(&e.to_string()), None)
            );
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run_async(&cli, &style)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", style.message(MessageType::Err, &err.to_string()));
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

async fn run_async(cli: &Cli, style: &Style) -> Result<(), CoreError> {
    let config = match &cli.config {
        Some(path) => CoreConfig::from_path(path)?,
        None => CoreConfig::load_default()?,
    };
    for warning in config.validate()? {
        eprintln!("{}", style.message(MessageType::Warn, &warning));
    }

    let catalog_dir = cli.catalog_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let catalog = JsonCatalogStore::open(&catalog_dir)?;

    // `rank`/`cache` never touch the embedder, vector store or generator (CR is pure CPU over
    // the catalog's own scoring profiles; the cache is its own bookkeeping) — skip loading a
    // Candle model and opening a generator connection for them, mirroring the lazy collaborator
    // construction the rest of the CLI surface is built around.
    if needs_ml_collaborators(&cli.command) {
        let embedding_config = EmbeddingConfig {
            device: model_device(config.device),
            ..EmbeddingConfig::default()
        };
        let embedder = CandleEmbedder::new(&embedding_config)
            .map_err(|e| collaborator_unavailable("Embedder", e))?;

        let vector_dir = cli.vector_dir.clone().unwrap_or_else(|| catalog_dir.join("vectors"));
        let vector_config = VectorIndexConfig::new(
            reelforge_core::collaborators::Embedder::dimension(&embedder),
            &vector_dir,
        );
        let backend = open_vector_index(&vector_config).map_err(|e| collaborator_unavailable("VectorStore", e))?;
        let vector_store = BackendVectorStore::new(backend);

        let generator = HttpGenerator::new(cli.generator_model.clone(), cli.generator_context_window);

        let engine = Engine::new(&catalog, &embedder, &vector_store, &generator, config);
        dispatch(cli, &engine, style).await
    } else {
        let embedder = unavailable::UnavailableEmbedder;
        let vector_store = unavailable::UnavailableVectorStore;
        let generator = unavailable::UnavailableGenerator;
        let engine = Engine::new(&catalog, &embedder, &vector_store, &generator, config);
        dispatch(cli, &engine, style).await
    }
}

async fn dispatch(cli: &Cli, engine: &Engine<'_>, style: &Style) -> Result<(), CoreError> {
    match &cli.command {
        Command::Index(IndexCommand::All) => handle_index_all(engine, style, cli.quiet).await,
        Command::Index(IndexCommand::Item { item_id }) => handle_index_item(engine, style, item_id).await,
        Command::ReindexIfRecipeChanged => handle_reindex_if_recipe_changed(engine, style, cli.quiet).await,
        Command::Cache(CacheCommand::Clear) => handle_cache_clear(engine, style),
        Command::Cache(CacheCommand::Metrics { json }) => handle_cache_metrics(engine, style, *json),
        Command::Rank { preset, limit, json } => handle_rank(cli, engine, style, preset, *limit, *json).await,
        Command::Generate { mode, file, json } => handle_generate(engine, style, *mode, file, *json).await,
    }
}

// ============================================================================
// index all / index item
// ============================================================================

async fn handle_index_all(engine: &Engine<'_>, style: &Style, quiet: bool) -> Result<(), CoreError> {
    let mode = ProgressMode::detect(quiet, false, style.color_mode());
    let progress = Progress::spinner("Indexing catalog...", mode);
    let report = engine.index_bulk(&CatalogFilter::default()).await?;
    progress.finish_clear();

    let mut rows: Vec<table::IndexReportRow> = report
        .outcomes
        .iter()
        .map(|(item_id, outcome)| table::IndexReportRow {
            item_id: item_id.clone(),
            outcome: describe_outcome(outcome),
        })
        .collect();
    rows.sort_by(|a, b| a.item_id.cmp(&b.item_id));

    println!(
        "{}",
        style.message(MessageType::Ok, &format!("Indexed {} item(s)", rows.len()))
    );
    println!("{}", table::render_index_report_table(&rows));
    Ok(())
}

async fn handle_index_item(engine: &Engine<'_>, style: &Style, item_id: &str) -> Result<(), CoreError> {
    let item_id: ItemId = item_id.to_string();
    let outcome = engine.index_one(&item_id).await?;
    let outcome = reelforge_core::idx::ReindexOutcomeSerializable::from(outcome);
    println!(
        "{}",
        style.message(MessageType::Ok, &format!("{item_id}: {}", describe_outcome(&outcome)))
    );
    Ok(())
}

fn describe_outcome(outcome: &reelforge_core::idx::ReindexOutcomeSerializable) -> String {
    use reelforge_core::idx::ReindexOutcomeSerializable::*;
    match outcome {
        Indexed => "indexed".to_string(),
        Stale { reason } => format!("stale: {reason}"),
        Deleted => "deleted (source missing)".to_string(),
    }
}

// ============================================================================
// reindex-if-recipe-changed
// ============================================================================

async fn handle_reindex_if_recipe_changed(engine: &Engine<'_>, style: &Style, quiet: bool) -> Result<(), CoreError> {
    let (items, _cursor) = engine.catalog.iter_items(&CatalogFilter::default(), None).await?;
    let current_recipe = &engine.config.chunk_recipe_id;

    let mode = ProgressMode::detect(quiet, false, style.color_mode());
    let progress = Progress::bar(items.len() as u64, "Checking catalog for stale embeddings...", mode);

    let mut rows = Vec::new();
    for item in &items {
        let is_stale = match engine.catalog.get_embedding(&item.id).await? {
            Some(record) => record.stale || &record.provenance.chunk_recipe_id != current_recipe,
            None => true,
        };
        if is_stale {
            let outcome = engine.index_one(&item.id).await?;
            let outcome = reelforge_core::idx::ReindexOutcomeSerializable::from(outcome);
            rows.push(table::IndexReportRow {
                item_id: item.id.clone(),
                outcome: describe_outcome(&outcome),
            });
        }
        progress.inc(1);
    }
    progress.finish_clear();

    println!(
        "{}",
        style.message(MessageType::Ok, &format!("Reindexed {} stale item(s)", rows.len()))
    );
    println!("{}", table::render_index_report_table(&rows));
    Ok(())
}

// ============================================================================
// cache clear / cache metrics
// ============================================================================

fn handle_cache_clear(engine: &Engine<'_>, style: &Style) -> Result<(), CoreError> {
    engine.clear_cache();
    println!("{}", style.message(MessageType::Ok, "CAG cache cleared"));
    Ok(())
}

fn handle_cache_metrics(engine: &Engine<'_>, style: &Style, json: bool) -> Result<(), CoreError> {
    let metrics = engine.cache_metrics();
    if json {
        let payload = serde_json::json!({
            "entries": metrics.entries,
            "sizeBytes": metrics.size_bytes,
            "hits": metrics.hits,
            "misses": metrics.misses,
            "evictions": metrics.evictions,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let _ = style;
    let rows = [
        ("entries", metrics.entries.to_string()),
        ("size_bytes", metrics.size_bytes.to_string()),
        ("hits", metrics.hits.to_string()),
        ("misses", metrics.misses.to_string()),
        ("evictions", metrics.evictions.to_string()),
    ];
    let rows: Vec<(&str, String)> = rows.into_iter().collect();
    println!("{}", table::render_metrics_table(&rows));
    Ok(())
}

// ============================================================================
// rank
// ============================================================================

async fn handle_rank(
    cli: &Cli,
    engine: &Engine<'_>,
    style: &Style,
    preset_id: &str,
    limit: usize,
    json: bool,
) -> Result<(), CoreError> {
    let presets_path = cli
        .presets_file
        .clone()
        .or_else(presets::default_path)
        .ok_or_else(|| collaborator_unavailable("PresetStore", "no home directory to resolve ~/.reelforge/presets.json"))?;
    let preset = presets::find(&presets_path, preset_id)?;

    let result = engine.rank(&preset.config, &CatalogFilter::default(), limit).await?;

    let mut rows = Vec::with_capacity(result.items.len());
    for scored in &result.items {
        let title = engine
            .catalog
            .get_item(&scored.item_id)
            .await?
            .map(|item| item.title)
            .unwrap_or_else(|| scored.item_id.clone());
        rows.push(table::RankRow {
            item_id: scored.item_id.clone(),
            title,
            score: scored.score,
            matched_criteria: scored.matched_criteria.clone(),
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!(
        "{}",
        style.message(
            MessageType::Ok,
            &format!(
                "Ranked {} of {} candidate(s) against `{}`",
                rows.len(),
                result.candidates_considered,
                preset.name
            )
        )
    );
    println!("{}", table::render_rank_table(&rows));
    Ok(())
}

// ============================================================================
// generate
// ============================================================================

async fn handle_generate(
    engine: &Engine<'_>,
    style: &Style,
    mode: GenerateMode,
    file: &PathBuf,
    json: bool,
) -> Result<(), CoreError> {
    let text = std::fs::read_to_string(file)?;
    let payload: GenerateRequestFile = serde_json::from_str(&text)?;

    let request = CagRequest {
        mode: mode.into(),
        query_text: payload.query_text,
        explicit_references: payload.explicit_references,
        persona: payload.persona,
        excluded_kinds: payload.excluded_kinds,
        context_token_budget: payload.context_token_budget.unwrap_or(engine.config.cag_context_token_budget),
        candidate_pool_cap: payload.candidate_pool_cap.unwrap_or(engine.config.cag_candidate_pool_cap),
        retrieval_top_m: payload.retrieval_top_m.unwrap_or(engine.config.cag_retrieval_top_m),
    };

    let cancel = CancelToken::new();
    let result = engine.generate(request, &cancel).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&serialize_result(&result))?);
        return Ok(());
    }

    for warning in &result.warnings {
        eprintln!("{}", style.message(MessageType::Warn, warning));
    }
    for recommendation in &result.recommendations {
        match recommendation {
            VerifiedRecommendation::CatalogHit { item_id, reasoning, match_score } => {
                let score = match_score.map(|s| format!(" ({s:.2})")).unwrap_or_default();
                println!("{}", style.message(MessageType::Ok, &format!("{item_id}{score}: {reasoning}")));
            }
            VerifiedRecommendation::Suggestion { title, reasoning, match_score } => {
                let score = match_score.map(|s| format!(" ({s:.2})")).unwrap_or_default();
                println!(
                    "{}",
                    style.message(MessageType::Info, &format!("{title}{score} (not in catalog): {reasoning}"))
                );
            }
        }
    }
    Ok(())
}

fn serialize_result(result: &GenerationResult) -> serde_json::Value {
    let recommendations: Vec<serde_json::Value> = result
        .recommendations
        .iter()
        .map(|r| match r {
            VerifiedRecommendation::CatalogHit { item_id, reasoning, match_score } => serde_json::json!({
                "kind": "catalog_hit",
                "itemId": item_id,
                "reasoning": reasoning,
                "matchScore": match_score,
            }),
            VerifiedRecommendation::Suggestion { title, reasoning, match_score } => serde_json::json!({
                "kind": "suggestion",
                "title": title,
                "reasoning": reasoning,
                "matchScore": match_score,
            }),
        })
        .collect();
    serde_json::json!({
        "recommendations": recommendations,
        "warnings": result.warnings,
        "rawOutput": result.raw_output,
    })
}
