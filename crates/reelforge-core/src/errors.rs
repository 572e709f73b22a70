//! Error types for reelforge-core.

use thiserror::Error;

/// The closed failure-kind taxonomy every [`CoreError`] maps onto.
///
/// This is the "by failure kind, not type name" grouping the error model is built around:
/// callers that need to decide on exit codes or HTTP statuses should match on `ErrorKind`
/// rather than on individual `CoreError` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InputInvalid,
    NotFound,
    NotIndexed,
    Stale,
    CollaboratorUnavailable,
    Overloaded,
    Timeout,
    MalformedOutput,
    Cancelled,
    Internal,
}

/// Domain-specific errors for reelforge-core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // InputInvalid
    // =========================================================================
    /// A criterion name in a `CriteriaConfig` is not one of the recognized kinds.
    #[error("Unknown criterion `{0}`.")]
    UnknownCriterion(String),

    /// A weight was negative or non-finite.
    #[error("Invalid weight for criterion `{criterion}`: {value} (must be finite and >= 0).")]
    InvalidWeight { criterion: String, value: f64 },

    /// SIM weights did not sum to 1 within tolerance, or contained a negative term.
    #[error("Invalid SIM weights: {0}")]
    InvalidWeights(String),

    /// A custom-attribute tag used by a `custom.*` criterion is not recognized.
    #[error("Unknown custom attribute tag `{0}`.")]
    UnknownAttributeTag(String),

    /// Generic malformed-config error surfaced at a call boundary.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    // =========================================================================
    // NotFound
    // =========================================================================
    /// A referenced item id does not exist in the catalog.
    #[error("Item `{0}` not found.")]
    ItemNotFound(String),

    /// A referenced persona id does not exist.
    #[error("Persona `{0}` not found.")]
    PersonaNotFound(String),

    /// A referenced criteria preset id does not exist.
    #[error("Criteria preset `{0}` not found.")]
    PresetNotFound(String),

    // =========================================================================
    // NotIndexed / Stale
    // =========================================================================
    /// The item has no current embedding; SIM cannot use it as a probe.
    #[error("Item `{0}` has no current embedding.")]
    NotIndexed(String),

    /// Profile or embedding provenance does not match the current recipe/model id.
    #[error("Item `{item}` is stale: {reason}")]
    Stale { item: String, reason: String },

    // =========================================================================
    // IDX-specific
    // =========================================================================
    /// The item vanished between read and write; treated as an implicit delete.
    #[error("Source item `{0}` vanished during reindex; treated as delete.")]
    SourceMissing(String),

    /// The embedding backend was unreachable during reindex; profile was still written.
    #[error("Embedding unavailable for item `{item}`: {reason}")]
    EmbeddingUnavailable { item: String, reason: String },

    // =========================================================================
    // CollaboratorUnavailable
    // =========================================================================
    /// The catalog store, embedder, vector store or generator is unreachable.
    #[error("Collaborator `{collaborator}` unavailable: {reason}")]
    CollaboratorUnavailable { collaborator: String, reason: String },

    // =========================================================================
    // Overloaded / Timeout / Cancelled
    // =========================================================================
    /// The generator pool's bounded queue is full.
    #[error("Overloaded: {0}")]
    Overloaded(String),

    /// A configured timeout (`embed_ms`, `vector_search_ms`, `generate_first_token_ms`,
    /// `generate_total_ms`) was exceeded.
    #[error("Timeout after {elapsed_ms}ms (limit {limit_ms}ms) in {operation}.")]
    Timeout {
        operation: String,
        elapsed_ms: u64,
        limit_ms: u64,
    },

    /// The request's cancel token fired.
    #[error("Cancelled.")]
    Cancelled,

    // =========================================================================
    // MalformedOutput
    // =========================================================================
    /// Generator output could not be parsed into the declared schema after one repair pass.
    #[error("Malformed generator output for mode `{mode}` (raw output preserved): {reason}")]
    MalformedOutput {
        mode: String,
        reason: String,
        raw_output: String,
    },

    /// No reference fit within the context token budget.
    #[error("Context too large: zero references fit within a budget of {budget_tokens} tokens.")]
    ContextTooLarge { budget_tokens: u32 },

    // =========================================================================
    // Internal
    // =========================================================================
    /// An internal invariant was violated (e.g. un-normalized vector, negative score).
    #[error("Internal invariant violated: {0}")]
    Internal(String),

    /// An I/O error occurred (cache directory, provenance ledger, config file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A wrapped generic error from a collaborator crate.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    /// Map this error onto the closed §7 failure-kind taxonomy.
    pub fn kind(&self) -> ErrorKind {
        use CoreError::*;
        match self {
            UnknownCriterion(_)
            | InvalidWeight { .. }
            | InvalidWeights(_)
            | UnknownAttributeTag(_)
            | InvalidConfiguration { .. } => ErrorKind::InputInvalid,

            ItemNotFound(_) | PersonaNotFound(_) | PresetNotFound(_) => ErrorKind::NotFound,

            NotIndexed(_) | SourceMissing(_) => ErrorKind::NotIndexed,

            Stale { .. } => ErrorKind::Stale,

            EmbeddingUnavailable { .. } | CollaboratorUnavailable { .. } => {
                ErrorKind::CollaboratorUnavailable
            }

            Overloaded(_) => ErrorKind::Overloaded,

            Timeout { .. } => ErrorKind::Timeout,

            Cancelled => ErrorKind::Cancelled,

            MalformedOutput { .. } | ContextTooLarge { .. } => ErrorKind::MalformedOutput,

            Internal(_) | Io(_) | Json(_) | Yaml(_) | Other(_) => ErrorKind::Internal,
        }
    }

    /// The CLI/HTTP exit-code mapping from §6: 0 success is implicit (no error), 2 invalid
    /// input, 3 external-collaborator unavailable, 4 malformed output after repair, 5
    /// overloaded. Everything else (not found, stale, timeout, cancelled, internal) is
    /// reported with a generic failure code by callers that don't special-case it further.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::InputInvalid => 2,
            ErrorKind::CollaboratorUnavailable => 3,
            ErrorKind::MalformedOutput => 4,
            ErrorKind::Overloaded => 5,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_invalid_kinds_map_correctly() {
        assert_eq!(
            CoreError::UnknownCriterion("foo".into()).kind(),
            ErrorKind::InputInvalid
        );
        assert_eq!(
            CoreError::InvalidWeight {
                criterion: "genre".into(),
                value: -1.0
            }
            .kind(),
            ErrorKind::InputInvalid
        );
    }

    #[test]
    fn exit_codes_match_spec_table() {
        assert_eq!(CoreError::UnknownCriterion("x".into()).exit_code(), 2);
        assert_eq!(
            CoreError::CollaboratorUnavailable {
                collaborator: "Embedder".into(),
                reason: "down".into()
            }
            .exit_code(),
            3
        );
        assert_eq!(
            CoreError::MalformedOutput {
                mode: "mashup".into(),
                reason: "bad json".into(),
                raw_output: "...".into()
            }
            .exit_code(),
            4
        );
        assert_eq!(CoreError::Overloaded("queue full".into()).exit_code(), 5);
    }

    #[test]
    fn not_indexed_and_stale_are_distinct_kinds() {
        assert_eq!(CoreError::NotIndexed("i1".into()).kind(), ErrorKind::NotIndexed);
        assert_eq!(
            CoreError::Stale {
                item: "i1".into(),
                reason: "recipe changed".into()
            }
            .kind(),
            ErrorKind::Stale
        );
    }
}
