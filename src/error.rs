use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `claimsight`.
///
/// Each subsystem defines its own error variant. Callers at the HTTP and CLI
/// boundary match on these to pick a status code or exit path; internal code
/// keeps using `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum ClaimError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Retrieval ───────────────────────────────────────────────────────
    #[error("retrieval: {0}")]
    Retrieval(#[from] RetrievalError),

    // ── Agent loop ──────────────────────────────────────────────────────
    #[error("agent: {0}")]
    Agent(#[from] AgentError),

    // ── Document store ──────────────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required setting {0} is not set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("failed to load config: {0}")]
    Load(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Retrieval errors ───────────────────────────────────────────────────────

/// Raised inside the retriever; always recovered with the fallback record
/// before reaching the conversation loop.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("vector search failed: {0}")]
    Search(String),

    #[error("no guideline matched the query")]
    NoMatch,

    #[error("stored policy could not be decoded: {0}")]
    Decode(String),
}

// ─── Agent errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("step budget of {rounds} generate/act rounds exhausted")]
    BudgetExceeded { rounds: u32 },

    #[error("generator request failed: {0}")]
    Generation(String),

    #[error("recommendation could not be persisted: {0}")]
    Persistence(String),
}

// ─── Store errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("query failed: {0}")]
    Query(String),

    #[error("document is not a JSON object")]
    NotAnObject,

    #[error("vector index {0} is not defined")]
    UnknownIndex(String),

    #[error("sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClaimError>;
