use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path the config was read from - not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

// ── Storage ─────────────────────────────────────────────────────

/// Document store settings. Every field is required; there are no defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// sqlx connection URI, e.g. `sqlite://claims.db?mode=rwc`
    pub uri: Option<String>,
    /// Database name, used as the namespace prefix of every collection
    pub database: Option<String>,
    /// Collection holding policy guideline records
    pub policy_collection: Option<String>,
    /// Collection receiving recommendation documents
    pub recommendation_collection: Option<String>,
    /// Collection mirroring conversation history
    pub history_collection: Option<String>,
    /// Name of the vector index over the policy collection
    pub vector_index: Option<String>,
}

/// Storage settings after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub uri: String,
    pub database: String,
    pub policy_collection: String,
    pub recommendation_collection: String,
    pub history_collection: String,
    pub vector_index: String,
}

fn required(value: Option<&String>, key: &'static str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .ok_or(ConfigError::Missing(key))
}

impl StorageConfig {
    pub fn resolve(&self) -> Result<StorageSettings, ConfigError> {
        Ok(StorageSettings {
            uri: required(self.uri.as_ref(), "CLAIMSIGHT_DATABASE_URI")?,
            database: required(self.database.as_ref(), "CLAIMSIGHT_DATABASE_NAME")?,
            policy_collection: required(
                self.policy_collection.as_ref(),
                "CLAIMSIGHT_POLICY_COLLECTION",
            )?,
            recommendation_collection: required(
                self.recommendation_collection.as_ref(),
                "CLAIMSIGHT_RECOMMENDATION_COLLECTION",
            )?,
            history_collection: required(
                self.history_collection.as_ref(),
                "CLAIMSIGHT_HISTORY_COLLECTION",
            )?,
            vector_index: required(self.vector_index.as_ref(), "CLAIMSIGHT_VECTOR_INDEX")?,
        })
    }
}

// ── LLM ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    /// Override for the Messages API base URL
    pub base_url: Option<String>,
    /// Model driving the tool-calling agent
    #[serde(default = "default_agent_model")]
    pub agent_model: String,
    /// Model describing uploaded images
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    #[serde(default)]
    pub temperature: f64,
}

fn default_agent_model() -> String {
    "claude-3-haiku-20240307".into()
}

fn default_vision_model() -> String {
    "claude-3-sonnet-20240229".into()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            agent_model: default_agent_model(),
            vision_model: default_vision_model(),
            temperature: 0.0,
        }
    }
}

// ── Embeddings ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,
    pub api_key: Option<String>,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Must match the dimensions of the stored policy vectors
    #[serde(default = "default_embedding_dimensions")]
    pub dimensions: usize,
}

fn default_embedding_base_url() -> String {
    "https://api.openai.com".into()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

fn default_embedding_dimensions() -> usize {
    1024
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_embedding_base_url(),
            api_key: None,
            model: default_embedding_model(),
            dimensions: default_embedding_dimensions(),
        }
    }
}

// ── Gateway ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway host (default: 127.0.0.1)
    #[serde(default = "default_gateway_host")]
    pub host: String,
    /// Gateway port (default: 8000)
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    /// Largest accepted image upload in bytes (default: 10 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Upper bound on a single agent run behind `/runAgent`
    #[serde(default = "default_agent_timeout_secs")]
    pub agent_timeout_secs: u64,
}

fn default_gateway_host() -> String {
    "127.0.0.1".into()
}

fn default_gateway_port() -> u16 {
    8000
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_agent_timeout_secs() -> u64 {
    300
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            max_upload_bytes: default_max_upload_bytes(),
            agent_timeout_secs: default_agent_timeout_secs(),
        }
    }
}
