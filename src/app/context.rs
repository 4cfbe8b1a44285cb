use crate::agent::ClaimAgent;
use crate::config::{Config, StorageSettings};
use crate::gateway::{AppState, DescriptionCache};
use crate::providers::AnthropicProvider;
use crate::retrieval::{EmbeddingProvider, GuidelineRetriever, create_embedding_provider};
use crate::store::{ChatHistory, DocumentStore, Namespace, SqliteDocumentStore};
use crate::tools::{ToolRegistry, claim_tools};
use std::sync::Arc;

/// Long-lived collaborators shared by every command.
pub struct AppContext {
    pub config: Config,
    pub storage: StorageSettings,
    pub store: Arc<dyn DocumentStore>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub provider: Arc<AnthropicProvider>,
}

impl AppContext {
    /// Connect the store and build HTTP clients from a validated config.
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let storage = config.storage.resolve()?;
        let store = SqliteDocumentStore::connect(&storage.uri).await?;
        tracing::info!(uri = %storage.uri, database = %storage.database, "document store ready");

        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::from(create_embedding_provider(&config.embedding));
        let provider = Arc::new(AnthropicProvider::with_base_url(
            config.llm.api_key.as_deref(),
            config.llm.base_url.as_deref(),
        ));

        Ok(Self::from_parts(config, storage, Arc::new(store), embedder, provider))
    }

    pub fn from_parts(
        config: Config,
        storage: StorageSettings,
        store: Arc<dyn DocumentStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        provider: Arc<AnthropicProvider>,
    ) -> Self {
        Self {
            config,
            storage,
            store,
            embedder,
            provider,
        }
    }

    pub fn policies(&self) -> Namespace {
        Namespace::new(&self.storage.database, &self.storage.policy_collection)
    }

    pub fn recommendations(&self) -> Namespace {
        Namespace::new(&self.storage.database, &self.storage.recommendation_collection)
    }

    pub fn history_namespace(&self) -> Namespace {
        Namespace::new(&self.storage.database, &self.storage.history_collection)
    }

    pub fn retriever(&self) -> GuidelineRetriever {
        GuidelineRetriever::new(
            Arc::clone(&self.store),
            Arc::clone(&self.embedder),
            self.policies(),
            &self.storage.vector_index,
        )
    }

    pub fn history(&self) -> ChatHistory {
        ChatHistory::new(Arc::clone(&self.store), self.history_namespace())
    }

    pub fn tools(&self) -> ToolRegistry {
        claim_tools(
            self.retriever(),
            Arc::clone(&self.store),
            self.recommendations(),
            self.history(),
        )
    }

    pub fn agent(&self) -> ClaimAgent {
        ClaimAgent::new(
            self.provider.clone(),
            Arc::new(self.tools()),
            Arc::clone(&self.store),
            self.recommendations(),
            &self.config.llm.agent_model,
            self.config.llm.temperature,
        )
        .with_history(self.history())
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            describer: self.provider.clone(),
            agent: Arc::new(self.agent()),
            store: Arc::clone(&self.store),
            cache: Arc::new(DescriptionCache::default()),
            vision_model: self.config.llm.vision_model.clone(),
            temperature: self.config.llm.temperature,
        }
    }
}
