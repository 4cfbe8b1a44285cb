use super::embeddings::EmbeddingProvider;
use crate::claims::policy::{DESCRIPTION_FIELD, PolicyRecord};
use crate::error::RetrievalError;
use crate::store::{DocumentStore, Filter, Namespace};
use serde_json::Value;
use std::sync::Arc;

/// Characters of the hit's description used for the prefix lookup.
const PREFIX_CHARS: usize = 64;

/// Looks up the policy guideline best matching an accident description.
#[derive(Clone)]
pub struct GuidelineRetriever {
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    policies: Namespace,
    index: String,
}

impl GuidelineRetriever {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        policies: Namespace,
        index: impl Into<String>,
    ) -> Self {
        Self {
            store,
            embedder,
            policies,
            index: index.into(),
        }
    }

    /// Best-matching policy record for `query`. Never fails: any retrieval
    /// problem yields [`PolicyRecord::fallback`].
    pub async fn fetch(&self, query: &str, top_k: usize) -> PolicyRecord {
        match self.try_fetch(query, top_k.max(1)).await {
            Ok(record) => {
                tracing::info!(policy = %record.name, "guideline retrieved");
                record
            }
            Err(e) => {
                tracing::warn!("guideline retrieval failed, using fallback policy: {e}");
                PolicyRecord::fallback()
            }
        }
    }

    async fn try_fetch(&self, query: &str, top_k: usize) -> Result<PolicyRecord, RetrievalError> {
        let embedding = self
            .embedder
            .embed_one(query)
            .await
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        let hits = self
            .store
            .vector_search(&self.index, &embedding, top_k, None)
            .await
            .map_err(|e| RetrievalError::Search(e.to_string()))?;

        let top = hits.into_iter().next().ok_or(RetrievalError::NoMatch)?;
        tracing::debug!(id = %top.id, score = top.score, "top guideline hit");

        let text = top
            .document
            .get(DESCRIPTION_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default();

        let document = self.resolve(text).await?.ok_or(RetrievalError::NoMatch)?;
        PolicyRecord::from_document(document)
    }

    /// Exact description match, then a prefix match, then any policy.
    async fn resolve(&self, text: &str) -> Result<Option<Value>, RetrievalError> {
        let prefix: String = text.chars().take(PREFIX_CHARS).collect();
        let mut filters = Vec::with_capacity(3);
        if !text.is_empty() {
            filters.push(Filter::eq(DESCRIPTION_FIELD, text));
            filters.push(Filter::prefix(DESCRIPTION_FIELD, prefix));
        }
        filters.push(Filter::All);

        for filter in &filters {
            let found = self
                .store
                .find_one(&self.policies, filter)
                .await
                .map_err(|e| RetrievalError::Search(e.to_string()))?;
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }
}
