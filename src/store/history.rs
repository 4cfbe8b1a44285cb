use super::record_id::RecordId;
use super::traits::{DocumentStore, Filter, Namespace};
use crate::error::StoreError;
use crate::providers::{MessageRole, ProviderMessage};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

/// Field tagging every history document with the run that produced it.
pub const SESSION_FIELD: &str = "session_id";

/// Conversation history mirrored into the history collection, one
/// document per message.
#[derive(Clone)]
pub struct ChatHistory {
    store: Arc<dyn DocumentStore>,
    namespace: Namespace,
}

impl ChatHistory {
    pub fn new(store: Arc<dyn DocumentStore>, namespace: Namespace) -> Self {
        Self { store, namespace }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub async fn append(
        &self,
        run_id: &str,
        message: &ProviderMessage,
    ) -> Result<RecordId, StoreError> {
        let role = match message.role {
            MessageRole::User => "human",
            MessageRole::Assistant => "ai",
        };
        let document = json!({
            SESSION_FIELD: run_id,
            "type": role,
            "message": serde_json::to_value(message)?,
            "created_at": Utc::now().to_rfc3339(),
        });
        self.store.insert(&self.namespace, document).await
    }

    /// Messages of one run, oldest first.
    pub async fn messages(&self, run_id: &str) -> Result<Vec<ProviderMessage>, StoreError> {
        let documents = self
            .store
            .find(&self.namespace, &Filter::eq(SESSION_FIELD, run_id), None)
            .await?;
        documents
            .into_iter()
            .map(|mut doc| {
                let message = doc
                    .get_mut("message")
                    .map(serde_json::Value::take)
                    .unwrap_or_default();
                serde_json::from_value(message).map_err(StoreError::from)
            })
            .collect()
    }

    /// Delete every history document of one run; other runs are untouched.
    pub async fn clear(&self, run_id: &str) -> Result<u64, StoreError> {
        self.store
            .delete_many(&self.namespace, &Filter::eq(SESSION_FIELD, run_id))
            .await
    }
}
