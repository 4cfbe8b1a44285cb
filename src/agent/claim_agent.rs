use super::prompt::{accident_message, claim_handler_system_prompt, strip_final_answer_marker};
use super::tool_loop::{STEP_BUDGET, ToolCallRecord, ToolLoop, ToolLoopRunParams};
use crate::error::AgentError;
use crate::providers::Provider;
use crate::store::{ChatHistory, DocumentStore, Namespace, RecordId};
use crate::tools::{ExecutionContext, PERSIST_DATA_TOOL, ToolRegistry};
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;

/// Outcome of one claim run.
#[derive(Debug, Clone)]
pub struct ClaimRun {
    pub run_id: String,
    /// Recommendation record written during the run
    pub object_id: RecordId,
    /// Final answer with the marker removed
    pub final_answer: String,
    /// Whether the record was written by the agent itself because the
    /// generator never persisted one
    pub self_persisted: bool,
    pub rounds: u32,
}

/// Runs the claim handler conversation for one accident description and
/// guarantees a persisted recommendation on success.
pub struct ClaimAgent {
    provider: Arc<dyn Provider>,
    registry: Arc<ToolRegistry>,
    store: Arc<dyn DocumentStore>,
    recommendations: Namespace,
    history: Option<ChatHistory>,
    model: String,
    temperature: f64,
    max_rounds: u32,
}

impl ClaimAgent {
    pub fn new(
        provider: Arc<dyn Provider>,
        registry: Arc<ToolRegistry>,
        store: Arc<dyn DocumentStore>,
        recommendations: Namespace,
        model: impl Into<String>,
        temperature: f64,
    ) -> Self {
        Self {
            provider,
            registry,
            store,
            recommendations,
            history: None,
            model: model.into(),
            temperature,
            max_rounds: STEP_BUDGET,
        }
    }

    #[must_use]
    pub fn with_history(mut self, history: ChatHistory) -> Self {
        self.history = Some(history);
        self
    }

    #[must_use]
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn recommendations(&self) -> &Namespace {
        &self.recommendations
    }

    pub async fn run(&self, description: &str) -> Result<ClaimRun, AgentError> {
        let ctx = ExecutionContext::fresh();
        tracing::info!(run_id = %ctx.run_id, model = %self.model, "claim run started");

        let system_prompt = claim_handler_system_prompt(&self.registry.tool_names());
        let user_message = accident_message(description);

        let mut tool_loop = ToolLoop::new(Arc::clone(&self.registry), self.max_rounds);
        if let Some(history) = &self.history {
            tool_loop = tool_loop.with_history(history.clone());
        }

        let outcome = tool_loop
            .run(ToolLoopRunParams {
                provider: self.provider.as_ref(),
                system_prompt: &system_prompt,
                user_message: &user_message,
                model: &self.model,
                temperature: self.temperature,
                ctx: &ctx,
            })
            .await;
        self.discard_history(&ctx.run_id).await;
        let result = outcome?;

        let final_answer = match strip_final_answer_marker(&result.final_text) {
            Some(answer) => answer.to_string(),
            None => {
                tracing::warn!(run_id = %ctx.run_id, "final answer lacks the FINAL ANSWER marker");
                result.final_text.trim().to_string()
            }
        };

        let (object_id, self_persisted) = match persisted_id(&result.tool_calls) {
            Some(id) => (id, false),
            None => {
                tracing::warn!(
                    run_id = %ctx.run_id,
                    "generator never persisted a recommendation, persisting final answer"
                );
                let document = recovered_document(description, &final_answer);
                let id = self
                    .store
                    .insert(&self.recommendations, document)
                    .await
                    .map_err(|e| AgentError::Persistence(e.to_string()))?;
                (id, true)
            }
        };

        tracing::info!(
            run_id = %ctx.run_id,
            object_id = %object_id,
            rounds = result.rounds,
            self_persisted,
            "claim run finished"
        );

        Ok(ClaimRun {
            run_id: ctx.run_id,
            object_id,
            final_answer,
            self_persisted,
            rounds: result.rounds,
        })
    }

    /// Chat history lives for one run only, whatever its outcome.
    async fn discard_history(&self, run_id: &str) {
        let Some(history) = &self.history else {
            return;
        };
        match history.clear(run_id).await {
            Ok(removed) => tracing::debug!(run_id, removed, "run history discarded"),
            Err(e) => tracing::warn!(run_id, "failed to discard run history: {e}"),
        }
    }
}

/// Id returned by the last successful `persist_data` call.
fn persisted_id(calls: &[ToolCallRecord]) -> Option<RecordId> {
    calls
        .iter()
        .rev()
        .filter(|call| call.tool_name == PERSIST_DATA_TOOL && call.result.success)
        .find_map(|call| {
            let reply: Value = serde_json::from_str(&call.result.output).ok()?;
            reply.get("object_id")?.as_str()?.parse().ok()
        })
}

/// First JSON object embedded anywhere in `text`.
pub fn first_json_object(text: &str) -> Option<Value> {
    text.match_indices('{').find_map(|(start, _)| {
        let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(value @ Value::Object(_))) => Some(value),
            _ => None,
        }
    })
}

fn recovered_document(description: &str, final_answer: &str) -> Value {
    first_json_object(final_answer).unwrap_or_else(|| {
        json!({
            "date": Utc::now().format("%Y-%m-%d").to_string(),
            "description": description,
            "recommendation": final_answer,
        })
    })
}
