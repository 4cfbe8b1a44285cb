use crate::error::AgentError;
use crate::providers::{
    ContentBlock, MessageRole, Provider, ProviderMessage, ProviderResponse, ToolRequest,
};
use crate::store::ChatHistory;
use crate::tools::{ExecutionContext, ToolRegistry, ToolResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ── Constants ────────────────────────────────────────────────────────────────

/// Generate/Act rounds allowed per run.
pub const STEP_BUDGET: u32 = 15;

// ── Public types ─────────────────────────────────────────────────────────────

/// Alternates between asking the generator for its next step and executing
/// the tools it requests, until it answers without tool calls.
pub struct ToolLoop {
    registry: Arc<ToolRegistry>,
    max_rounds: u32,
    history: Option<ChatHistory>,
}

/// Parameters for a single [`ToolLoop::run`] invocation.
pub struct ToolLoopRunParams<'a> {
    pub provider: &'a dyn Provider,
    pub system_prompt: &'a str,
    pub user_message: &'a str,
    pub model: &'a str,
    pub temperature: f64,
    pub ctx: &'a ExecutionContext,
}

/// Record of a single tool invocation within the loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub args: serde_json::Value,
    pub result: ToolResult,
    pub round: u32,
}

/// Final output of a [`ToolLoop::run`] invocation.
#[derive(Debug)]
pub struct ToolLoopResult {
    pub final_text: String,
    pub tool_calls: Vec<ToolCallRecord>,
    pub messages: Vec<ProviderMessage>,
    pub rounds: u32,
    pub tokens_used: Option<u64>,
}

// ── Implementation ───────────────────────────────────────────────────────────

impl ToolLoop {
    pub fn new(registry: Arc<ToolRegistry>, max_rounds: u32) -> Self {
        Self {
            registry,
            max_rounds: max_rounds.max(1),
            history: None,
        }
    }

    /// Mirror every appended message into `history`, tagged with the run id.
    #[must_use]
    pub fn with_history(mut self, history: ChatHistory) -> Self {
        self.history = Some(history);
        self
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Run the loop to completion.
    ///
    /// Fails with [`AgentError::BudgetExceeded`] once the generator has been
    /// invoked `max_rounds` times and still requests tools; no partial
    /// result is returned in that case.
    pub async fn run(&self, params: ToolLoopRunParams<'_>) -> Result<ToolLoopResult, AgentError> {
        let tools = self.registry.specs();
        let run_id = params.ctx.run_id.as_str();

        let mut messages = Vec::new();
        let mut tool_calls = Vec::new();
        let mut tokens: Option<u64> = None;

        self.append(&mut messages, ProviderMessage::user(params.user_message), run_id)
            .await;

        for round in 1..=self.max_rounds {
            let response = params
                .provider
                .chat_with_tools(
                    Some(params.system_prompt),
                    &messages,
                    &tools,
                    params.model,
                    params.temperature,
                )
                .await
                .map_err(|e| AgentError::Generation(e.to_string()))?;

            if let Some(used) = response.total_tokens() {
                tokens = Some(tokens.unwrap_or(0) + used);
            }

            self.append(&mut messages, response.to_assistant_message(), run_id)
                .await;

            if !response.has_tool_use() {
                tracing::info!(run_id, rounds = round, "generator finished");
                return Ok(ToolLoopResult {
                    final_text: extract_last_text(&messages),
                    tool_calls,
                    messages,
                    rounds: round,
                    tokens_used: tokens,
                });
            }

            self.execute_tool_blocks(&response, &mut messages, &mut tool_calls, round, params.ctx)
                .await;
        }

        tracing::warn!(run_id, rounds = self.max_rounds, "step budget exhausted");
        Err(AgentError::BudgetExceeded {
            rounds: self.max_rounds,
        })
    }

    /// Execute every tool-use block of one response, in order, appending one
    /// tool-result message per call.
    async fn execute_tool_blocks(
        &self,
        response: &ProviderResponse,
        messages: &mut Vec<ProviderMessage>,
        tool_calls: &mut Vec<ToolCallRecord>,
        round: u32,
        ctx: &ExecutionContext,
    ) {
        for ToolRequest { id, name, input } in response.tool_requests() {
            tracing::info!(run_id = %ctx.run_id, round, tool = %name, "tool call");

            let result = match self.registry.execute(name, input.clone(), ctx).await {
                Ok(r) => r,
                Err(e) => ToolResult::failed(e.to_string()),
            };
            if !result.success {
                tracing::warn!(
                    run_id = %ctx.run_id,
                    tool = %name,
                    error = result.error.as_deref().unwrap_or_default(),
                    "tool call failed"
                );
            }

            let content = format_tool_result_content(&result);
            tool_calls.push(ToolCallRecord {
                tool_name: name.to_string(),
                args: input.clone(),
                result: result.clone(),
                round,
            });
            self.append(
                messages,
                ProviderMessage::tool_result(id, content, !result.success),
                &ctx.run_id,
            )
            .await;
        }
    }

    async fn append(&self, messages: &mut Vec<ProviderMessage>, message: ProviderMessage, run_id: &str) {
        if let Some(history) = &self.history
            && let Err(e) = history.append(run_id, &message).await
        {
            tracing::warn!(run_id, "failed to mirror message to chat history: {e}");
        }
        messages.push(message);
    }
}

// ── Free functions ───────────────────────────────────────────────────────────

fn extract_last_text(messages: &[ProviderMessage]) -> String {
    for msg in messages.iter().rev() {
        if msg.role != MessageRole::Assistant {
            continue;
        }
        for block in msg.content.iter().rev() {
            if let ContentBlock::Text { text } = block
                && !text.is_empty()
            {
                return text.clone();
            }
        }
    }
    String::new()
}

fn format_tool_result_content(result: &ToolResult) -> String {
    if let Some(ref error) = result.error {
        format!("[ERROR] {error}")
    } else {
        result.output.clone()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
