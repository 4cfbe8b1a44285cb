use super::traits::{ExecutionContext, Tool, ToolResult};
use crate::store::ChatHistory;
use async_trait::async_trait;
use serde_json::json;

/// Deletes the calling run's mirrored conversation history.
pub struct CleanChatHistoryTool {
    history: ChatHistory,
}

impl CleanChatHistoryTool {
    pub fn new(history: ChatHistory) -> Self {
        Self { history }
    }
}

#[async_trait]
impl Tool for CleanChatHistoryTool {
    fn name(&self) -> &str {
        "clean_chat_history"
    }

    fn description(&self) -> &str {
        "Clear the chat history of the current conversation once the recommendation is persisted."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(
        &self,
        _args: serde_json::Value,
        ctx: &ExecutionContext,
    ) -> anyhow::Result<ToolResult> {
        match self.history.clear(&ctx.run_id).await {
            Ok(deleted) => {
                tracing::debug!(run_id = %ctx.run_id, deleted, "chat history cleared");
                Ok(ToolResult::ok(
                    json!({"message": "Chat history cleared successfully"}).to_string(),
                ))
            }
            Err(e) => Ok(ToolResult::failed(format!("Failed to clear chat history: {e}"))),
        }
    }
}
