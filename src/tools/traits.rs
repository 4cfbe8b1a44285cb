use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outcome of one tool call, reported back to the generator as a tool
/// result (`output` on success, `[ERROR] <error>` otherwise).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }
}

/// Name, description and JSON-schema parameters advertised to the
/// generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Per-run data handed to every tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Conversation-loop invocation the call belongs to
    pub run_id: String,
}

impl ExecutionContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
        }
    }

    pub fn fresh() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }
}

/// A capability the claim handler can call. New tools implement this and
/// are registered in a [`super::ToolRegistry`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// Function-calling name; unique within a registry
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of `args`
    fn parameters_schema(&self) -> serde_json::Value;

    /// `Err` is reserved for unexpected failures; invalid arguments should
    /// come back as [`ToolResult::failed`].
    async fn execute(
        &self,
        args: serde_json::Value,
        ctx: &ExecutionContext,
    ) -> anyhow::Result<ToolResult>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}
