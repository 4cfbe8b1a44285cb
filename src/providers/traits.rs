use super::response::{ProviderMessage, ProviderResponse};
use crate::tools::traits::ToolSpec;
use async_trait::async_trait;

/// A chat model that can be bound to a tool set.
///
/// The conversation loop only ever calls `chat_with_tools`; the response's
/// tool-use blocks decide whether the loop acts or finishes.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn chat_with_tools(
        &self,
        system_prompt: Option<&str>,
        messages: &[ProviderMessage],
        tools: &[ToolSpec],
        model: &str,
        temperature: f64,
    ) -> anyhow::Result<ProviderResponse>;
}
