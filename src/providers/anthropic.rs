use super::anthropic_types::{
    Delta, DeltaEvent, ErrorEvent, MessagesReply, MessagesRequest, ReplyBlock, WireMessage,
    WireTool,
};
use super::http_client::{Deadline, build_client};
use super::response::{
    ContentBlock, MessageRole, ProviderMessage, ProviderResponse, StopReason, Usage,
};
use super::scrub::{api_error, sanitize_api_error, scrub_secret_patterns};
use super::sse::SseDecoder;
use super::traits::Provider;
use super::vision::{ImageDescriber, ImageUpload, TextStream};
use crate::tools::traits::ToolSpec;
use async_trait::async_trait;
use reqwest::Client;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;
const VISION_MAX_TOKENS: u32 = 1024;

/// Anthropic Messages API client: tool calling for the agent, SSE streaming
/// for image descriptions.
pub struct AnthropicProvider {
    api_key: Option<String>,
    messages_url: String,
    client: Client,
    stream_client: Client,
}

impl AnthropicProvider {
    pub fn new(api_key: Option<&str>) -> Self {
        Self::with_base_url(api_key, None)
    }

    pub fn with_base_url(api_key: Option<&str>, base_url: Option<&str>) -> Self {
        let base = base_url.map_or("https://api.anthropic.com", |u| u.trim_end_matches('/'));
        Self {
            api_key: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(ToString::to_string),
            messages_url: format!("{base}/v1/messages"),
            client: build_client(Deadline::CHAT),
            stream_client: build_client(Deadline::STREAM),
        }
    }

    /// Outbound copy of a message with secrets scrubbed from every text
    /// and tool result.
    fn to_wire(message: &ProviderMessage) -> WireMessage {
        let content = message
            .content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => ContentBlock::Text {
                    text: scrub_secret_patterns(text).into_owned(),
                },
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => ContentBlock::ToolResult {
                    tool_use_id: tool_use_id.clone(),
                    content: scrub_secret_patterns(content).into_owned(),
                    is_error: *is_error,
                },
                other => other.clone(),
            })
            .collect();
        WireMessage {
            role: message.role,
            content,
        }
    }

    /// Merge consecutive messages of the same role; the Messages API expects
    /// every tool result of one turn inside a single user message.
    fn coalesce_roles(messages: &[ProviderMessage]) -> Vec<ProviderMessage> {
        let mut merged: Vec<ProviderMessage> = Vec::with_capacity(messages.len());
        for message in messages {
            match merged.last_mut() {
                Some(last) if last.role == message.role => {
                    last.content.extend(message.content.iter().cloned());
                }
                _ => merged.push(message.clone()),
            }
        }
        merged
    }

    fn map_stop_reason(stop_reason: Option<&str>) -> Option<StopReason> {
        stop_reason.map(|reason| match reason {
            "end_turn" | "stop_sequence" => StopReason::EndTurn,
            "tool_use" => StopReason::ToolUse,
            "max_tokens" => StopReason::MaxTokens,
            _ => StopReason::Error,
        })
    }

    fn parse_content_blocks(blocks: Vec<ReplyBlock>) -> Vec<ContentBlock> {
        blocks
            .into_iter()
            .filter_map(|block| match block {
                ReplyBlock::Text { text } => Some(ContentBlock::Text { text }),
                ReplyBlock::ToolUse { id, name, input } => {
                    Some(ContentBlock::ToolUse { id, name, input })
                }
                ReplyBlock::Skipped => None,
            })
            .collect()
    }

    fn text_from_content_blocks(blocks: &[ContentBlock]) -> String {
        blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn send(
        &self,
        client: &Client,
        request: &MessagesRequest<'_>,
    ) -> anyhow::Result<reqwest::Response> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            anyhow::anyhow!("Anthropic API key not set. Set ANTHROPIC_API_KEY or CLAIMSIGHT_API_KEY.")
        })?;

        let response = client
            .post(&self.messages_url)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .header("x-api-key", api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error("Anthropic", response).await);
        }
        Ok(response)
    }

    /// Text carried by one SSE event, if any. Upstream `error` events end
    /// the stream.
    fn text_from_sse(event_type: &str, data: &str) -> anyhow::Result<Option<String>> {
        match event_type {
            "content_block_delta" => Ok(serde_json::from_str::<DeltaEvent>(data)
                .ok()
                .and_then(|event| match event.delta {
                    Delta::TextDelta { text } => Some(text),
                    Delta::Other => None,
                })),
            "error" => {
                let detail = serde_json::from_str::<ErrorEvent>(data).map_or_else(
                    |_| sanitize_api_error(data),
                    |e| format!("{}: {}", e.error.kind, sanitize_api_error(&e.error.message)),
                );
                Err(anyhow::anyhow!("Anthropic stream error ({detail})"))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn chat_with_tools(
        &self,
        system_prompt: Option<&str>,
        messages: &[ProviderMessage],
        tools: &[ToolSpec],
        model: &str,
        temperature: f64,
    ) -> anyhow::Result<ProviderResponse> {
        let request = MessagesRequest {
            model,
            max_tokens: MAX_TOKENS,
            system: system_prompt,
            messages: Self::coalesce_roles(messages)
                .iter()
                .map(Self::to_wire)
                .collect(),
            tools: tools
                .iter()
                .map(|tool| WireTool {
                    name: &tool.name,
                    description: &tool.description,
                    input_schema: &tool.parameters,
                })
                .collect(),
            temperature,
            stream: false,
        };

        let reply: MessagesReply = self
            .send(&self.client, &request)
            .await?
            .json()
            .await
            .map_err(anyhow::Error::msg)?;

        let stop_reason = Self::map_stop_reason(reply.stop_reason.as_deref());
        let content_blocks = Self::parse_content_blocks(reply.content);
        let text = Self::text_from_content_blocks(&content_blocks);

        Ok(ProviderResponse {
            text,
            content_blocks,
            stop_reason,
            usage: reply.usage.map(|u| Usage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
            model: reply.model,
        })
    }
}

#[async_trait]
impl ImageDescriber for AnthropicProvider {
    async fn describe_image(
        &self,
        image: &ImageUpload,
        prompt: &str,
        model: &str,
        temperature: f64,
    ) -> anyhow::Result<TextStream> {
        use futures_util::StreamExt;

        let message = ProviderMessage {
            role: MessageRole::User,
            content: vec![
                image.to_content_block(),
                ContentBlock::Text {
                    text: prompt.to_string(),
                },
            ],
        };
        let request = MessagesRequest {
            model,
            max_tokens: VISION_MAX_TOKENS,
            system: None,
            messages: vec![Self::to_wire(&message)],
            tools: Vec::new(),
            temperature,
            stream: true,
        };

        let response = self.send(&self.stream_client, &request).await?;
        let mut byte_stream = response.bytes_stream();

        let stream = async_stream::try_stream! {
            let mut decoder = SseDecoder::new();

            while let Some(chunk) = byte_stream.next().await {
                for event in decoder.feed(&chunk?) {
                    if let Some(text) = Self::text_from_sse(&event.event, &event.data)? {
                        yield text;
                    }
                }
            }

            for event in decoder.finish() {
                if let Some(text) = Self::text_from_sse(&event.event, &event.data)? {
                    yield text;
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
