use crate::providers::api_error;
use crate::providers::http_client::{Deadline, build_client};
use async_trait::async_trait;
use serde::Deserialize;

/// Trait for embedding providers: convert text to vectors
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Embedding dimensions
    fn dimensions(&self) -> usize;

    /// Embed a batch of texts into vectors
    async fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>>;

    /// Embed a single text
    async fn embed_one(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut results = self.embed(&[text]).await?;
        results
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding result"))
    }
}

/// Hashed bag of words for tests: texts sharing words score close.
#[cfg(test)]
pub(crate) struct KeywordEmbedding {
    dims: usize,
}

#[cfg(test)]
impl KeywordEmbedding {
    pub(crate) fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    fn slot(&self, word: &str) -> usize {
        let hash = word
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
                (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
            });
        usize::try_from(hash % self.dims as u64).unwrap_or(0)
    }
}

#[cfg(test)]
#[async_trait]
impl EmbeddingProvider for KeywordEmbedding {
    fn name(&self) -> &str {
        "keyword_test"
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut vector = vec![0.0_f32; self.dims];
                for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
                    vector[self.slot(&word.to_lowercase())] += 1.0;
                }
                vector
            })
            .collect())
    }
}

// ── Noop provider (no embedding endpoint configured) ─────────

pub struct NoopEmbedding;

#[async_trait]
impl EmbeddingProvider for NoopEmbedding {
    fn name(&self) -> &str {
        "none"
    }

    fn dimensions(&self) -> usize {
        0
    }

    async fn embed(&self, _texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(Vec::new())
    }
}

// ── OpenAI-compatible embedding provider ─────────────────────

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

pub struct OpenAiEmbedding {
    client: reqwest::Client,
    embeddings_url: String,
    auth_header: Option<String>,
    model: String,
    dims: usize,
}

impl OpenAiEmbedding {
    pub fn new(base_url: &str, api_key: Option<&str>, model: &str, dims: usize) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            client: build_client(Deadline::EMBEDDING),
            embeddings_url: format!("{base}/v1/embeddings"),
            auth_header: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(|k| format!("Bearer {k}")),
            model: model.to_string(),
            dims,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    fn name(&self) -> &str {
        "openai"
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
            "dimensions": self.dims,
        });

        let mut request = self.client.post(&self.embeddings_url).json(&body);
        if let Some(auth) = &self.auth_header {
            request = request.header("Authorization", auth);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Embedding HTTP request failed: {e}"))?;

        if !resp.status().is_success() {
            return Err(api_error("Embedding", resp).await);
        }

        let mut parsed: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Invalid embedding response: {e}"))?;

        if parsed.data.len() != texts.len() {
            anyhow::bail!(
                "Embedding response has {} vectors for {} inputs",
                parsed.data.len(),
                texts.len()
            );
        }

        parsed.data.sort_by_key(|item| item.index.unwrap_or(usize::MAX));
        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }
}

// ── Factory ──────────────────────────────────────────────────

/// OpenAI-compatible provider when a base URL is configured, otherwise the
/// no-op provider (retrieval then always falls back).
pub fn create_embedding_provider(
    config: &crate::config::EmbeddingConfig,
) -> Box<dyn EmbeddingProvider> {
    if config.base_url.trim().is_empty() {
        return Box::new(NoopEmbedding);
    }
    Box::new(OpenAiEmbedding::new(
        &config.base_url,
        config.api_key.as_deref(),
        &config.model,
        config.dimensions,
    ))
}
