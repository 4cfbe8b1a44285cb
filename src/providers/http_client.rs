use reqwest::Client;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline policy of an outbound client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Whole request/response bounded (chat turns, embeddings).
    Total(Duration),
    /// SSE bodies: no overall deadline, only the gap between chunks.
    BetweenChunks(Duration),
}

impl Deadline {
    pub const CHAT: Self = Self::Total(Duration::from_secs(120));
    pub const EMBEDDING: Self = Self::Total(Duration::from_secs(10));
    pub const STREAM: Self = Self::BetweenChunks(Duration::from_secs(60));
}

pub fn build_client(deadline: Deadline) -> Client {
    let builder = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .tcp_keepalive(Duration::from_secs(60));
    let builder = match deadline {
        Deadline::Total(limit) => builder
            .timeout(limit)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90)),
        Deadline::BetweenChunks(gap) => builder.read_timeout(gap),
    };
    builder.build().unwrap_or_else(|e| {
        tracing::warn!("falling back to a default HTTP client: {e}");
        Client::new()
    })
}
