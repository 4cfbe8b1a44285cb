pub mod embeddings;
pub mod guidelines;

pub use embeddings::{
    EmbeddingProvider, NoopEmbedding, OpenAiEmbedding, create_embedding_provider,
};
pub use guidelines::GuidelineRetriever;
