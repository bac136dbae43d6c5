mod provider;


use async_trait::async_trait;

use crate::error::Result;

pub use provider::EmbeddingProvider;

/// Opaque vector-embedding oracle consumed by the pipeline.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one non-empty text, or fail.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed many texts, returning one vector per input in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
