//! Embedding client abstraction.

use ward_core::{AppError, AppResult};

/// Trait for embedding providers.
///
/// Abstracts the hosted (or offline) model that turns text into vectors
/// for the hybrid search procedure.
#[async_trait::async_trait]
pub trait EmbeddingClient: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "openai", "hash")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}
