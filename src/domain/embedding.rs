//! Embedding provider seam
//!
//! The orchestrator computes a message embedding through this trait before
//! probing or populating the semantic tier. Providers are external
//! collaborators; only the interface lives here.

use std::fmt::Debug;

use async_trait::async_trait;

use super::error::CacheError;

/// Calculate cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched dimensionality or zero-magnitude vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Trait for embedding providers (OpenAI and compatible services).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CacheError>;

    /// Provider name for logs.
    fn provider_name(&self) -> &'static str;

    /// Embedding dimensionality this provider is configured for.
    fn dimensions(&self) -> usize;
}
