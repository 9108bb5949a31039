//! OpenAI-compatible embedding provider implementation

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::embedding::EmbeddingProvider;
use crate::domain::CacheError;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Known OpenAI embedding models and their dimensions
const EMBEDDING_MODELS: &[(&str, usize)] = &[
    ("text-embedding-3-small", 1536),
    ("text-embedding-3-large", 3072),
    ("text-embedding-ada-002", 1536),
];

/// Embedding provider backed by an OpenAI-compatible `/v1/embeddings`
/// endpoint.
#[derive(Debug)]
pub struct OpenAiEmbeddingProvider {
    client: reqwest::Client,
    auth_header: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbeddingProvider {
    /// Create a provider for the default model
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_model(api_key, DEFAULT_EMBEDDING_MODEL)
    }

    /// Create a provider for a specific model
    pub fn with_model(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        let dimensions = EMBEDDING_MODELS
            .iter()
            .find(|(name, _)| *name == model)
            .map(|(_, dims)| *dims)
            .unwrap_or(1536);

        Self {
            client: reqwest::Client::new(),
            auth_header: format!("Bearer {}", api_key.into()),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model,
            dimensions,
        }
    }

    /// Override the base URL (for compatible gateways and self-hosted
    /// endpoints)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn embeddings_url(&self) -> String {
        format!("{}/v1/embeddings", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
struct ApiEmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiEmbeddingResponse {
    data: Vec<ApiEmbeddingData>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CacheError> {
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });

        let response = self
            .client
            .post(self.embeddings_url())
            .header("Authorization", &self.auth_header)
            .json(&body)
            .send()
            .await
            .map_err(|e| CacheError::embedding(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(CacheError::embedding(format!(
                "Embedding endpoint returned {}",
                response.status()
            )));
        }

        let parsed: ApiEmbeddingResponse = response.json().await.map_err(|e| {
            CacheError::embedding(format!("Failed to parse embedding response: {}", e))
        })?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| CacheError::embedding("No embedding returned"))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_model_dimensions() {
        let provider = OpenAiEmbeddingProvider::with_model("key", "text-embedding-3-large");
        assert_eq!(provider.dimensions(), 3072);
    }

    #[test]
    fn test_unknown_model_defaults() {
        let provider = OpenAiEmbeddingProvider::with_model("key", "custom-model");
        assert_eq!(provider.dimensions(), 1536);
    }

    #[test]
    fn test_base_url_trimmed() {
        let provider =
            OpenAiEmbeddingProvider::new("key").with_base_url("https://gateway.internal/");
        assert_eq!(provider.embeddings_url(), "https://gateway.internal/v1/embeddings");
    }
}
