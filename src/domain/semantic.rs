//! Semantic tier: vector records and the similarity index trait
//!
//! The semantic tier matches paraphrases rather than exact text. A record is
//! eligible as a hit only if its cosine similarity to the query embedding is
//! at or above the configured threshold; the boundary is inclusive.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::CacheError;
use super::payload::{epoch_secs, ResponsePayload};

/// A record in the semantic index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticRecord {
    /// Unique record identifier
    id: String,
    /// Embedding of the source message, fixed dimensionality per deployment
    embedding: Vec<f32>,
    /// Normalized source text the embedding was computed from
    source_text: String,
    /// The cached full response
    response: ResponsePayload,
    /// Creation time, seconds since epoch
    created_at: u64,
    /// Expiry time, seconds since epoch
    expires_at: u64,
    /// Times this record has been served as a hit
    hit_count: u32,
}

impl SemanticRecord {
    pub fn new(
        embedding: Vec<f32>,
        source_text: impl Into<String>,
        response: ResponsePayload,
        ttl: Duration,
    ) -> Self {
        let now = epoch_secs();
        Self {
            id: format!("sem:{}", uuid::Uuid::new_v4()),
            embedding,
            source_text: source_text.into(),
            response,
            created_at: now,
            expires_at: now + ttl.as_secs(),
            hit_count: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn response(&self) -> &ResponsePayload {
        &self.response
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    pub fn hit_count(&self) -> u32 {
        self.hit_count
    }

    pub fn is_expired(&self) -> bool {
        epoch_secs() >= self.expires_at
    }

    pub fn increment_hits(&mut self) {
        self.hit_count += 1;
    }

    #[cfg(test)]
    pub fn force_expired(&mut self) {
        self.expires_at = 0;
    }
}

/// Result of a nearest-neighbor search.
#[derive(Debug, Clone)]
pub struct SemanticSearchResult {
    /// The matching record
    pub record: SemanticRecord,
    /// Cosine similarity in [-1, 1]
    pub similarity: f32,
}

impl SemanticSearchResult {
    pub fn new(record: SemanticRecord, similarity: f32) -> Self {
        Self { record, similarity }
    }
}

/// Search parameters for a semantic lookup.
#[derive(Debug, Clone)]
pub struct SemanticSearchParams {
    /// Minimum similarity for a result to count as a hit (inclusive)
    pub min_similarity: f32,
    /// Maximum results to return
    pub limit: usize,
}

impl Default for SemanticSearchParams {
    fn default() -> Self {
        Self {
            min_similarity: 0.95,
            limit: 1,
        }
    }
}

impl SemanticSearchParams {
    pub fn new(min_similarity: f32) -> Self {
        Self {
            min_similarity,
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Similarity index backing the semantic tier.
#[async_trait]
pub trait SemanticIndex: Send + Sync + Debug {
    /// Search for similar records, best first, filtered by `min_similarity`
    /// (inclusive) and with expired records excluded.
    async fn search(
        &self,
        embedding: &[f32],
        params: &SemanticSearchParams,
    ) -> Result<Vec<SemanticSearchResult>, CacheError>;

    /// Most similar eligible record, if any.
    async fn find_similar(
        &self,
        embedding: &[f32],
        params: &SemanticSearchParams,
    ) -> Result<Option<SemanticSearchResult>, CacheError> {
        let results = self.search(embedding, params).await?;
        Ok(results.into_iter().next())
    }

    /// Insert a record.
    async fn insert(&self, record: SemanticRecord) -> Result<(), CacheError>;

    /// Delete records whose normalized source text matches, returning how
    /// many were removed. Used for content invalidation.
    async fn delete_by_source(&self, source_text: &str) -> Result<usize, CacheError>;

    /// Record that `id` was served as a hit.
    async fn record_hit(&self, id: &str) -> Result<(), CacheError>;

    /// Remove all records.
    async fn clear(&self) -> Result<(), CacheError>;

    /// Remove expired records, returning how many were removed.
    async fn cleanup_expired(&self) -> Result<usize, CacheError>;

    /// Number of records currently held.
    async fn len(&self) -> Result<usize, CacheError>;
}
