//! Tier payloads and the cache entry envelope

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use super::tier::Tier;

/// A fully generated response, servable to the end user without running any
/// further pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePayload {
    /// Response text
    pub text: String,
    /// Model that generated the response, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Additional metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl ResponsePayload {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
            metadata: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// An entity extracted during intent classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    /// Entity kind (e.g. "order_id", "product")
    pub kind: String,
    /// Raw entity value
    pub value: String,
}

impl ExtractedEntity {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// Intent-classification result. Caching this skips the classification
/// sub-call even when the full response must be recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentPayload {
    /// Intent label (e.g. "order_status", "return_request")
    pub label: String,
    /// Classifier confidence in [0, 1]
    pub confidence: f32,
    /// Entities extracted from the message
    #[serde(default)]
    pub entities: Vec<ExtractedEntity>,
}

impl IntentPayload {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
            entities: Vec::new(),
        }
    }

    pub fn with_entity(mut self, entity: ExtractedEntity) -> Self {
        self.entities.push(entity);
        self
    }
}

/// A retrieved supporting snippet with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalSnippet {
    /// Snippet content
    pub content: String,
    /// Source document identifier
    pub source: String,
    /// Retrieval relevance score, if the retriever reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl RetrievalSnippet {
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            score: None,
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

/// Retrieval result. Caching this skips the retrieval sub-call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalPayload {
    /// The retrieval query the snippets were fetched for
    pub query: String,
    /// Retrieved supporting snippets
    pub snippets: Vec<RetrievalSnippet>,
}

impl RetrievalPayload {
    pub fn new(query: impl Into<String>, snippets: Vec<RetrievalSnippet>) -> Self {
        Self {
            query: query.into(),
            snippets,
        }
    }
}

/// Closed union over the payload shapes the tiers store.
///
/// Every read site matches exhaustively; a variant that does not match the
/// tier it was read from is treated as a malformed payload, not silently
/// coerced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TierPayload {
    FullResponse(ResponsePayload),
    IntentResult(IntentPayload),
    RetrievalResult(RetrievalPayload),
}

impl TierPayload {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TierPayload::FullResponse(_) => "full_response",
            TierPayload::IntentResult(_) => "intent_result",
            TierPayload::RetrievalResult(_) => "retrieval_result",
        }
    }
}

/// Envelope stored in the exact-match tiers.
///
/// `expires_at` is always `created_at + ttl`. An entry is logically absent
/// once `now >= expires_at` even if physically still stored; readers must
/// check `is_expired` because backing-store eviction is passive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Key the entry was stored under
    pub key: String,
    /// Tier-specific payload
    pub payload: TierPayload,
    /// Creation time, seconds since epoch
    pub created_at: u64,
    /// Expiry time, seconds since epoch
    pub expires_at: u64,
    /// Tier the entry was written for
    pub source_tier: Tier,
}

pub(crate) fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, payload: TierPayload, tier: Tier, ttl: Duration) -> Self {
        let now = epoch_secs();
        Self {
            key: key.into(),
            payload,
            created_at: now,
            expires_at: now + ttl.as_secs(),
            source_tier: tier,
        }
    }

    /// Check if the entry is logically expired.
    pub fn is_expired(&self) -> bool {
        epoch_secs() >= self.expires_at
    }
}
