//! Domain layer - cache entities, traits, and pure logic

pub mod embedding;
pub mod error;
pub mod key;
pub mod lookup;
pub mod metrics;
pub mod payload;
pub mod semantic;
pub mod store;
pub mod tier;

pub use embedding::{cosine_similarity, EmbeddingProvider};
pub use error::CacheError;
pub use key::{normalize, CacheKey};
pub use lookup::LookupResult;
pub use metrics::{CacheMetrics, CostModel, MetricsSnapshot, TierSnapshot};
pub use payload::{
    CacheEntry, ExtractedEntity, IntentPayload, ResponsePayload, RetrievalPayload,
    RetrievalSnippet, TierPayload,
};
pub use semantic::{SemanticIndex, SemanticRecord, SemanticSearchParams, SemanticSearchResult};
pub use store::{TierStore, TierStoreExt};
pub use tier::{SemanticTierConfig, Tier, TierConfig};

#[cfg(test)]
pub use embedding::mock::MockEmbeddingProvider;
#[cfg(test)]
pub use store::mock::MockTierStore;
