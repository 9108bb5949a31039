//! Multi-level response cache for conversational AI services
//!
//! Four independent tiers answer a lookup cooperatively:
//! - **L1 exact**: normalized message + requester, full response
//! - **L2 semantic**: embedding similarity over past messages, full response
//! - **L3 intent**: classification result keyed by message text
//! - **L4 retrieval**: retrieved snippets keyed by the retrieval query
//!
//! All four are probed concurrently with per-tier deadlines; simultaneous
//! hits resolve with fixed priority L1 > L3 > L4 > L2. Tier failures degrade
//! to misses, never to errors.
//!
//! ```no_run
//! use convo_cache::config::CacheSettings;
//! use convo_cache::domain::ResponsePayload;
//! use convo_cache::infrastructure::services::MultiLevelCacheService;
//!
//! # async fn run() -> Result<(), convo_cache::domain::CacheError> {
//! let settings = CacheSettings::load()
//!     .map_err(|e| convo_cache::domain::CacheError::configuration(e.to_string()))?;
//! let cache = MultiLevelCacheService::from_settings(settings).await?;
//!
//! cache
//!     .store(
//!         "What is your return policy?",
//!         "user-42",
//!         Some(ResponsePayload::new("Returns accepted within 14 days.")),
//!         None,
//!         None,
//!     )
//!     .await?;
//!
//! let result = cache.lookup("what is your return policy?", "user-42").await?;
//! assert!(result.is_full_hit());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::CacheSettings;
pub use domain::{
    CacheError, IntentPayload, LookupResult, MetricsSnapshot, ResponsePayload, RetrievalPayload,
    Tier,
};
pub use infrastructure::services::{MultiLevelCacheService, WarmEntry};
