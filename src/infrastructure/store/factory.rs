//! Store factory for runtime backend selection

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::store::TierStore;
use crate::domain::tier::Tier;
use crate::domain::CacheError;

use super::in_memory::{InMemoryStore, InMemoryStoreConfig};
use super::redis::RedisStore;

/// Supported exact-tier backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// In-memory store using moka
    #[default]
    InMemory,
    /// Redis store
    Redis,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::InMemory => write!(f, "in_memory"),
            StoreBackend::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(StoreBackend::InMemory),
            "redis" => Ok(StoreBackend::Redis),
            _ => Err(CacheError::configuration(format!(
                "Unknown store backend: {}. Valid backends: in_memory, redis",
                s
            ))),
        }
    }
}

/// Backend settings shared by the three exact-match tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreBackendSettings {
    /// Which backend to use
    #[serde(default)]
    pub backend: StoreBackend,
    /// Redis URL (required for the redis backend)
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Maximum entries per tier (in-memory backend)
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

fn default_max_capacity() -> u64 {
    10_000
}

impl Default for StoreBackendSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            redis_url: None,
            max_capacity: default_max_capacity(),
        }
    }
}

/// The L1/L3/L4 stores produced by the factory.
#[derive(Debug, Clone)]
pub struct TierStores {
    pub exact: Arc<dyn TierStore>,
    pub intent: Arc<dyn TierStore>,
    pub retrieval: Arc<dyn TierStore>,
}

/// Factory building one store per exact-match tier.
#[derive(Debug, Default)]
pub struct StoreFactory;

impl StoreFactory {
    pub fn new() -> Self {
        Self
    }

    /// Builds the three exact-tier stores. The Redis backend shares a single
    /// connection manager across tiers, namespaced by tier label.
    pub async fn create(
        &self,
        settings: &StoreBackendSettings,
        max_ttl: Duration,
    ) -> Result<TierStores, CacheError> {
        match settings.backend {
            StoreBackend::InMemory => {
                let config = InMemoryStoreConfig::default()
                    .with_max_capacity(settings.max_capacity)
                    .with_default_ttl(max_ttl);

                Ok(TierStores {
                    exact: Arc::new(InMemoryStore::with_config(Tier::Exact, config.clone())),
                    intent: Arc::new(InMemoryStore::with_config(Tier::Intent, config.clone())),
                    retrieval: Arc::new(InMemoryStore::with_config(Tier::Retrieval, config)),
                })
            }
            StoreBackend::Redis => {
                let url = settings.redis_url.clone().ok_or_else(|| {
                    CacheError::configuration("Redis URL is required for the redis backend")
                })?;

                let client = redis::Client::open(url.as_str()).map_err(|e| {
                    CacheError::configuration(format!("Invalid Redis URL: {}", e))
                })?;
                let connection =
                    redis::aio::ConnectionManager::new(client)
                        .await
                        .map_err(|e| {
                            CacheError::unavailable(
                                Tier::Exact,
                                format!("Failed to connect to Redis: {}", e),
                            )
                        })?;

                Ok(TierStores {
                    exact: Arc::new(RedisStore::with_connection(
                        Tier::Exact,
                        connection.clone(),
                        Tier::Exact.label(),
                    )),
                    intent: Arc::new(RedisStore::with_connection(
                        Tier::Intent,
                        connection.clone(),
                        Tier::Intent.label(),
                    )),
                    retrieval: Arc::new(RedisStore::with_connection(
                        Tier::Retrieval,
                        connection,
                        Tier::Retrieval.label(),
                    )),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::store::TierStoreExt;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("in_memory".parse::<StoreBackend>().unwrap(), StoreBackend::InMemory);
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::InMemory);
        assert_eq!("redis".parse::<StoreBackend>().unwrap(), StoreBackend::Redis);
        assert_eq!("REDIS".parse::<StoreBackend>().unwrap(), StoreBackend::Redis);
        assert!("invalid".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_backend_display() {
        assert_eq!(StoreBackend::InMemory.to_string(), "in_memory");
        assert_eq!(StoreBackend::Redis.to_string(), "redis");
    }

    #[tokio::test]
    async fn test_factory_create_in_memory() {
        let factory = StoreFactory::new();
        let stores = factory
            .create(&StoreBackendSettings::default(), Duration::from_secs(3600))
            .await
            .unwrap();

        stores
            .exact
            .set(Tier::Exact, "k", &"v".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = stores.exact.get(Tier::Exact, "k").await.unwrap();
        assert_eq!(result, Some("v".to_string()));

        // Tiers are independent stores
        let result: Option<String> = stores.intent.get(Tier::Intent, "k").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_factory_redis_missing_url() {
        let factory = StoreFactory::new();
        let settings = StoreBackendSettings {
            backend: StoreBackend::Redis,
            redis_url: None,
            max_capacity: 100,
        };

        let result = factory.create(&settings, Duration::from_secs(60)).await;
        assert!(matches!(result, Err(CacheError::Configuration { .. })));
    }
}
