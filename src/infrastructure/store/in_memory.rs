//! In-memory tier store implementation using moka

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use crate::domain::store::TierStore;
use crate::domain::tier::Tier;
use crate::domain::CacheError;

/// Configuration for the in-memory store
#[derive(Debug, Clone)]
pub struct InMemoryStoreConfig {
    /// Maximum number of entries
    pub max_capacity: u64,
    /// Upper-bound TTL applied by moka itself; per-entry expiry is tracked
    /// in the envelope and enforced on read
    pub default_ttl: Duration,
}

impl Default for InMemoryStoreConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            default_ttl: Duration::from_secs(86_400),
        }
    }
}

impl InMemoryStoreConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

/// Envelope stored in moka
#[derive(Debug, Clone)]
struct StoredValue {
    /// Serialized JSON value
    data: String,
    /// Expiration timestamp (millis since epoch)
    expires_at: u64,
}

/// Thread-safe in-memory tier store backed by moka.
///
/// Eviction at capacity is moka's; TTL expiry is passive and enforced on
/// read, so a physically present but expired entry is reported absent.
#[derive(Debug)]
pub struct InMemoryStore {
    tier: Tier,
    cache: MokaCache<String, StoredValue>,
}

impl InMemoryStore {
    /// Creates a store for the given tier with default configuration
    pub fn new(tier: Tier) -> Self {
        Self::with_config(tier, InMemoryStoreConfig::default())
    }

    /// Creates a store for the given tier with the given configuration
    pub fn with_config(tier: Tier, config: InMemoryStoreConfig) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.default_ttl)
            .build();

        Self { tier, cache }
    }

    fn current_time_millis() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn is_expired(value: &StoredValue) -> bool {
        Self::current_time_millis() >= value.expires_at
    }
}

#[async_trait]
impl TierStore for InMemoryStore {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self.cache.get(key).await {
            Some(value) => {
                if Self::is_expired(&value) {
                    self.cache.remove(key).await;
                    return Ok(None);
                }
                Ok(Some(value.data))
            }
            None => Ok(None),
        }
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let stored = StoredValue {
            data: value.to_string(),
            expires_at: Self::current_time_millis() + ttl.as_millis() as u64,
        };

        self.cache.insert(key.to_string(), stored).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let existed = self.cache.get(key).await.is_some();
        self.cache.remove(key).await;
        Ok(existed)
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
        let pattern_regex = format!("^{}$", regex::escape(pattern).replace(r"\*", ".*"));
        let regex = regex::Regex::new(&pattern_regex)
            .map_err(|e| CacheError::internal(format!("Invalid pattern: {}", e)))?;

        self.cache.run_pending_tasks().await;

        let cache_clone = self.cache.clone();
        let keys_to_delete: Vec<String> = tokio::task::spawn_blocking(move || {
            cache_clone
                .iter()
                .filter_map(|(k, _)| {
                    let key_str: &str = k.as_ref();
                    regex.is_match(key_str).then(|| key_str.to_string())
                })
                .collect()
        })
        .await
        .map_err(|e| {
            CacheError::unavailable(self.tier, format!("Failed to iterate store: {}", e))
        })?;

        let mut deleted = 0;
        for key in keys_to_delete {
            self.cache.remove(&key).await;
            deleted += 1;
        }

        Ok(deleted)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }

    async fn size(&self) -> Result<usize, CacheError> {
        self.cache.run_pending_tasks().await;
        Ok(self.cache.entry_count() as usize)
    }
}
