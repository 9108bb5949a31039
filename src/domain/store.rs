//! Exact-match tier store trait
//!
//! Backs the L1/L3/L4 tiers. Raw operations use JSON strings to stay
//! dyn-compatible; `TierStoreExt` layers typed access on top.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use super::error::CacheError;
use super::tier::Tier;

/// Key-value contract for the exact-match tiers: O(1) expected lookup,
/// per-entry TTL, pattern deletion for invalidation.
#[async_trait]
pub trait TierStore: Send + Sync + Debug {
    /// Gets a raw JSON value
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Sets a raw JSON value with a TTL
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Deletes a key, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Deletes all keys matching a glob-style pattern (`*` wildcard)
    async fn delete_pattern(&self, pattern: &str) -> Result<usize, CacheError>;

    /// Removes all entries
    async fn clear(&self) -> Result<(), CacheError>;

    /// Approximate number of entries
    async fn size(&self) -> Result<usize, CacheError>;
}

/// Typed get/set over the raw JSON operations.
pub trait TierStoreExt: TierStore {
    /// Gets and deserializes a value. A value that fails to deserialize is a
    /// `MalformedPayload` error attributed to `tier`.
    fn get<'a, V>(
        &'a self,
        tier: Tier,
        key: &'a str,
    ) -> impl std::future::Future<Output = Result<Option<V>, CacheError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            match self.get_raw(key).await? {
                Some(data) => {
                    let value: V = serde_json::from_str(&data)
                        .map_err(|e| CacheError::malformed(tier, e.to_string()))?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    /// Serializes and sets a value with a TTL.
    fn set<'a, V>(
        &'a self,
        tier: Tier,
        key: &'a str,
        value: &'a V,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<(), CacheError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_string(value)
                .map_err(|e| CacheError::malformed(tier, e.to_string()))?;
            self.set_raw(key, &data, ttl).await
        }
    }
}

impl<T: TierStore + ?Sized> TierStoreExt for T {}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory mock store with injectable failure and artificial latency,
    /// for orchestrator and degradation tests.
    #[derive(Debug, Default)]
    pub struct MockTierStore {
        entries: Mutex<HashMap<String, String>>,
        error: Mutex<Option<String>>,
        delay: Mutex<Option<Duration>>,
    }

    impl MockTierStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every operation fails with `TierUnavailable`.
        pub fn with_error(self, error: impl Into<String>) -> Self {
            *self.error.lock().unwrap() = Some(error.into());
            self
        }

        /// Every operation sleeps first, to simulate a slow backend.
        pub fn with_delay(self, delay: Duration) -> Self {
            *self.delay.lock().unwrap() = Some(delay);
            self
        }

        async fn simulate(&self) -> Result<(), CacheError> {
            let delay = *self.delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let error = self.error.lock().unwrap().clone();
            if let Some(error) = error {
                return Err(CacheError::unavailable(Tier::Exact, error));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TierStore for MockTierStore {
        async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
            self.simulate().await?;
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set_raw(&self, key: &str, value: &str, _ttl: Duration) -> Result<(), CacheError> {
            self.simulate().await?;
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<bool, CacheError> {
            self.simulate().await?;
            Ok(self.entries.lock().unwrap().remove(key).is_some())
        }

        async fn delete_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
            self.simulate().await?;
            let regex = regex::Regex::new(&format!("^{}$", regex::escape(pattern).replace(r"\*", ".*")))
                .map_err(|e| CacheError::internal(e.to_string()))?;

            let mut entries = self.entries.lock().unwrap();
            let keys: Vec<String> = entries
                .keys()
                .filter(|k| regex.is_match(k))
                .cloned()
                .collect();
            let count = keys.len();
            for key in keys {
                entries.remove(&key);
            }
            Ok(count)
        }

        async fn clear(&self) -> Result<(), CacheError> {
            self.simulate().await?;
            self.entries.lock().unwrap().clear();
            Ok(())
        }

        async fn size(&self) -> Result<usize, CacheError> {
            self.simulate().await?;
            Ok(self.entries.lock().unwrap().len())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_set_get() {
            let store = MockTierStore::new();
            store
                .set(Tier::Exact, "k", &"v".to_string(), Duration::from_secs(60))
                .await
                .unwrap();

            let got: Option<String> = store.get(Tier::Exact, "k").await.unwrap();
            assert_eq!(got, Some("v".to_string()));
        }

        #[tokio::test]
        async fn test_mock_error() {
            let store = MockTierStore::new().with_error("down");
            let result: Result<Option<String>, _> = store.get(Tier::Exact, "k").await;
            assert!(result.is_err());
        }

        #[tokio::test]
        async fn test_mock_malformed_payload() {
            let store = MockTierStore::new();
            store
                .set_raw("k", "not json {", Duration::from_secs(60))
                .await
                .unwrap();

            let result: Result<Option<Vec<u32>>, _> = store.get(Tier::Intent, "k").await;
            assert!(matches!(
                result,
                Err(CacheError::MalformedPayload { tier: Tier::Intent, .. })
            ));
        }

        #[tokio::test]
        async fn test_mock_delete_pattern() {
            let store = MockTierStore::new();
            for key in ["exact:a:1", "exact:a:2", "exact:b:1"] {
                store.set_raw(key, "{}", Duration::from_secs(60)).await.unwrap();
            }

            let deleted = store.delete_pattern("exact:a:*").await.unwrap();
            assert_eq!(deleted, 2);
            assert_eq!(store.size().await.unwrap(), 1);
        }
    }
}
