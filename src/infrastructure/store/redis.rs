//! Redis tier store implementation

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::domain::store::TierStore;
use crate::domain::tier::Tier;
use crate::domain::CacheError;

/// Configuration for the Redis store
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing (typically the tier label)
    pub key_prefix: Option<String>,
}

impl RedisStoreConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key_prefix: None,
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }
}

/// Redis-backed tier store.
///
/// TTL enforcement is native (`SET EX`); pattern deletion uses SCAN rather
/// than KEYS so large keyspaces do not block the server.
#[derive(Clone)]
pub struct RedisStore {
    tier: Tier,
    connection: ConnectionManager,
    config: RedisStoreConfig,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("tier", &self.tier)
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisStore {
    /// Creates a new Redis store connection
    pub async fn new(tier: Tier, config: RedisStoreConfig) -> Result<Self, CacheError> {
        let client = Client::open(config.url.as_str()).map_err(|e| {
            CacheError::unavailable(tier, format!("Failed to create Redis client: {}", e))
        })?;

        let connection = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::unavailable(tier, format!("Failed to connect to Redis: {}", e))
        })?;

        Ok(Self {
            tier,
            connection,
            config,
        })
    }

    /// Creates a store sharing an existing connection, with a tier-specific
    /// key prefix.
    pub fn with_connection(tier: Tier, connection: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self {
            tier,
            connection,
            config: RedisStoreConfig {
                url: String::new(),
                key_prefix: Some(prefix.into()),
            },
        }
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }

    fn store_err(&self, op: &str, key: &str, e: redis::RedisError) -> CacheError {
        CacheError::unavailable(self.tier, format!("Failed to {} key '{}': {}", op, key, e))
    }
}

#[async_trait]
impl TierStore for RedisStore {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let result: Option<String> = conn
            .get(&prefixed_key)
            .await
            .map_err(|e| self.store_err("get", key, e))?;

        Ok(result)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let ttl_secs = ttl.as_secs().max(1);

        let _: () = conn
            .set_ex(&prefixed_key, value, ttl_secs)
            .await
            .map_err(|e| self.store_err("set", key, e))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let deleted: i32 = conn
            .del(&prefixed_key)
            .await
            .map_err(|e| self.store_err("delete", key, e))?;

        Ok(deleted > 0)
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
        let prefixed_pattern = self.prefix_key(pattern);
        let mut conn = self.connection.clone();

        let mut cursor = 0u64;
        let mut total_deleted = 0usize;

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&prefixed_pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(|e| self.store_err("scan pattern", pattern, e))?;

            if !keys.is_empty() {
                let deleted: i32 = conn
                    .del(&keys)
                    .await
                    .map_err(|e| self.store_err("delete matched", pattern, e))?;
                total_deleted += deleted as usize;
            }

            cursor = new_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(total_deleted)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        // Only ever clear this store's namespace
        self.delete_pattern("*").await?;
        Ok(())
    }

    async fn size(&self) -> Result<usize, CacheError> {
        let pattern = self.prefix_key("*");
        let mut conn = self.connection.clone();

        let mut cursor = 0u64;
        let mut count = 0usize;

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(1000)
                .query_async(&mut conn)
                .await
                .map_err(|e| self.store_err("scan", "*", e))?;

            count += keys.len();
            cursor = new_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests require a running Redis instance; run with --ignored.

    fn get_test_config() -> RedisStoreConfig {
        RedisStoreConfig::new("redis://127.0.0.1:6379").with_key_prefix("convo-cache-test")
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_set_and_get() {
        let store = RedisStore::new(Tier::Exact, get_test_config()).await.unwrap();

        store
            .set_raw("key1", "\"value1\"", Duration::from_secs(60))
            .await
            .unwrap();

        let result = store.get_raw("key1").await.unwrap();
        assert_eq!(result, Some("\"value1\"".to_string()));

        store.delete("key1").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_delete_pattern() {
        let store = RedisStore::new(Tier::Exact, get_test_config()).await.unwrap();

        store
            .set_raw("exact:m:u1", "{}", Duration::from_secs(60))
            .await
            .unwrap();
        store
            .set_raw("exact:m:u2", "{}", Duration::from_secs(60))
            .await
            .unwrap();

        let deleted = store.delete_pattern("exact:m:*").await.unwrap();
        assert_eq!(deleted, 2);
    }

    #[test]
    fn test_key_prefix() {
        let config = RedisStoreConfig::new("redis://localhost").with_key_prefix("l1");
        assert_eq!(config.key_prefix, Some("l1".to_string()));
    }
}
