//! Exact-match tier store implementations

mod factory;
mod in_memory;
mod redis;

pub use factory::{StoreBackend, StoreBackendSettings, StoreFactory, TierStores};
pub use in_memory::{InMemoryStore, InMemoryStoreConfig};
pub use redis::{RedisStore, RedisStoreConfig};
