//! Infrastructure services

mod multi_level_cache_service;

pub use multi_level_cache_service::{MultiLevelCacheService, WarmEntry};
