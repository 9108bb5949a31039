//! Application configuration

mod cache_config;

pub use cache_config::{CacheSettings, EmbeddingSettings, LogFormat, LoggingConfig};
