use serde::{Deserialize, Serialize};

use crate::domain::metrics::CostModel;
use crate::domain::tier::{SemanticTierConfig, TierConfig};
use crate::infrastructure::store::StoreBackendSettings;

/// Top-level cache configuration
///
/// Loaded once at startup from `config/default`, `config/local` and
/// `CACHE__`-prefixed environment variables, in that order of precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// L1 exact-match tier
    #[serde(default = "TierConfig::exact_default")]
    pub l1: TierConfig,
    /// L2 semantic tier
    #[serde(default)]
    pub l2: SemanticTierConfig,
    /// L3 intent tier
    #[serde(default = "TierConfig::intent_default")]
    pub l3: TierConfig,
    /// L4 retrieval tier
    #[serde(default = "TierConfig::retrieval_default")]
    pub l4: TierConfig,
    /// Backend for the exact-match tiers
    #[serde(default)]
    pub backend: StoreBackendSettings,
    /// Embedding provider settings
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    /// Cost model for the savings accounting
    #[serde(default)]
    pub cost: CostModel,
    /// Maximum in-flight entries during warming
    #[serde(default = "default_warm_concurrency")]
    pub warm_concurrency: usize,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_warm_concurrency() -> usize {
    8
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            l1: TierConfig::exact_default(),
            l2: SemanticTierConfig::default(),
            l3: TierConfig::intent_default(),
            l4: TierConfig::retrieval_default(),
            backend: StoreBackendSettings::default(),
            embedding: EmbeddingSettings::default(),
            cost: CostModel::default(),
            warm_concurrency: default_warm_concurrency(),
            logging: LoggingConfig::default(),
        }
    }
}

impl CacheSettings {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("CACHE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Longest configured tier TTL, used as the backing stores' physical
    /// eviction horizon.
    pub fn max_ttl_secs(&self) -> u64 {
        self.l1
            .ttl_secs
            .max(self.l2.tier.ttl_secs)
            .max(self.l3.ttl_secs)
            .max(self.l4.ttl_secs)
    }
}

/// Embedding provider settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// API key for the embedding endpoint
    #[serde(default)]
    pub api_key: Option<String>,
    /// Embedding model name
    #[serde(default)]
    pub model: Option<String>,
    /// Base URL override for OpenAI-compatible gateways
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}
