use thiserror::Error;

use super::tier::Tier;

/// Core cache errors
///
/// Tier-level failures (`TierTimeout`, `TierUnavailable`, `MalformedPayload`)
/// are recoverable: the orchestrator converts them to a non-hit for that tier
/// and logs them. They never reach the caller of `lookup` or `store`.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Tier {tier} timed out after {elapsed_ms}ms")]
    TierTimeout { tier: Tier, elapsed_ms: u64 },

    #[error("Tier {tier} unavailable: {message}")]
    TierUnavailable { tier: Tier, message: String },

    #[error("Malformed payload in tier {tier}: {message}")]
    MalformedPayload { tier: Tier, message: String },

    #[error("Embedding error: {message}")]
    Embedding { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CacheError {
    pub fn timeout(tier: Tier, elapsed_ms: u64) -> Self {
        Self::TierTimeout { tier, elapsed_ms }
    }

    pub fn unavailable(tier: Tier, message: impl Into<String>) -> Self {
        Self::TierUnavailable {
            tier,
            message: message.into(),
        }
    }

    pub fn malformed(tier: Tier, message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            tier,
            message: message.into(),
        }
    }

    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error is recoverable at the tier level (converted to a
    /// non-hit rather than propagated).
    pub fn is_tier_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TierTimeout { .. } | Self::TierUnavailable { .. } | Self::MalformedPayload { .. }
        )
    }
}
