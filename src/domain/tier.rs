//! Cache tiers and per-tier configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One of the four independent cache tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// L1 - exact match on (normalized message, requester)
    Exact,
    /// L2 - semantic similarity over embeddings of past messages
    Semantic,
    /// L3 - intent-classification result keyed by message text
    Intent,
    /// L4 - retrieval result keyed by retrieval query
    Retrieval,
}

impl Tier {
    /// Stable label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Exact => "l1_exact",
            Tier::Semantic => "l2_semantic",
            Tier::Intent => "l3_intent",
            Tier::Retrieval => "l4_retrieval",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-tier configuration, loaded once at startup and immutable during the
/// process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierConfig {
    /// Whether this tier is probed and written
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Time-to-live for entries in seconds
    pub ttl_secs: u64,

    /// Probe deadline in milliseconds
    pub timeout_ms: u64,
}

fn default_enabled() -> bool {
    true
}

impl TierConfig {
    pub fn new(ttl_secs: u64, timeout_ms: u64) -> Self {
        Self {
            enabled: true,
            ttl_secs,
            timeout_ms,
        }
    }

    /// Get TTL as Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Get the probe deadline as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = ttl.as_secs();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Default for the exact tier: 1 hour TTL, 200ms deadline.
    pub fn exact_default() -> Self {
        Self::new(3600, 200)
    }

    /// Default for the semantic tier: 24 hour TTL, 500ms deadline.
    pub fn semantic_default() -> Self {
        Self::new(86_400, 500)
    }

    /// Default for the intent tier: 6 hour TTL, 200ms deadline.
    pub fn intent_default() -> Self {
        Self::new(21_600, 200)
    }

    /// Default for the retrieval tier: 12 hour TTL, 500ms deadline.
    pub fn retrieval_default() -> Self {
        Self::new(43_200, 500)
    }
}

/// Semantic tier configuration: the base tier settings plus the similarity
/// threshold, tunable per deployment without a code change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticTierConfig {
    #[serde(flatten)]
    pub tier: TierConfig,

    /// Minimum cosine similarity for a nearest-neighbor result to count as a
    /// hit. Inclusive boundary.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Maximum number of records held by the index
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_similarity_threshold() -> f32 {
    0.95
}

fn default_max_entries() -> usize {
    10_000
}

impl Default for SemanticTierConfig {
    fn default() -> Self {
        Self {
            tier: TierConfig::semantic_default(),
            similarity_threshold: default_similarity_threshold(),
            max_entries: default_max_entries(),
        }
    }
}

impl SemanticTierConfig {
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold.clamp(-1.0, 1.0);
        self
    }

    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_labels() {
        assert_eq!(Tier::Exact.label(), "l1_exact");
        assert_eq!(Tier::Semantic.label(), "l2_semantic");
        assert_eq!(Tier::Intent.label(), "l3_intent");
        assert_eq!(Tier::Retrieval.label(), "l4_retrieval");
    }

    #[test]
    fn test_tier_defaults() {
        let l1 = TierConfig::exact_default();
        assert_eq!(l1.ttl(), Duration::from_secs(3600));
        assert_eq!(l1.timeout(), Duration::from_millis(200));
        assert!(l1.enabled);

        let l2 = TierConfig::semantic_default();
        assert_eq!(l2.ttl(), Duration::from_secs(86_400));
        assert_eq!(l2.timeout(), Duration::from_millis(500));

        let l3 = TierConfig::intent_default();
        assert_eq!(l3.ttl(), Duration::from_secs(21_600));

        let l4 = TierConfig::retrieval_default();
        assert_eq!(l4.ttl(), Duration::from_secs(43_200));
    }

    #[test]
    fn test_semantic_defaults() {
        let config = SemanticTierConfig::default();
        assert!((config.similarity_threshold - 0.95).abs() < 0.001);
        assert_eq!(config.max_entries, 10_000);
    }

    #[test]
    fn test_threshold_clamped() {
        let config = SemanticTierConfig::default().with_similarity_threshold(1.5);
        assert!((config.similarity_threshold - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_builder() {
        let config = TierConfig::exact_default()
            .with_enabled(false)
            .with_ttl(Duration::from_secs(60))
            .with_timeout(Duration::from_millis(50));

        assert!(!config.enabled);
        assert_eq!(config.ttl_secs, 60);
        assert_eq!(config.timeout_ms, 50);
    }
}
