//! Cache metrics accumulator
//!
//! Per-tier counters are independent atomics updated with relaxed ordering so
//! concurrent lookups never serialize through a lock. Derived values (hit
//! rates, averages, cost saved) are computed on read in `snapshot`, which
//! never blocks writers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::tier::Tier;

/// Estimated per-request pipeline costs used for the savings accounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostModel {
    /// Cost of answering a request through the full pipeline, USD
    #[serde(default = "default_uncached_cost")]
    pub uncached_cost_usd: f64,
    /// Cost of serving a request from cache, USD
    #[serde(default = "default_cached_cost")]
    pub cached_cost_usd: f64,
}

fn default_uncached_cost() -> f64 {
    0.012
}

fn default_cached_cost() -> f64 {
    0.0002
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            uncached_cost_usd: default_uncached_cost(),
            cached_cost_usd: default_cached_cost(),
        }
    }
}

impl CostModel {
    /// Savings of one full hit versus a full pipeline run.
    pub fn saved_per_hit(&self) -> f64 {
        (self.uncached_cost_usd - self.cached_cost_usd).max(0.0)
    }
}

#[derive(Debug, Default)]
struct TierCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    latency_micros: AtomicU64,
}

impl TierCounters {
    fn record(&self, hit: bool, latency: Duration) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        self.latency_micros
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
    }

    fn snapshot(&self) -> TierSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let probes = hits + misses;
        let latency_micros = self.latency_micros.load(Ordering::Relaxed);

        TierSnapshot {
            hits,
            misses,
            hit_rate: if probes == 0 {
                0.0
            } else {
                hits as f64 / probes as f64
            },
            avg_latency_ms: if probes == 0 {
                0.0
            } else {
                latency_micros as f64 / probes as f64 / 1000.0
            },
        }
    }
}

/// Lock-free accumulator, created at orchestrator construction and reset only
/// on process restart.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    exact: TierCounters,
    semantic: TierCounters,
    intent: TierCounters,
    retrieval: TierCounters,
    lookups: AtomicU64,
    full_hits: AtomicU64,
    partial_hits: AtomicU64,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn tier(&self, tier: Tier) -> &TierCounters {
        match tier {
            Tier::Exact => &self.exact,
            Tier::Semantic => &self.semantic,
            Tier::Intent => &self.intent,
            Tier::Retrieval => &self.retrieval,
        }
    }

    /// Record the outcome and latency of one tier probe.
    pub fn record_probe(&self, tier: Tier, hit: bool, latency: Duration) {
        self.tier(tier).record(hit, latency);
    }

    /// Record one completed lookup call.
    pub fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    /// Record that a lookup resolved to a full hit.
    pub fn record_full_hit(&self) {
        self.full_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record that a lookup resolved to a partial hit.
    pub fn record_partial_hit(&self) {
        self.partial_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time view with derived rates. Counters keep moving while the
    /// snapshot is taken; per-tier values are individually consistent.
    pub fn snapshot(&self, cost: &CostModel) -> MetricsSnapshot {
        let lookups = self.lookups.load(Ordering::Relaxed);
        let full_hits = self.full_hits.load(Ordering::Relaxed);
        let partial_hits = self.partial_hits.load(Ordering::Relaxed);

        MetricsSnapshot {
            l1: self.exact.snapshot(),
            l2: self.semantic.snapshot(),
            l3: self.intent.snapshot(),
            l4: self.retrieval.snapshot(),
            lookups,
            full_hits,
            partial_hits,
            combined_hit_rate: if lookups == 0 {
                0.0
            } else {
                (full_hits + partial_hits) as f64 / lookups as f64
            },
            cost_saved_usd: full_hits as f64 * cost.saved_per_hit(),
        }
    }
}

/// Per-tier view in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierSnapshot {
    pub hits: u64,
    pub misses: u64,
    /// hits / (hits + misses), 0.0 when unprobed
    pub hit_rate: f64,
    /// Average probe latency in milliseconds
    pub avg_latency_ms: f64,
}

/// Point-in-time metrics view, polled by external monitoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub l1: TierSnapshot,
    pub l2: TierSnapshot,
    pub l3: TierSnapshot,
    pub l4: TierSnapshot,
    /// Total lookup calls
    pub lookups: u64,
    /// Lookups resolved as full hits
    pub full_hits: u64,
    /// Lookups resolved as partial hits
    pub partial_hits: u64,
    /// (full + partial hits) / lookups
    pub combined_hit_rate: f64,
    /// Cumulative estimated savings, USD
    pub cost_saved_usd: f64,
}
