//! Multi-level cache orchestrator
//!
//! Probes the four tiers concurrently on every lookup, resolves simultaneous
//! hits with fixed priority L1 > L3 > L4 > L2, and populates all applicable
//! tiers on store. All four probes are awaited to completion before
//! resolution, so the outcome is deterministic for a fixed store state
//! rather than dependent on which backend answered first.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::config::CacheSettings;
use crate::domain::key::{normalize, CacheKey};
use crate::domain::lookup::LookupResult;
use crate::domain::payload::{
    CacheEntry, IntentPayload, ResponsePayload, RetrievalPayload, TierPayload,
};
use crate::domain::semantic::{SemanticIndex, SemanticRecord, SemanticSearchParams, SemanticSearchResult};
use crate::domain::store::{TierStore, TierStoreExt};
use crate::domain::tier::{Tier, TierConfig};
use crate::domain::{CacheError, CacheMetrics, EmbeddingProvider, MetricsSnapshot};
use crate::infrastructure::embedding::OpenAiEmbeddingProvider;
use crate::infrastructure::semantic::InMemorySemanticIndex;
use crate::infrastructure::store::{StoreFactory, TierStores};

/// A known (message, requester, response) triple for startup warming.
#[derive(Debug, Clone)]
pub struct WarmEntry {
    pub message: String,
    pub requester_id: String,
    pub response: ResponsePayload,
}

impl WarmEntry {
    pub fn new(
        message: impl Into<String>,
        requester_id: impl Into<String>,
        response: ResponsePayload,
    ) -> Self {
        Self {
            message: message.into(),
            requester_id: requester_id.into(),
            response,
        }
    }
}

/// Outcome of one tier probe, before payload extraction.
struct ProbeOutcome {
    payload: Option<TierPayload>,
    elapsed: Duration,
}

/// The multi-level cache service.
///
/// Owns no entry memory beyond its call stack: payloads are copied into and
/// out of the backing stores at call boundaries, and each store owns its
/// entries' physical lifetime. The only shared mutable state is the lock-free
/// metrics accumulator.
#[derive(Debug)]
pub struct MultiLevelCacheService {
    exact: Arc<dyn TierStore>,
    intent: Arc<dyn TierStore>,
    retrieval: Arc<dyn TierStore>,
    semantic: Arc<dyn SemanticIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    settings: CacheSettings,
    metrics: Arc<CacheMetrics>,
}

impl MultiLevelCacheService {
    pub fn new(
        stores: TierStores,
        semantic: Arc<dyn SemanticIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        settings: CacheSettings,
    ) -> Self {
        Self {
            exact: stores.exact,
            intent: stores.intent,
            retrieval: stores.retrieval,
            semantic,
            embedder,
            settings,
            metrics: Arc::new(CacheMetrics::new()),
        }
    }

    /// Wire a service from settings alone: factory-selected exact stores,
    /// the in-memory semantic index, and an OpenAI-compatible embedding
    /// provider.
    pub async fn from_settings(settings: CacheSettings) -> Result<Self, CacheError> {
        let stores = StoreFactory::new()
            .create(
                &settings.backend,
                Duration::from_secs(settings.max_ttl_secs()),
            )
            .await?;

        let api_key = settings
            .embedding
            .api_key
            .clone()
            .ok_or_else(|| CacheError::configuration("Embedding API key is required"))?;
        let mut provider = match &settings.embedding.model {
            Some(model) => OpenAiEmbeddingProvider::with_model(api_key, model.clone()),
            None => OpenAiEmbeddingProvider::new(api_key),
        };
        if let Some(base_url) = &settings.embedding.base_url {
            provider = provider.with_base_url(base_url.clone());
        }

        let semantic = InMemorySemanticIndex::new(settings.l2.max_entries);

        Ok(Self::new(
            stores,
            Arc::new(semantic),
            Arc::new(provider),
            settings,
        ))
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Probe all four tiers for `message` and resolve to the best available
    /// result.
    ///
    /// The only error this returns is `Validation` for a message that is
    /// empty after normalization. Tier timeouts and failures degrade to
    /// non-hits for that tier alone; with every tier down this returns
    /// `Miss` within the bound of the configured per-tier deadlines.
    pub async fn lookup(
        &self,
        message: &str,
        requester_id: &str,
    ) -> Result<LookupResult, CacheError> {
        let normalized = normalize(message);
        if normalized.is_empty() {
            return Err(CacheError::validation("message is empty after normalization"));
        }

        let exact_key = CacheKey::exact(message, requester_id);
        let intent_key = CacheKey::intent(message);
        let retrieval_key = CacheKey::retrieval(message);

        self.metrics.record_lookup();

        // All four probes run concurrently and are all awaited; resolution
        // happens only after the slowest probe completes or times out.
        let (l1, l2, l3, l4) = tokio::join!(
            self.probe_exact(&exact_key),
            self.probe_semantic(&normalized),
            self.probe_intent(&intent_key),
            self.probe_retrieval(&retrieval_key),
        );

        // Fixed priority: exact full response, then partial results (intent
        // before retrieval by pipeline order), then the semantic match,
        // which carries approximation risk.
        let result = if let Some(response) = l1 {
            LookupResult::FullHit {
                response,
                tier: Tier::Exact,
                similarity: None,
            }
        } else if l3.is_some() || l4.is_some() {
            LookupResult::PartialHit {
                intent: l3,
                retrieval: l4,
            }
        } else if let Some((response, similarity)) = l2 {
            LookupResult::FullHit {
                response,
                tier: Tier::Semantic,
                similarity: Some(similarity),
            }
        } else {
            LookupResult::Miss
        };

        match &result {
            LookupResult::FullHit { tier, .. } => {
                self.metrics.record_full_hit();
                counter!("cache_lookups_total", "outcome" => "full_hit").increment(1);
                debug!(tier = %tier, "full cache hit");
            }
            LookupResult::PartialHit { intent, retrieval } => {
                self.metrics.record_partial_hit();
                counter!("cache_lookups_total", "outcome" => "partial_hit").increment(1);
                debug!(
                    intent = intent.is_some(),
                    retrieval = retrieval.is_some(),
                    "partial cache hit"
                );
            }
            LookupResult::Miss => {
                counter!("cache_lookups_total", "outcome" => "miss").increment(1);
            }
        }

        Ok(result)
    }

    /// Populate every applicable tier with the pipeline's artifacts.
    ///
    /// Each tier write is independent and best-effort: a failed write is
    /// logged and does not affect the other tiers or the caller, who already
    /// has the answer in hand.
    pub async fn store(
        &self,
        message: &str,
        requester_id: &str,
        response: Option<ResponsePayload>,
        intent: Option<IntentPayload>,
        retrieval: Option<RetrievalPayload>,
    ) -> Result<(), CacheError> {
        let normalized = normalize(message);
        if normalized.is_empty() {
            return Err(CacheError::validation("message is empty after normalization"));
        }

        tokio::join!(
            self.write_exact(message, requester_id, response.as_ref()),
            self.write_semantic(&normalized, response.as_ref()),
            self.write_intent(message, intent.as_ref()),
            self.write_retrieval(retrieval.as_ref()),
        );

        Ok(())
    }

    /// Bulk-load known (message, requester, response) pairs, bounded by the
    /// configured warming concurrency. Invoked once at startup before the
    /// first real request.
    pub async fn warm(&self, pairs: Vec<WarmEntry>) {
        use futures::stream::{self, StreamExt};

        let total = pairs.len();
        stream::iter(pairs)
            .for_each_concurrent(self.settings.warm_concurrency, |pair| async move {
                if let Err(e) = self
                    .store(
                        &pair.message,
                        &pair.requester_id,
                        Some(pair.response),
                        None,
                        None,
                    )
                    .await
                {
                    warn!(error = %e, "failed to warm cache entry");
                }
            })
            .await;

        info!(count = total, "cache warming complete");
    }

    /// Remove cached results derived from `message` across the tiers: the L1
    /// entry for every requester (via pattern deletion), the L3/L4 entries
    /// for the normalized text, and semantic records embedded from it.
    ///
    /// Best-effort per tier; returns the number of entries removed. A
    /// retrieval entry keyed by a query derived from (rather than equal to)
    /// the message is not reachable from here and falls back to TTL expiry.
    pub async fn invalidate(&self, message: &str) -> Result<usize, CacheError> {
        let normalized = normalize(message);
        if normalized.is_empty() {
            return Err(CacheError::validation("message is empty after normalization"));
        }

        let mut removed = 0usize;

        match self.exact.delete_pattern(&CacheKey::exact_pattern(message)).await {
            Ok(n) => removed += n,
            Err(e) => warn!(tier = %Tier::Exact, error = %e, "invalidation failed"),
        }

        match self.intent.delete(CacheKey::intent(message).as_str()).await {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(e) => warn!(tier = %Tier::Intent, error = %e, "invalidation failed"),
        }

        match self.retrieval.delete(CacheKey::retrieval(message).as_str()).await {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(e) => warn!(tier = %Tier::Retrieval, error = %e, "invalidation failed"),
        }

        match self.semantic.delete_by_source(&normalized).await {
            Ok(n) => removed += n,
            Err(e) => warn!(tier = %Tier::Semantic, error = %e, "invalidation failed"),
        }

        info!(removed, "cache invalidated for message");
        Ok(removed)
    }

    /// Point-in-time metrics view. Never blocks concurrent lookups/stores.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot(&self.settings.cost)
    }

    /// Remove expired semantic records. The exact tiers expire passively.
    pub async fn cleanup_expired(&self) -> Result<usize, CacheError> {
        self.semantic.cleanup_expired().await
    }

    // --- probes ---

    async fn probe_exact(&self, key: &CacheKey) -> Option<ResponsePayload> {
        let outcome = self
            .probe_store(&self.exact, Tier::Exact, &self.settings.l1, key)
            .await?;

        let extracted = match outcome.payload {
            Some(TierPayload::FullResponse(response)) => Some(response),
            Some(other) => {
                warn!(tier = %Tier::Exact, kind = other.kind(), "unexpected payload kind");
                None
            }
            None => None,
        };

        self.finish_probe(Tier::Exact, extracted.is_some(), outcome.elapsed);
        extracted
    }

    async fn probe_intent(&self, key: &CacheKey) -> Option<IntentPayload> {
        let outcome = self
            .probe_store(&self.intent, Tier::Intent, &self.settings.l3, key)
            .await?;

        let extracted = match outcome.payload {
            Some(TierPayload::IntentResult(intent)) => Some(intent),
            Some(other) => {
                warn!(tier = %Tier::Intent, kind = other.kind(), "unexpected payload kind");
                None
            }
            None => None,
        };

        self.finish_probe(Tier::Intent, extracted.is_some(), outcome.elapsed);
        extracted
    }

    async fn probe_retrieval(&self, key: &CacheKey) -> Option<RetrievalPayload> {
        let outcome = self
            .probe_store(&self.retrieval, Tier::Retrieval, &self.settings.l4, key)
            .await?;

        let extracted = match outcome.payload {
            Some(TierPayload::RetrievalResult(retrieval)) => Some(retrieval),
            Some(other) => {
                warn!(tier = %Tier::Retrieval, kind = other.kind(), "unexpected payload kind");
                None
            }
            None => None,
        };

        self.finish_probe(Tier::Retrieval, extracted.is_some(), outcome.elapsed);
        extracted
    }

    /// Shared probe plumbing for the exact-match tiers: deadline, error
    /// conversion to a non-hit, and passive-expiry enforcement.
    ///
    /// Returns `None` without recording anything when the tier is disabled.
    async fn probe_store(
        &self,
        store: &Arc<dyn TierStore>,
        tier: Tier,
        config: &TierConfig,
        key: &CacheKey,
    ) -> Option<ProbeOutcome> {
        if !config.enabled {
            return None;
        }

        let started = Instant::now();
        let outcome = tokio::time::timeout(
            config.timeout(),
            store.get::<CacheEntry>(tier, key.as_str()),
        )
        .await;
        let elapsed = started.elapsed();

        let payload = match outcome {
            Err(_) => {
                let err = CacheError::timeout(tier, elapsed.as_millis() as u64);
                warn!(tier = %tier, error = %err, "tier probe timed out");
                None
            }
            Ok(Err(e)) => {
                warn!(tier = %tier, error = %e, elapsed_ms = elapsed.as_millis() as u64, "tier probe failed");
                None
            }
            Ok(Ok(None)) => None,
            Ok(Ok(Some(entry))) => {
                if entry.is_expired() {
                    debug!(tier = %tier, "discarding expired entry");
                    None
                } else {
                    Some(entry.payload)
                }
            }
        };

        Some(ProbeOutcome { payload, elapsed })
    }

    async fn probe_semantic(&self, normalized: &str) -> Option<(ResponsePayload, f32)> {
        let config = &self.settings.l2;
        if !config.tier.enabled {
            return None;
        }

        let started = Instant::now();
        // The embedding call happens inside the tier deadline: a slow
        // embedding provider must not stall the lookup past L2's budget.
        let outcome = tokio::time::timeout(
            config.tier.timeout(),
            self.semantic_search(normalized, config.similarity_threshold),
        )
        .await;
        let elapsed = started.elapsed();

        let found = match outcome {
            Err(_) => {
                let err = CacheError::timeout(Tier::Semantic, elapsed.as_millis() as u64);
                warn!(tier = %Tier::Semantic, error = %err, "tier probe timed out");
                None
            }
            Ok(Err(e)) => {
                warn!(tier = %Tier::Semantic, error = %e, "tier probe failed");
                None
            }
            Ok(Ok(found)) => found,
        };

        self.finish_probe(Tier::Semantic, found.is_some(), elapsed);

        if let Some(ref result) = found {
            debug!(
                similarity = result.similarity,
                record = result.record.id(),
                "semantic match"
            );
            if let Err(e) = self.semantic.record_hit(result.record.id()).await {
                warn!(error = %e, "failed to record semantic hit");
            }
        }

        found.map(|r| (r.record.response().clone(), r.similarity))
    }

    async fn semantic_search(
        &self,
        normalized: &str,
        threshold: f32,
    ) -> Result<Option<SemanticSearchResult>, CacheError> {
        let embedding = self.embedder.embed(normalized).await?;
        let params = SemanticSearchParams::new(threshold);
        self.semantic.find_similar(&embedding, &params).await
    }

    fn finish_probe(&self, tier: Tier, hit: bool, elapsed: Duration) {
        self.metrics.record_probe(tier, hit, elapsed);
        counter!(
            "cache_probes_total",
            "tier" => tier.label(),
            "outcome" => if hit { "hit" } else { "miss" }
        )
        .increment(1);
        histogram!("cache_probe_duration_ms", "tier" => tier.label())
            .record(elapsed.as_secs_f64() * 1000.0);
    }

    // --- writes ---

    async fn write_exact(
        &self,
        message: &str,
        requester_id: &str,
        response: Option<&ResponsePayload>,
    ) {
        let config = &self.settings.l1;
        let Some(response) = response else { return };
        if !config.enabled {
            return;
        }

        let key = CacheKey::exact(message, requester_id);
        let entry = CacheEntry::new(
            key.as_str(),
            TierPayload::FullResponse(response.clone()),
            Tier::Exact,
            config.ttl(),
        );

        if let Err(e) = self
            .exact
            .set(Tier::Exact, key.as_str(), &entry, config.ttl())
            .await
        {
            warn!(tier = %Tier::Exact, error = %e, "tier write failed");
        }
    }

    async fn write_semantic(&self, normalized: &str, response: Option<&ResponsePayload>) {
        let config = &self.settings.l2;
        let Some(response) = response else { return };
        if !config.tier.enabled {
            return;
        }

        let embedding = match self.embedder.embed(normalized).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(tier = %Tier::Semantic, error = %e, "embedding failed, skipping semantic write");
                return;
            }
        };

        let record =
            SemanticRecord::new(embedding, normalized, response.clone(), config.tier.ttl());

        if let Err(e) = self.semantic.insert(record).await {
            warn!(tier = %Tier::Semantic, error = %e, "tier write failed");
        }
    }

    async fn write_intent(&self, message: &str, intent: Option<&IntentPayload>) {
        let config = &self.settings.l3;
        let Some(intent) = intent else { return };
        if !config.enabled {
            return;
        }

        let key = CacheKey::intent(message);
        let entry = CacheEntry::new(
            key.as_str(),
            TierPayload::IntentResult(intent.clone()),
            Tier::Intent,
            config.ttl(),
        );

        if let Err(e) = self
            .intent
            .set(Tier::Intent, key.as_str(), &entry, config.ttl())
            .await
        {
            warn!(tier = %Tier::Intent, error = %e, "tier write failed");
        }
    }

    async fn write_retrieval(&self, retrieval: Option<&RetrievalPayload>) {
        let config = &self.settings.l4;
        let Some(retrieval) = retrieval else { return };
        if !config.enabled {
            return;
        }

        let key = CacheKey::retrieval(&retrieval.query);
        let entry = CacheEntry::new(
            key.as_str(),
            TierPayload::RetrievalResult(retrieval.clone()),
            Tier::Retrieval,
            config.ttl(),
        );

        if let Err(e) = self
            .retrieval
            .set(Tier::Retrieval, key.as_str(), &entry, config.ttl())
            .await
        {
            warn!(tier = %Tier::Retrieval, error = %e, "tier write failed");
        }
    }
}
