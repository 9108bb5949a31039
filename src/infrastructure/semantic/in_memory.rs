//! In-memory semantic index implementation
//!
//! Linear-scan cosine search, suitable for development and moderate cache
//! sizes. Larger deployments substitute a dedicated vector store behind the
//! same trait.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::embedding::cosine_similarity;
use crate::domain::semantic::{
    SemanticIndex, SemanticRecord, SemanticSearchParams, SemanticSearchResult,
};
use crate::domain::CacheError;

#[derive(Debug)]
pub struct InMemorySemanticIndex {
    records: RwLock<HashMap<String, SemanticRecord>>,
    max_entries: usize,
    evictions: AtomicU64,
}

impl InMemorySemanticIndex {
    /// Create a new index holding at most `max_entries` records
    pub fn new(max_entries: usize) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            max_entries,
            evictions: AtomicU64::new(0),
        }
    }

    /// Total records evicted for capacity
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Evict the oldest record if the index is full
    fn evict_if_needed(&self, records: &mut HashMap<String, SemanticRecord>) {
        if records.len() < self.max_entries {
            return;
        }

        if let Some(oldest_id) = records
            .iter()
            .min_by_key(|(_, record)| record.created_at())
            .map(|(id, _)| id.clone())
        {
            records.remove(&oldest_id);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[async_trait]
impl SemanticIndex for InMemorySemanticIndex {
    async fn search(
        &self,
        embedding: &[f32],
        params: &SemanticSearchParams,
    ) -> Result<Vec<SemanticSearchResult>, CacheError> {
        let records = self
            .records
            .read()
            .map_err(|e| CacheError::internal(format!("Failed to acquire read lock: {}", e)))?;

        let mut results: Vec<SemanticSearchResult> = records
            .values()
            .filter(|record| !record.is_expired())
            .map(|record| {
                let similarity = cosine_similarity(embedding, record.embedding());
                SemanticSearchResult::new(record.clone(), similarity)
            })
            // Inclusive boundary: a result exactly at the threshold is a hit
            .filter(|result| result.similarity >= params.min_similarity)
            .collect();

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        results.truncate(params.limit);

        Ok(results)
    }

    async fn insert(&self, record: SemanticRecord) -> Result<(), CacheError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| CacheError::internal(format!("Failed to acquire write lock: {}", e)))?;

        self.evict_if_needed(&mut records);
        records.insert(record.id().to_string(), record);

        Ok(())
    }

    async fn delete_by_source(&self, source_text: &str) -> Result<usize, CacheError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| CacheError::internal(format!("Failed to acquire write lock: {}", e)))?;

        let ids_to_remove: Vec<String> = records
            .iter()
            .filter(|(_, record)| record.source_text() == source_text)
            .map(|(id, _)| id.clone())
            .collect();

        let count = ids_to_remove.len();
        for id in ids_to_remove {
            records.remove(&id);
        }

        Ok(count)
    }

    async fn record_hit(&self, id: &str) -> Result<(), CacheError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| CacheError::internal(format!("Failed to acquire write lock: {}", e)))?;

        if let Some(record) = records.get_mut(id) {
            record.increment_hits();
        }

        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| CacheError::internal(format!("Failed to acquire write lock: {}", e)))?;

        records.clear();
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<usize, CacheError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| CacheError::internal(format!("Failed to acquire write lock: {}", e)))?;

        let expired_ids: Vec<String> = records
            .iter()
            .filter(|(_, record)| record.is_expired())
            .map(|(id, _)| id.clone())
            .collect();

        let count = expired_ids.len();
        for id in expired_ids {
            records.remove(&id);
        }

        Ok(count)
    }

    async fn len(&self) -> Result<usize, CacheError> {
        let records = self
            .records
            .read()
            .map_err(|e| CacheError::internal(format!("Failed to acquire read lock: {}", e)))?;

        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResponsePayload;
    use std::time::Duration;

    fn record(text: &str, embedding: Vec<f32>) -> SemanticRecord {
        SemanticRecord::new(
            embedding,
            text,
            ResponsePayload::new(format!("answer to {}", text)),
            Duration::from_secs(3600),
        )
    }

    #[tokio::test]
    async fn test_insert_and_search() {
        let index = InMemorySemanticIndex::new(100);
        index.insert(record("q1", vec![1.0, 0.0, 0.0])).await.unwrap();

        let params = SemanticSearchParams::new(0.9);
        let results = index.search(&[1.0, 0.0, 0.0], &params).await.unwrap();

        assert_eq!(results.len(), 1);
        assert!((results[0].similarity - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_threshold_filters_dissimilar() {
        let index = InMemorySemanticIndex::new(100);
        index.insert(record("similar", vec![1.0, 0.1, 0.0])).await.unwrap();
        index.insert(record("different", vec![0.0, 1.0, 0.0])).await.unwrap();

        let params = SemanticSearchParams::new(0.95);
        let results = index.search(&[1.0, 0.0, 0.0], &params).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.source_text(), "similar");
    }

    #[tokio::test]
    async fn test_threshold_boundary_inclusive() {
        // [3,4] vs [1,0]: dot=3, |a|=5, |b|=1, similarity exactly 3/5=0.6
        let index = InMemorySemanticIndex::new(100);
        index.insert(record("q", vec![3.0, 4.0])).await.unwrap();

        let at_threshold = SemanticSearchParams::new(0.6);
        let results = index.search(&[1.0, 0.0], &at_threshold).await.unwrap();
        assert_eq!(results.len(), 1, "similarity == threshold must be a hit");

        let above_threshold = SemanticSearchParams::new(0.601);
        let results = index.search(&[1.0, 0.0], &above_threshold).await.unwrap();
        assert!(results.is_empty(), "similarity < threshold must be a miss");
    }

    #[tokio::test]
    async fn test_search_ordering_and_limit() {
        let index = InMemorySemanticIndex::new(100);
        index.insert(record("low", vec![0.5, 0.5, 0.5])).await.unwrap();
        index.insert(record("high", vec![0.99, 0.1, 0.0])).await.unwrap();
        index.insert(record("medium", vec![0.8, 0.3, 0.0])).await.unwrap();

        let params = SemanticSearchParams::new(0.5).with_limit(2);
        let results = index.search(&[1.0, 0.0, 0.0], &params).await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].similarity >= results[1].similarity);
        assert_eq!(results[0].record.source_text(), "high");
    }

    #[tokio::test]
    async fn test_find_similar_takes_best() {
        let index = InMemorySemanticIndex::new(100);
        index.insert(record("best", vec![1.0, 0.0])).await.unwrap();
        index.insert(record("worse", vec![0.9, 0.4])).await.unwrap();

        let params = SemanticSearchParams::new(0.5);
        let found = index.find_similar(&[1.0, 0.0], &params).await.unwrap();

        assert_eq!(found.unwrap().record.source_text(), "best");
    }

    #[tokio::test]
    async fn test_delete_by_source() {
        let index = InMemorySemanticIndex::new(100);
        index.insert(record("return policy", vec![0.1])).await.unwrap();
        index.insert(record("return policy", vec![0.2])).await.unwrap();
        index.insert(record("shipping", vec![0.3])).await.unwrap();

        let deleted = index.delete_by_source("return policy").await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(index.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_eviction_removes_oldest() {
        let index = InMemorySemanticIndex::new(3);

        for i in 0..3 {
            index
                .insert(record(&format!("q{}", i), vec![i as f32]))
                .await
                .unwrap();
        }
        assert_eq!(index.len().await.unwrap(), 3);

        index.insert(record("newest", vec![9.0])).await.unwrap();

        assert_eq!(index.len().await.unwrap(), 3);
        assert_eq!(index.evictions(), 1);
    }

    #[tokio::test]
    async fn test_expired_records_not_returned() {
        let index = InMemorySemanticIndex::new(100);

        let mut expired = record("old", vec![1.0, 0.0]);
        expired.force_expired();
        index.insert(expired).await.unwrap();

        let params = SemanticSearchParams::new(0.0);
        let results = index.search(&[1.0, 0.0], &params).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let index = InMemorySemanticIndex::new(100);

        index.insert(record("valid", vec![0.1])).await.unwrap();
        let mut expired = record("stale", vec![0.2]);
        expired.force_expired();
        index.insert(expired).await.unwrap();

        let cleaned = index.cleanup_expired().await.unwrap();
        assert_eq!(cleaned, 1);
        assert_eq!(index.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_record_hit_increments() {
        let index = InMemorySemanticIndex::new(100);
        let rec = record("q", vec![1.0, 0.0]);
        let id = rec.id().to_string();
        index.insert(rec).await.unwrap();

        index.record_hit(&id).await.unwrap();
        index.record_hit(&id).await.unwrap();

        let params = SemanticSearchParams::new(0.9);
        let found = index.find_similar(&[1.0, 0.0], &params).await.unwrap().unwrap();
        assert_eq!(found.record.hit_count(), 2);
    }
}
