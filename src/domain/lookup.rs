//! Lookup result types

use super::payload::{IntentPayload, ResponsePayload, RetrievalPayload};
use super::tier::Tier;

/// Outcome of a multi-level cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupResult {
    /// A full response servable to the end user without further pipeline
    /// work. `similarity` is set for semantic-tier hits only.
    FullHit {
        response: ResponsePayload,
        tier: Tier,
        similarity: Option<f32>,
    },
    /// Intermediate results that accelerate one or more pipeline stages but
    /// still require downstream computation. At least one field is set.
    PartialHit {
        intent: Option<IntentPayload>,
        retrieval: Option<RetrievalPayload>,
    },
    /// Nothing usable in any tier; the caller runs the full pipeline.
    Miss,
}

impl LookupResult {
    pub fn is_full_hit(&self) -> bool {
        matches!(self, LookupResult::FullHit { .. })
    }

    pub fn is_partial_hit(&self) -> bool {
        matches!(self, LookupResult::PartialHit { .. })
    }

    pub fn is_miss(&self) -> bool {
        matches!(self, LookupResult::Miss)
    }

    /// Tier that produced a full hit, if any.
    pub fn hit_tier(&self) -> Option<Tier> {
        match self {
            LookupResult::FullHit { tier, .. } => Some(*tier),
            _ => None,
        }
    }
}
