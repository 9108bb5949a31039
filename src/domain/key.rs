//! Cache key derivation
//!
//! All exact-match tiers are keyed by fixed-length SHA-256 digests of
//! normalized text. The L1 key additionally carries a requester digest as a
//! separate segment so that pattern deletion can remove a message's entries
//! for every requester. L3/L4 keys are requester-agnostic: intent and
//! retrieval results for the same question text do not depend on who asked.

use sha2::{Digest, Sha256};

/// Length of the truncated requester digest segment (hex chars).
const REQUESTER_DIGEST_LEN: usize = 16;

/// Normalizes message text for keying: case-fold and whitespace-collapse.
///
/// Two inputs that differ only in insignificant whitespace or case normalize
/// to the same string, and therefore produce the same key.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn digest_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// A namespaced cache key for one of the exact-match tiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// L1 key: normalized-message digest plus requester digest.
    pub fn exact(message: &str, requester_id: &str) -> Self {
        let text_digest = digest_hex(&normalize(message));
        let requester_digest = digest_hex(requester_id);
        Self(format!(
            "exact:{}:{}",
            text_digest,
            &requester_digest[..REQUESTER_DIGEST_LEN]
        ))
    }

    /// L3 key: normalized-message digest only.
    pub fn intent(message: &str) -> Self {
        Self(format!("intent:{}", digest_hex(&normalize(message))))
    }

    /// L4 key: normalized retrieval-query digest only.
    pub fn retrieval(query: &str) -> Self {
        Self(format!("retrieval:{}", digest_hex(&normalize(query))))
    }

    /// Pattern matching the L1 key of a message for every requester.
    pub fn exact_pattern(message: &str) -> String {
        format!("exact:{}:*", digest_hex(&normalize(message)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
