//! # PII Hashing
//!
//! One-way, deterministic hashing for customer contact data. Phone numbers
//! and email addresses never persist in raw form; [`PiiHash`] is the only
//! shape in which they cross into storage, logs, or lookup keys.
//!
//! Determinism matters: the pending-resolution store keys inbound customer
//! replies by the hash of the sender's contact, so the same contact must
//! always map to the same hash.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A SHA-256 digest of a piece of customer contact data, hex-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PiiHash(String);

impl PiiHash {
    /// Hash a raw contact value. Input is trimmed and lowercased first so
    /// that `" +91-98... "` and `"+91-98..."` key the same record.
    pub fn of(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        let digest = Sha256::digest(normalized.as_bytes());
        Self(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Access the lowercase hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PiiHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
