//! # Pending Resolution Store
//!
//! Tracks which customers have an outstanding resolution prompt, keyed by
//! hashed contact, so an inbound reply can be matched to its order.
//!
//! Entries carry an explicit expiry (default two hours, matching the
//! dispute window) and expiry is enforced at read time: a reply that
//! arrives after the window finds nothing, and stale entries can never
//! accumulate into an unbounded map.

use std::collections::HashMap;

use chrono::Duration;
use parking_lot::RwLock;

use rto_core::{OrderId, PiiHash, Timestamp};

/// Default prompt lifetime.
const DEFAULT_TTL_HOURS: i64 = 2;

/// One outstanding resolution prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingResolution {
    /// The order the prompt was sent for.
    pub order_id: OrderId,
    /// When the prompt was sent.
    pub sent_at: Timestamp,
    /// When the prompt stops being answerable.
    pub expires_at: Timestamp,
}

/// TTL-keyed store of outstanding prompts, one per contact.
///
/// A second prompt for the same contact replaces the first: the customer
/// always answers the most recent question.
#[derive(Debug)]
pub struct PendingResolutionStore {
    entries: RwLock<HashMap<PiiHash, PendingResolution>>,
    ttl: Duration,
}

impl PendingResolutionStore {
    /// Create a store with the default two-hour TTL.
    pub fn new() -> Self {
        Self::with_ttl(Duration::hours(DEFAULT_TTL_HOURS))
    }

    /// Create a store with an explicit TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Record a prompt sent to `contact` at `now`.
    pub fn record(&self, contact: PiiHash, order_id: OrderId, now: Timestamp) {
        let entry = PendingResolution {
            order_id,
            sent_at: now,
            expires_at: now.plus(self.ttl),
        };
        self.entries.write().insert(contact, entry);
    }

    /// The live prompt for `contact`, if any. Expired entries are removed
    /// on the way out.
    pub fn active(&self, contact: &PiiHash, now: Timestamp) -> Option<PendingResolution> {
        let mut guard = self.entries.write();
        match guard.get(contact) {
            Some(entry) if entry.expires_at > now => Some(entry.clone()),
            Some(_) => {
                guard.remove(contact);
                None
            }
            None => None,
        }
    }

    /// Consume the prompt for `contact` after a reply was handled.
    pub fn complete(&self, contact: &PiiHash) -> Option<PendingResolution> {
        self.entries.write().remove(contact)
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self, now: Timestamp) -> usize {
        let mut guard = self.entries.write();
        let before = guard.len();
        guard.retain(|_, entry| entry.expires_at > now);
        before - guard.len()
    }

    /// Number of tracked prompts, live or not-yet-purged.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no prompts are tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PendingResolutionStore {
    fn default() -> Self {
        Self::new()
    }
}
