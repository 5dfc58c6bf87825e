//! # Repository Boundary
//!
//! Persistence for the engine: a dyn-safe [`Repository`] trait, the
//! in-memory [`MemoryRepository`] built on the generic [`Store`], and
//! [`OrderLocks`] for serializing writers of the same order.
//!
//! One abstraction, one implementation. Derived lookups (latest NDR for an
//! order) are composed from the primitive queries here rather than widening
//! the trait per caller.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use uuid::Uuid;

use rto_core::{AddressId, BrandId, ChallengeId, EventId, OrderId, ShipmentId};
use rto_domain::{Address, Challenge, CourierEvent, Order, Shipment};

use crate::error::EngineError;

// ─── Errors ──────────────────────────────────────────────────────────

/// Storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record kind (order, shipment, ...).
        kind: &'static str,
        /// The missing identifier.
        id: String,
    },

    /// A record with this identifier already exists.
    #[error("{kind} already exists: {id}")]
    Conflict {
        /// Record kind.
        kind: &'static str,
        /// The colliding identifier.
        id: String,
    },

    /// The backend is unreachable. Surfaced to callers as-is; there is no
    /// silent fallback to fabricated data.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

// ─── Generic In-Memory Store ─────────────────────────────────────────

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not
/// `tokio::sync`) because the lock is never held across `.await` points.
/// `parking_lot::RwLock` is non-poisonable — a panicking writer does not
/// permanently corrupt the store.
#[derive(Debug)]
pub struct Store<K: Eq + std::hash::Hash + Clone, T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<K, T>>>,
}

impl<K: Eq + std::hash::Hash + Clone, T: Clone + Send + Sync> Clone for Store<K, T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<K: Eq + std::hash::Hash + Clone, T: Clone + Send + Sync> Store<K, T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, key: K, value: T) -> Option<T> {
        self.data.write().insert(key, value)
    }

    /// Retrieve a record by key.
    pub fn get(&self, key: &K) -> Option<T> {
        self.data.read().get(key).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Update a record in place. Returns the updated record, or `None` if
    /// not found.
    pub fn update(&self, key: &K, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut guard = self.data.write();
        if let Some(entry) = guard.get_mut(key) {
            f(entry);
            Some(entry.clone())
        } else {
            None
        }
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure receives a `&mut T` and may inspect the current state,
    /// validate preconditions, mutate the record, and return `Ok(R)` or
    /// `Err(E)`. The entire operation runs under a single write lock,
    /// eliminating TOCTOU races between read and update.
    ///
    /// Returns `None` if the record doesn't exist, or `Some(result)` with
    /// the closure's `Result`.
    pub fn try_update<R, E>(
        &self,
        key: &K,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(key).map(f)
    }

    /// Check if a record exists.
    pub fn contains(&self, key: &K) -> bool {
        self.data.read().contains_key(key)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + std::hash::Hash + Clone, T: Clone + Send + Sync> Default for Store<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Repository Trait ────────────────────────────────────────────────

/// The persistence boundary for all engine components.
///
/// `insert_*` rejects duplicates with [`StoreError::Conflict`]; `put_*`
/// writes back a previously read record and rejects missing keys with
/// [`StoreError::NotFound`]. Callers mutating an order (or anything hanging
/// off one) must hold that order's [`OrderLocks`] lock across the
/// read-validate-write sequence.
pub trait Repository: Send + Sync {
    /// Insert a new order.
    fn insert_order(&self, order: Order) -> Result<(), StoreError>;
    /// Fetch an order by id.
    fn get_order(&self, id: &OrderId) -> Result<Order, StoreError>;
    /// Write back an existing order.
    fn put_order(&self, order: Order) -> Result<(), StoreError>;

    /// Insert a new address version.
    fn insert_address(&self, address: Address) -> Result<(), StoreError>;
    /// Fetch an address version by id.
    fn get_address(&self, id: &AddressId) -> Result<Address, StoreError>;

    /// Insert a new shipment.
    fn insert_shipment(&self, shipment: Shipment) -> Result<(), StoreError>;
    /// Fetch a shipment by id.
    fn get_shipment(&self, id: &ShipmentId) -> Result<Shipment, StoreError>;
    /// Write back an existing shipment.
    fn put_shipment(&self, shipment: Shipment) -> Result<(), StoreError>;
    /// All shipments for an order, oldest first.
    fn shipments_for_order(&self, order_id: &OrderId) -> Result<Vec<Shipment>, StoreError>;

    /// Insert a new courier event.
    fn insert_event(&self, event: CourierEvent) -> Result<(), StoreError>;
    /// Fetch a courier event by id.
    fn get_event(&self, id: &EventId) -> Result<CourierEvent, StoreError>;
    /// Write back an existing courier event.
    fn put_event(&self, event: CourierEvent) -> Result<(), StoreError>;
    /// All events for a shipment, oldest first.
    fn events_for_shipment(
        &self,
        shipment_id: &ShipmentId,
    ) -> Result<Vec<CourierEvent>, StoreError>;

    /// Insert a new challenge.
    fn insert_challenge(&self, challenge: Challenge) -> Result<(), StoreError>;
    /// Fetch a challenge by id.
    fn get_challenge(&self, id: &ChallengeId) -> Result<Challenge, StoreError>;
    /// Write back an existing challenge.
    fn put_challenge(&self, challenge: Challenge) -> Result<(), StoreError>;
    /// All challenges raised by a brand, oldest first.
    fn challenges_for_brand(&self, brand_id: &BrandId) -> Result<Vec<Challenge>, StoreError>;
}

/// The most recent NDR event across all shipments of an order.
///
/// Derived from the primitive queries; returns [`EngineError::NoNdrFound`]
/// when the order has no NDR on record.
pub fn latest_ndr_event(
    repo: &dyn Repository,
    order_id: &OrderId,
) -> Result<CourierEvent, EngineError> {
    let mut latest: Option<CourierEvent> = None;
    for shipment in repo.shipments_for_order(order_id)? {
        for event in repo.events_for_shipment(&shipment.id)? {
            if !event.is_ndr() {
                continue;
            }
            let newer = match &latest {
                Some(current) => event.occurred_at > current.occurred_at,
                None => true,
            };
            if newer {
                latest = Some(event);
            }
        }
    }
    latest.ok_or_else(|| EngineError::NoNdrFound(order_id.to_string()))
}

// ─── In-Memory Implementation ────────────────────────────────────────

/// In-memory [`Repository`] backed by [`Store`] maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    orders: Store<String, Order>,
    addresses: Store<Uuid, Address>,
    shipments: Store<String, Shipment>,
    events: Store<Uuid, CourierEvent>,
    challenges: Store<Uuid, Challenge>,
}

impl MemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Repository for MemoryRepository {
    fn insert_order(&self, order: Order) -> Result<(), StoreError> {
        let key = order.id.as_str().to_string();
        if self.orders.contains(&key) {
            return Err(StoreError::Conflict {
                kind: "order",
                id: key,
            });
        }
        self.orders.insert(key, order);
        Ok(())
    }

    fn get_order(&self, id: &OrderId) -> Result<Order, StoreError> {
        self.orders
            .get(&id.as_str().to_string())
            .ok_or_else(|| StoreError::NotFound {
                kind: "order",
                id: id.to_string(),
            })
    }

    fn put_order(&self, order: Order) -> Result<(), StoreError> {
        let key = order.id.as_str().to_string();
        if !self.orders.contains(&key) {
            return Err(StoreError::NotFound {
                kind: "order",
                id: key,
            });
        }
        self.orders.insert(key, order);
        Ok(())
    }

    fn insert_address(&self, address: Address) -> Result<(), StoreError> {
        let key = *address.id.as_uuid();
        if self.addresses.contains(&key) {
            return Err(StoreError::Conflict {
                kind: "address",
                id: key.to_string(),
            });
        }
        self.addresses.insert(key, address);
        Ok(())
    }

    fn get_address(&self, id: &AddressId) -> Result<Address, StoreError> {
        self.addresses
            .get(id.as_uuid())
            .ok_or_else(|| StoreError::NotFound {
                kind: "address",
                id: id.to_string(),
            })
    }

    fn insert_shipment(&self, shipment: Shipment) -> Result<(), StoreError> {
        let key = shipment.id.as_str().to_string();
        if self.shipments.contains(&key) {
            return Err(StoreError::Conflict {
                kind: "shipment",
                id: key,
            });
        }
        self.shipments.insert(key, shipment);
        Ok(())
    }

    fn get_shipment(&self, id: &ShipmentId) -> Result<Shipment, StoreError> {
        self.shipments
            .get(&id.as_str().to_string())
            .ok_or_else(|| StoreError::NotFound {
                kind: "shipment",
                id: id.to_string(),
            })
    }

    fn put_shipment(&self, shipment: Shipment) -> Result<(), StoreError> {
        let key = shipment.id.as_str().to_string();
        if !self.shipments.contains(&key) {
            return Err(StoreError::NotFound {
                kind: "shipment",
                id: key,
            });
        }
        self.shipments.insert(key, shipment);
        Ok(())
    }

    fn shipments_for_order(&self, order_id: &OrderId) -> Result<Vec<Shipment>, StoreError> {
        let mut out: Vec<Shipment> = self
            .shipments
            .list()
            .into_iter()
            .filter(|s| &s.order_id == order_id)
            .collect();
        out.sort_by_key(|s| s.created_at);
        Ok(out)
    }

    fn insert_event(&self, event: CourierEvent) -> Result<(), StoreError> {
        let key = *event.id.as_uuid();
        if self.events.contains(&key) {
            return Err(StoreError::Conflict {
                kind: "event",
                id: key.to_string(),
            });
        }
        self.events.insert(key, event);
        Ok(())
    }

    fn get_event(&self, id: &EventId) -> Result<CourierEvent, StoreError> {
        self.events
            .get(id.as_uuid())
            .ok_or_else(|| StoreError::NotFound {
                kind: "event",
                id: id.to_string(),
            })
    }

    fn put_event(&self, event: CourierEvent) -> Result<(), StoreError> {
        let key = *event.id.as_uuid();
        if !self.events.contains(&key) {
            return Err(StoreError::NotFound {
                kind: "event",
                id: key.to_string(),
            });
        }
        self.events.insert(key, event);
        Ok(())
    }

    fn events_for_shipment(
        &self,
        shipment_id: &ShipmentId,
    ) -> Result<Vec<CourierEvent>, StoreError> {
        let mut out: Vec<CourierEvent> = self
            .events
            .list()
            .into_iter()
            .filter(|e| &e.shipment_id == shipment_id)
            .collect();
        out.sort_by_key(|e| (e.occurred_at, e.received_at));
        Ok(out)
    }

    fn insert_challenge(&self, challenge: Challenge) -> Result<(), StoreError> {
        let key = *challenge.id.as_uuid();
        if self.challenges.contains(&key) {
            return Err(StoreError::Conflict {
                kind: "challenge",
                id: key.to_string(),
            });
        }
        self.challenges.insert(key, challenge);
        Ok(())
    }

    fn get_challenge(&self, id: &ChallengeId) -> Result<Challenge, StoreError> {
        self.challenges
            .get(id.as_uuid())
            .ok_or_else(|| StoreError::NotFound {
                kind: "challenge",
                id: id.to_string(),
            })
    }

    fn put_challenge(&self, challenge: Challenge) -> Result<(), StoreError> {
        let key = *challenge.id.as_uuid();
        if !self.challenges.contains(&key) {
            return Err(StoreError::NotFound {
                kind: "challenge",
                id: key.to_string(),
            });
        }
        self.challenges.insert(key, challenge);
        Ok(())
    }

    fn challenges_for_brand(&self, brand_id: &BrandId) -> Result<Vec<Challenge>, StoreError> {
        let mut out: Vec<Challenge> = self
            .challenges
            .list()
            .into_iter()
            .filter(|c| &c.brand_id == brand_id)
            .collect();
        out.sort_by_key(|c| c.created_at);
        Ok(out)
    }
}

// ─── Per-Order Locks ─────────────────────────────────────────────────

/// Keyed mutexes serializing all writers of one order.
///
/// Lifecycle transitions are read-validate-write; without serialization two
/// concurrent resolution requests could both observe `NDR_OPEN` and both
/// commit. Locks are held only across synchronous repository calls, never
/// across `.await`.
#[derive(Debug, Default)]
pub struct OrderLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl OrderLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock for `order_id`, created on first use. Callers hold the
    /// returned mutex for the duration of the read-validate-write sequence:
    ///
    /// ```ignore
    /// let lock = locks.acquire(&order_id);
    /// let _guard = lock.lock();
    /// ```
    pub fn acquire(&self, order_id: &OrderId) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(order_id.as_str().to_string())
            .or_default()
            .clone()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rto_core::{PiiHash, Timestamp};
    use rto_domain::{EventCode, NdrCode, PaymentMode};

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn make_order(id: &str) -> Order {
        Order::new(
            OrderId::new(id).unwrap(),
            BrandId::new("brand_acme").unwrap(),
            PiiHash::of("+919876543210"),
            PaymentMode::Cod,
            999.0,
            AddressId::new(),
            None,
            ts("2026-01-10T09:00:00Z"),
        )
    }

    fn make_shipment(id: &str, order_id: &str, created: &str) -> Shipment {
        Shipment::new(
            ShipmentId::new(id).unwrap(),
            OrderId::new(order_id).unwrap(),
            "delhivery".to_string(),
            ts(created),
        )
    }

    fn ndr_event(shipment_id: &str, occurred: &str) -> CourierEvent {
        CourierEvent::new(
            ShipmentId::new(shipment_id).unwrap(),
            EventCode::Ndr,
            Some(NdrCode::CustomerUnavailable),
            None,
            None,
            None,
            ts(occurred),
            ts(occurred),
        )
    }

    // ── Store<K, T> ──────────────────────────────────────────────────

    #[test]
    fn store_insert_get_update() {
        let store: Store<String, u32> = Store::new();
        assert!(store.insert("a".to_string(), 1).is_none());
        assert_eq!(store.get(&"a".to_string()), Some(1));
        store.update(&"a".to_string(), |v| *v += 1);
        assert_eq!(store.get(&"a".to_string()), Some(2));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn store_try_update_propagates_result() {
        let store: Store<String, u32> = Store::new();
        store.insert("a".to_string(), 5);

        let ok: Option<Result<u32, String>> = store.try_update(&"a".to_string(), |v| {
            *v += 1;
            Ok(*v)
        });
        assert_eq!(ok, Some(Ok(6)));

        let rejected: Option<Result<u32, String>> = store.try_update(&"a".to_string(), |v| {
            if *v > 5 {
                Err("too big".to_string())
            } else {
                Ok(*v)
            }
        });
        assert_eq!(rejected, Some(Err("too big".to_string())));

        let missing: Option<Result<u32, String>> =
            store.try_update(&"zzz".to_string(), |v| Ok(*v));
        assert!(missing.is_none());
    }

    // ── MemoryRepository ─────────────────────────────────────────────

    #[test]
    fn insert_order_rejects_duplicate() {
        let repo = MemoryRepository::new();
        repo.insert_order(make_order("ORD-1")).unwrap();
        let err = repo.insert_order(make_order("ORD-1")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { kind: "order", .. }));
    }

    #[test]
    fn put_order_rejects_missing() {
        let repo = MemoryRepository::new();
        let err = repo.put_order(make_order("ORD-1")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "order", .. }));
    }

    #[test]
    fn shipments_for_order_sorted_oldest_first() {
        let repo = MemoryRepository::new();
        repo.insert_shipment(make_shipment("AWB2", "ORD-1", "2026-01-12T09:00:00Z"))
            .unwrap();
        repo.insert_shipment(make_shipment("AWB1", "ORD-1", "2026-01-10T09:00:00Z"))
            .unwrap();
        repo.insert_shipment(make_shipment("AWB3", "ORD-2", "2026-01-11T09:00:00Z"))
            .unwrap();

        let shipments = repo
            .shipments_for_order(&OrderId::new("ORD-1").unwrap())
            .unwrap();
        let ids: Vec<&str> = shipments.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["AWB1", "AWB2"]);
    }

    #[test]
    fn latest_ndr_event_picks_most_recent_across_shipments() {
        let repo = MemoryRepository::new();
        repo.insert_shipment(make_shipment("AWB1", "ORD-1", "2026-01-10T09:00:00Z"))
            .unwrap();
        repo.insert_shipment(make_shipment("AWB2", "ORD-1", "2026-01-12T09:00:00Z"))
            .unwrap();
        repo.insert_event(ndr_event("AWB1", "2026-01-14T10:00:00Z")).unwrap();
        let newest = ndr_event("AWB2", "2026-01-16T10:00:00Z");
        let newest_id = newest.id;
        repo.insert_event(newest).unwrap();

        let found = latest_ndr_event(&repo, &OrderId::new("ORD-1").unwrap()).unwrap();
        assert_eq!(found.id, newest_id);
    }

    #[test]
    fn latest_ndr_event_errors_without_ndr() {
        let repo = MemoryRepository::new();
        repo.insert_shipment(make_shipment("AWB1", "ORD-1", "2026-01-10T09:00:00Z"))
            .unwrap();
        let err = latest_ndr_event(&repo, &OrderId::new("ORD-1").unwrap()).unwrap_err();
        assert!(matches!(err, EngineError::NoNdrFound(_)));
    }

    // ── OrderLocks ───────────────────────────────────────────────────

    #[test]
    fn order_locks_same_key_same_lock() {
        let locks = OrderLocks::new();
        let id = OrderId::new("ORD-1").unwrap();
        let a = locks.acquire(&id);
        let b = locks.acquire(&id);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn order_locks_distinct_keys_distinct_locks() {
        let locks = OrderLocks::new();
        let a = locks.acquire(&OrderId::new("ORD-1").unwrap());
        let b = locks.acquire(&OrderId::new("ORD-2").unwrap());
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
