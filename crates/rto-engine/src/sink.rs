//! # Aggregation Boundary
//!
//! The one-way seam between the write path and the metrics read models.
//! Engine components publish [`AggregateUpdate`]s after their writes commit;
//! the aggregator consumes them and is free to lag. Nothing on the write
//! path ever waits on, or reads back from, this boundary.

use parking_lot::Mutex;

use rto_core::{BrandId, Timestamp};
use rto_domain::EventCode;

/// Lane attribution for one shipment-scoped fact.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentFact {
    /// The seller brand.
    pub brand_id: BrandId,
    /// Carrier name, normalized lowercase.
    pub carrier: String,
    /// Destination pincode of the order's current address.
    pub dest_pincode: String,
    /// When the underlying fact occurred.
    pub timestamp: Timestamp,
}

/// A fact the aggregator folds into its buckets.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateUpdate {
    /// A shipment entered the system.
    ShipmentRegistered(ShipmentFact),
    /// A courier event was ingested with its proof verdict.
    EventRecorded {
        /// Lane attribution.
        fact: ShipmentFact,
        /// The carrier event code.
        event_code: EventCode,
        /// Whether proof of attempt was demanded.
        proof_required: bool,
        /// Whether the demanded proof held.
        proof_validated: bool,
    },
    /// Adjudication overturned an NDR: an RTO was prevented.
    NdrOverturned(ShipmentFact),
}

/// Consumer of aggregate updates.
pub trait VerdictSink: Send + Sync {
    /// Fold one update into the read models. Must not block on I/O.
    fn publish(&self, update: AggregateUpdate);
}

/// Sink that drops everything. For wiring tests that don't assert metrics.
#[derive(Debug, Default)]
pub struct NullSink;

impl VerdictSink for NullSink {
    fn publish(&self, _update: AggregateUpdate) {}
}

/// Sink that records every update in order. For asserting what the write
/// path published.
#[derive(Debug, Default)]
pub struct RecordingSink {
    updates: Mutex<Vec<AggregateUpdate>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far.
    pub fn updates(&self) -> Vec<AggregateUpdate> {
        self.updates.lock().clone()
    }
}

impl VerdictSink for RecordingSink {
    fn publish(&self, update: AggregateUpdate) {
        self.updates.lock().push(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact() -> ShipmentFact {
        ShipmentFact {
            brand_id: BrandId::new("brand_acme").unwrap(),
            carrier: "delhivery".to_string(),
            dest_pincode: "560001".to_string(),
            timestamp: Timestamp::parse("2026-01-15T10:00:00Z").unwrap(),
        }
    }

    #[test]
    fn recording_sink_preserves_order() {
        let sink = RecordingSink::new();
        sink.publish(AggregateUpdate::ShipmentRegistered(fact()));
        sink.publish(AggregateUpdate::NdrOverturned(fact()));
        let updates = sink.updates();
        assert_eq!(updates.len(), 2);
        assert!(matches!(updates[0], AggregateUpdate::ShipmentRegistered(_)));
        assert!(matches!(updates[1], AggregateUpdate::NdrOverturned(_)));
    }
}
