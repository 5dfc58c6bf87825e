//! # Shipments
//!
//! A shipment is the carrier-side handle (AWB) for an order. Its status is
//! driven entirely by inbound courier events; nothing in the resolution
//! workflow mutates it directly except the RTO latch.

use serde::{Deserialize, Serialize};

use rto_core::{OrderId, ShipmentId, Timestamp};

use crate::event::EventCode;

/// Carrier-reported shipment status, derived from the last courier event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    /// Registered, not yet moving.
    Created,
    /// Picked up or moving through the carrier network.
    InTransit,
    /// With the delivery rider.
    OutForDelivery,
    /// A failed delivery attempt has been reported.
    NdrReported,
    /// Delivered to the customer.
    Delivered,
    /// Returning (or returned) to origin.
    Rto,
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "CREATED",
            Self::InTransit => "IN_TRANSIT",
            Self::OutForDelivery => "OUT_FOR_DELIVERY",
            Self::NdrReported => "NDR_REPORTED",
            Self::Delivered => "DELIVERED",
            Self::Rto => "RTO",
        };
        f.write_str(s)
    }
}

/// A carrier shipment attached to an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    /// Carrier AWB identifier.
    pub id: ShipmentId,
    /// The order this shipment fulfils.
    pub order_id: OrderId,
    /// Carrier name, as registered (e.g. `delhivery`, `bluedart`).
    pub carrier: String,
    /// Current carrier-reported status.
    pub status: ShipmentStatus,
    /// Set when return-to-origin has been initiated.
    pub rto_initiated: bool,
    /// When the shipment was registered.
    pub created_at: Timestamp,
}

impl Shipment {
    /// Register a new shipment.
    pub fn new(id: ShipmentId, order_id: OrderId, carrier: String, created_at: Timestamp) -> Self {
        Self {
            id,
            order_id,
            carrier,
            status: ShipmentStatus::Created,
            rto_initiated: false,
            created_at,
        }
    }

    /// Apply an inbound courier event to the carrier-reported status.
    ///
    /// Once RTO has been latched the status stays `Rto` regardless of late
    /// or out-of-order tracking noise.
    pub fn apply_event(&mut self, code: EventCode) {
        if self.rto_initiated {
            return;
        }
        self.status = match code {
            EventCode::PickedUp | EventCode::InTransit => ShipmentStatus::InTransit,
            EventCode::OutForDelivery => ShipmentStatus::OutForDelivery,
            EventCode::Ndr => ShipmentStatus::NdrReported,
            EventCode::Delivered => ShipmentStatus::Delivered,
        };
    }

    /// Latch return-to-origin.
    pub fn mark_rto(&mut self) {
        self.rto_initiated = true;
        self.status = ShipmentStatus::Rto;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_shipment() -> Shipment {
        Shipment::new(
            ShipmentId::new("AWB1001").unwrap(),
            OrderId::new("ORD-1001").unwrap(),
            "delhivery".to_string(),
            Timestamp::parse("2026-01-10T09:00:00Z").unwrap(),
        )
    }

    #[test]
    fn new_shipment_is_created() {
        let s = make_shipment();
        assert_eq!(s.status, ShipmentStatus::Created);
        assert!(!s.rto_initiated);
    }

    #[test]
    fn status_follows_events() {
        let mut s = make_shipment();
        s.apply_event(EventCode::PickedUp);
        assert_eq!(s.status, ShipmentStatus::InTransit);
        s.apply_event(EventCode::OutForDelivery);
        assert_eq!(s.status, ShipmentStatus::OutForDelivery);
        s.apply_event(EventCode::Ndr);
        assert_eq!(s.status, ShipmentStatus::NdrReported);
        s.apply_event(EventCode::Delivered);
        assert_eq!(s.status, ShipmentStatus::Delivered);
    }

    #[test]
    fn rto_latch_wins_over_late_events() {
        let mut s = make_shipment();
        s.apply_event(EventCode::Ndr);
        s.mark_rto();
        assert_eq!(s.status, ShipmentStatus::Rto);
        // Stale tracking update after the RTO decision.
        s.apply_event(EventCode::OutForDelivery);
        assert_eq!(s.status, ShipmentStatus::Rto);
        assert!(s.rto_initiated);
    }

    #[test]
    fn status_serde_is_screaming_snake() {
        let json = serde_json::to_string(&ShipmentStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"OUT_FOR_DELIVERY\"");
    }
}
