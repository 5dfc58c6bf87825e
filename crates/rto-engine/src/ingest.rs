//! # Event Ingestion
//!
//! The webhook-facing intake: order registration, shipment registration,
//! and courier event ingestion with proof-of-attempt validation.
//!
//! ## Failure Posture
//!
//! An event for a shipment this system has never seen is **rejected** — a
//! verdict attached to a fabricated shipment would be unauditable. But once
//! the shipment is known, ingestion never hard-fails on degraded context: a
//! missing order or address record downgrades the proof verdict to
//! `proof_validated = false` with an explicit violation, and the event is
//! recorded regardless. The courier's claim is evidence either way.

use std::sync::Arc;

use rto_core::{BrandId, EventId, GeoPoint, OrderId, PiiHash, ShipmentId, Timestamp, ValidationError};
use rto_domain::{
    Address, AddressFields, CourierEvent, EventCode, NdrCode, Order, OrderStatus, PaymentMode,
    Shipment,
};

use crate::error::EngineError;
use crate::notify::NotificationSender;
use crate::pending::PendingResolutionStore;
use crate::proof::ProofValidator;
use crate::sink::{AggregateUpdate, ShipmentFact, VerdictSink};
use crate::store::{OrderLocks, Repository, StoreError};

const VIOLATION_CONTEXT_UNAVAILABLE: &str =
    "Delivery address unavailable for proof validation";

/// A new order arriving over the storefront webhook.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Storefront order identifier.
    pub order_id: OrderId,
    /// Seller brand.
    pub brand_id: BrandId,
    /// Raw customer contact (phone or email). Hashed before persistence.
    pub customer_contact: String,
    /// Payment mode.
    pub payment_mode: PaymentMode,
    /// Order value.
    pub amount: f64,
    /// Delivery address fields.
    pub address: AddressFields,
    /// Promised delivery date, if the storefront supplies one.
    pub promised_delivery_date: Option<Timestamp>,
}

/// A new shipment arriving over the carrier webhook.
#[derive(Debug, Clone)]
pub struct NewShipment {
    /// Carrier AWB identifier.
    pub shipment_id: ShipmentId,
    /// The order this shipment fulfils.
    pub order_id: OrderId,
    /// Carrier name. Normalized to lowercase for lane keys.
    pub carrier: String,
}

/// A courier tracking event arriving over the carrier webhook.
#[derive(Debug, Clone)]
pub struct IngestEvent {
    /// The shipment the event belongs to.
    pub shipment_id: ShipmentId,
    /// Carrier tracking code.
    pub event_code: EventCode,
    /// Failure reason on NDR events.
    pub ndr_code: Option<NdrCode>,
    /// Free-text reason from the carrier feed.
    pub ndr_reason: Option<String>,
    /// Rider GPS latitude at the claimed attempt.
    pub gps_latitude: Option<f64>,
    /// Rider GPS longitude at the claimed attempt.
    pub gps_longitude: Option<f64>,
    /// Rider-to-customer call duration in seconds.
    pub call_duration_secs: Option<u32>,
    /// Outcome label from the rider's call log, when reported.
    pub call_outcome: Option<String>,
    /// When the carrier says the event happened.
    pub occurred_at: Timestamp,
}

/// What ingestion concluded about one event.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// The minted event identifier.
    pub event_id: EventId,
    /// Whether proof of attempt was demanded.
    pub proof_required: bool,
    /// Whether the demanded proof held.
    pub proof_validated: bool,
    /// Violations, empty when the proof held or was not demanded.
    pub violations: Vec<String>,
    /// The order's resolution state after the event, when the order could
    /// be resolved.
    pub order_status: Option<OrderStatus>,
}

/// Intake for orders, shipments, and courier events.
pub struct EventIngestor {
    repo: Arc<dyn Repository>,
    locks: Arc<OrderLocks>,
    sink: Arc<dyn VerdictSink>,
    notifier: Arc<dyn NotificationSender>,
    pending: Arc<PendingResolutionStore>,
}

impl EventIngestor {
    /// Wire an ingestor over shared infrastructure.
    pub fn new(
        repo: Arc<dyn Repository>,
        locks: Arc<OrderLocks>,
        sink: Arc<dyn VerdictSink>,
        notifier: Arc<dyn NotificationSender>,
        pending: Arc<PendingResolutionStore>,
    ) -> Self {
        Self {
            repo,
            locks,
            sink,
            notifier,
            pending,
        }
    }

    /// Register an order and its initial address version.
    pub fn register_order(&self, req: NewOrder, now: Timestamp) -> Result<Order, EngineError> {
        if !req.amount.is_finite() || req.amount < 0.0 {
            return Err(ValidationError::InvalidField {
                field: "amount",
                reason: format!("{} is not a non-negative amount", req.amount),
            }
            .into());
        }
        let contact = req.customer_contact.trim();
        if contact.is_empty() {
            return Err(ValidationError::MissingField("customer_contact").into());
        }

        let address = Address::new(req.address, now)?;
        let order = Order::new(
            req.order_id,
            req.brand_id,
            PiiHash::of(contact),
            req.payment_mode,
            req.amount,
            address.id,
            req.promised_delivery_date,
            now,
        );

        self.repo.insert_address(address)?;
        self.repo.insert_order(order.clone())?;
        tracing::info!(order_id = %order.id, brand_id = %order.brand_id, "order registered");
        Ok(order)
    }

    /// Register a shipment against an existing order.
    pub fn register_shipment(
        &self,
        req: NewShipment,
        now: Timestamp,
    ) -> Result<Shipment, EngineError> {
        let carrier = req.carrier.trim().to_lowercase();
        if carrier.is_empty() {
            return Err(ValidationError::MissingField("carrier").into());
        }

        let order = self.order_or_not_found(&req.order_id)?;
        let address = self.repo.get_address(&order.address_id)?;

        let shipment = Shipment::new(req.shipment_id, req.order_id, carrier, now);
        self.repo.insert_shipment(shipment.clone())?;

        self.sink
            .publish(AggregateUpdate::ShipmentRegistered(ShipmentFact {
                brand_id: order.brand_id,
                carrier: shipment.carrier.clone(),
                dest_pincode: address.pincode,
                timestamp: now,
            }));
        tracing::info!(shipment_id = %shipment.id, order_id = %shipment.order_id, carrier = %shipment.carrier, "shipment registered");
        Ok(shipment)
    }

    /// Ingest one courier event: validate proof, persist the verdict,
    /// advance shipment and order state, notify the aggregator.
    pub fn ingest_event(
        &self,
        req: IngestEvent,
        now: Timestamp,
    ) -> Result<IngestOutcome, EngineError> {
        let gps = parse_gps(req.gps_latitude, req.gps_longitude)?;

        let mut shipment = self.repo.get_shipment(&req.shipment_id).map_err(|e| match e {
            StoreError::NotFound { .. } => {
                EngineError::UnknownShipment(req.shipment_id.to_string())
            }
            other => EngineError::Store(other),
        })?;

        let lock = self.locks.acquire(&shipment.order_id);
        let _guard = lock.lock();

        let mut event = CourierEvent::new(
            req.shipment_id,
            req.event_code,
            req.ndr_code,
            req.ndr_reason,
            gps,
            req.call_duration_secs,
            req.occurred_at,
            now,
        );
        event.call_outcome = req.call_outcome;

        // Resolve the order and its current address; degrade, never fail.
        let order_ctx = match self.repo.get_order(&shipment.order_id) {
            Ok(order) => match self.repo.get_address(&order.address_id) {
                Ok(address) => Some((order, address)),
                Err(e) => {
                    tracing::warn!(order_id = %shipment.order_id, error = %e, "address unresolvable during ingestion");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(order_id = %shipment.order_id, error = %e, "order unresolvable during ingestion");
                None
            }
        };

        if event.requires_proof() && order_ctx.is_none() {
            event.record_verdict(true, false, vec![VIOLATION_CONTEXT_UNAVAILABLE.to_string()])?;
        } else {
            let verdict =
                ProofValidator::validate(&event, order_ctx.as_ref().map(|(_, a)| a));
            event.record_verdict(
                verdict.proof_required,
                verdict.proof_required && verdict.is_valid,
                verdict.violations,
            )?;
        }

        self.repo.insert_event(event.clone())?;

        shipment.apply_event(req.event_code);
        self.repo.put_shipment(shipment.clone())?;

        let order_status = match order_ctx {
            Some((mut order, address)) => {
                self.advance_order(&mut order, req.event_code, now);
                self.repo.put_order(order.clone())?;

                self.sink.publish(AggregateUpdate::EventRecorded {
                    fact: ShipmentFact {
                        brand_id: order.brand_id.clone(),
                        carrier: shipment.carrier.clone(),
                        dest_pincode: address.pincode,
                        timestamp: req.occurred_at,
                    },
                    event_code: req.event_code,
                    proof_required: event.proof_required,
                    proof_validated: event.proof_validated,
                });
                Some(order.status)
            }
            None => None,
        };

        tracing::info!(
            event_id = %event.id,
            shipment_id = %event.shipment_id,
            event_code = %event.event_code,
            proof_required = event.proof_required,
            proof_validated = event.proof_validated,
            "courier event ingested"
        );

        Ok(IngestOutcome {
            event_id: event.id,
            proof_required: event.proof_required,
            proof_validated: event.proof_validated,
            violations: event.violations,
            order_status,
        })
    }

    /// Advance the order state for an event code. Transition rejections are
    /// logged, not propagated: the event itself is already committed.
    fn advance_order(&self, order: &mut Order, code: EventCode, now: Timestamp) {
        match code {
            EventCode::Ndr => match order.open_ndr(now) {
                Ok(()) => self.prompt_customer(order, now),
                Err(e) => {
                    tracing::warn!(order_id = %order.id, error = %e, "NDR event on non-reopenable order");
                }
            },
            EventCode::Delivered => {
                if let Err(e) = order.mark_delivered(now) {
                    tracing::warn!(order_id = %order.id, error = %e, "DELIVERED event on terminal order");
                }
            }
            EventCode::PickedUp | EventCode::InTransit | EventCode::OutForDelivery => {}
        }
    }

    /// Send the resolution prompt and track it for reply matching. A dead
    /// notification channel must not fail ingestion.
    fn prompt_customer(&self, order: &Order, now: Timestamp) {
        match self
            .notifier
            .send_resolution_prompt(&order.customer_contact, &order.id)
        {
            Ok(receipt) => {
                self.pending
                    .record(order.customer_contact.clone(), order.id.clone(), now);
                tracing::info!(order_id = %order.id, message_id = %receipt.message_id, "resolution prompt sent");
            }
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "resolution prompt not delivered");
            }
        }
    }

    fn order_or_not_found(&self, id: &OrderId) -> Result<Order, EngineError> {
        self.repo.get_order(id).map_err(|e| match e {
            StoreError::NotFound { .. } => EngineError::OrderNotFound(id.to_string()),
            other => EngineError::Store(other),
        })
    }
}

/// Validate an optional coordinate pair from the feed. One half of a pair
/// without the other is a malformed payload, not missing data.
fn parse_gps(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Option<GeoPoint>, EngineError> {
    match (latitude, longitude) {
        (None, None) => Ok(None),
        (Some(lat), Some(lng)) => Ok(Some(GeoPoint::new(lat, lng)?)),
        (Some(_), None) => Err(ValidationError::MissingField("gps_longitude").into()),
        (None, Some(_)) => Err(ValidationError::MissingField("gps_latitude").into()),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::LoggingSender;
    use crate::sink::RecordingSink;
    use crate::store::MemoryRepository;
    use rto_core::BrandId;
    use rto_domain::ShipmentStatus;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    struct Fixture {
        ingestor: EventIngestor,
        repo: Arc<MemoryRepository>,
        sink: Arc<RecordingSink>,
        pending: Arc<PendingResolutionStore>,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(MemoryRepository::new());
        let sink = Arc::new(RecordingSink::new());
        let pending = Arc::new(PendingResolutionStore::new());
        let ingestor = EventIngestor::new(
            repo.clone(),
            Arc::new(OrderLocks::new()),
            sink.clone(),
            Arc::new(LoggingSender),
            pending.clone(),
        );
        Fixture {
            ingestor,
            repo,
            sink,
            pending,
        }
    }

    fn new_order(id: &str) -> NewOrder {
        NewOrder {
            order_id: OrderId::new(id).unwrap(),
            brand_id: BrandId::new("brand_acme").unwrap(),
            customer_contact: "+919876543210".to_string(),
            payment_mode: PaymentMode::Cod,
            amount: 1499.0,
            address: AddressFields {
                line1: "221B MG Road".to_string(),
                line2: None,
                city: "Bengaluru".to_string(),
                state: "Karnataka".to_string(),
                pincode: "560001".to_string(),
                location: GeoPoint::new(12.9716, 77.5946).ok(),
            },
            promised_delivery_date: None,
        }
    }

    fn registered(fix: &Fixture) -> (Order, Shipment) {
        let order = fix
            .ingestor
            .register_order(new_order("ORD-1"), ts("2026-01-10T09:00:00Z"))
            .unwrap();
        let shipment = fix
            .ingestor
            .register_shipment(
                NewShipment {
                    shipment_id: ShipmentId::new("AWB1").unwrap(),
                    order_id: order.id.clone(),
                    carrier: "Delhivery".to_string(),
                },
                ts("2026-01-11T09:00:00Z"),
            )
            .unwrap();
        (order, shipment)
    }

    fn ndr_event(shipment_id: &str) -> IngestEvent {
        IngestEvent {
            shipment_id: ShipmentId::new(shipment_id).unwrap(),
            event_code: EventCode::Ndr,
            ndr_code: Some(NdrCode::CustomerUnavailable),
            ndr_reason: Some("customer not reachable".to_string()),
            gps_latitude: Some(12.9716),
            gps_longitude: Some(77.5946),
            call_duration_secs: Some(25),
            call_outcome: Some("connected".to_string()),
            occurred_at: ts("2026-01-15T10:00:00Z"),
        }
    }

    // ── Registration ─────────────────────────────────────────────────

    #[test]
    fn register_order_hashes_contact() {
        let fix = fixture();
        let order = fix
            .ingestor
            .register_order(new_order("ORD-1"), ts("2026-01-10T09:00:00Z"))
            .unwrap();
        assert_eq!(order.customer_contact, PiiHash::of("+919876543210"));
        assert_eq!(order.status, OrderStatus::Placed);
    }

    #[test]
    fn register_order_rejects_duplicate() {
        let fix = fixture();
        fix.ingestor
            .register_order(new_order("ORD-1"), ts("2026-01-10T09:00:00Z"))
            .unwrap();
        let err = fix
            .ingestor
            .register_order(new_order("ORD-1"), ts("2026-01-10T10:00:00Z"))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Store(StoreError::Conflict { kind: "order", .. })
        ));
    }

    #[test]
    fn register_order_rejects_bad_amount() {
        let fix = fixture();
        let mut req = new_order("ORD-1");
        req.amount = -5.0;
        assert!(matches!(
            fix.ingestor.register_order(req, ts("2026-01-10T09:00:00Z")),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn register_shipment_normalizes_carrier_and_publishes() {
        let fix = fixture();
        let (order, shipment) = registered(&fix);
        assert_eq!(shipment.carrier, "delhivery");

        let updates = fix.sink.updates();
        assert_eq!(updates.len(), 1);
        match &updates[0] {
            AggregateUpdate::ShipmentRegistered(fact) => {
                assert_eq!(fact.brand_id, order.brand_id);
                assert_eq!(fact.carrier, "delhivery");
                assert_eq!(fact.dest_pincode, "560001");
            }
            other => panic!("expected ShipmentRegistered, got {other:?}"),
        }
    }

    #[test]
    fn register_shipment_unknown_order_rejected() {
        let fix = fixture();
        let err = fix
            .ingestor
            .register_shipment(
                NewShipment {
                    shipment_id: ShipmentId::new("AWB1").unwrap(),
                    order_id: OrderId::new("ORD-404").unwrap(),
                    carrier: "delhivery".to_string(),
                },
                ts("2026-01-11T09:00:00Z"),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::OrderNotFound(_)));
    }

    // ── Event ingestion ──────────────────────────────────────────────

    #[test]
    fn unknown_shipment_rejected() {
        let fix = fixture();
        let err = fix
            .ingestor
            .ingest_event(ndr_event("AWB404"), ts("2026-01-15T10:00:05Z"))
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownShipment(_)));
    }

    #[test]
    fn valid_ndr_opens_order_and_records_verified_verdict() {
        let fix = fixture();
        let (order, _) = registered(&fix);

        let outcome = fix
            .ingestor
            .ingest_event(ndr_event("AWB1"), ts("2026-01-15T10:00:05Z"))
            .unwrap();
        assert!(outcome.proof_required);
        assert!(outcome.proof_validated);
        assert!(outcome.violations.is_empty());
        assert_eq!(outcome.order_status, Some(OrderStatus::NdrOpen));

        let stored = fix.repo.get_order(&order.id).unwrap();
        assert_eq!(stored.status, OrderStatus::NdrOpen);

        // The customer got a prompt to pick a resolution.
        assert!(fix
            .pending
            .active(&order.customer_contact, ts("2026-01-15T10:05:00Z"))
            .is_some());

        let updates = fix.sink.updates();
        assert!(matches!(
            updates.last().unwrap(),
            AggregateUpdate::EventRecorded {
                proof_required: true,
                proof_validated: true,
                ..
            }
        ));
    }

    #[test]
    fn far_gps_records_suspicious_verdict() {
        let fix = fixture();
        registered(&fix);

        let mut req = ndr_event("AWB1");
        req.gps_latitude = Some(19.0760);
        req.gps_longitude = Some(72.8777);
        let outcome = fix
            .ingestor
            .ingest_event(req, ts("2026-01-15T10:00:05Z"))
            .unwrap();
        assert!(outcome.proof_required);
        assert!(!outcome.proof_validated);
        assert_eq!(
            outcome.violations,
            vec!["GPS location not within 200m of delivery address".to_string()]
        );
    }

    #[test]
    fn non_proof_ndr_passes_without_checks() {
        let fix = fixture();
        registered(&fix);

        let mut req = ndr_event("AWB1");
        req.ndr_code = Some(NdrCode::AddressIssue);
        req.gps_latitude = None;
        req.gps_longitude = None;
        req.call_duration_secs = None;
        let outcome = fix
            .ingestor
            .ingest_event(req, ts("2026-01-15T10:00:05Z"))
            .unwrap();
        assert!(!outcome.proof_required);
        assert!(outcome.violations.is_empty());
        assert_eq!(outcome.order_status, Some(OrderStatus::NdrOpen));
    }

    #[test]
    fn delivered_event_completes_order_and_shipment() {
        let fix = fixture();
        let (order, _) = registered(&fix);

        let req = IngestEvent {
            shipment_id: ShipmentId::new("AWB1").unwrap(),
            event_code: EventCode::Delivered,
            ndr_code: None,
            ndr_reason: None,
            gps_latitude: None,
            gps_longitude: None,
            call_duration_secs: None,
            call_outcome: None,
            occurred_at: ts("2026-01-15T10:00:00Z"),
        };
        let outcome = fix
            .ingestor
            .ingest_event(req, ts("2026-01-15T10:00:05Z"))
            .unwrap();
        assert_eq!(outcome.order_status, Some(OrderStatus::Delivered));
        assert!(!outcome.proof_required);

        let shipment = fix.repo.get_shipment(&ShipmentId::new("AWB1").unwrap()).unwrap();
        assert_eq!(shipment.status, ShipmentStatus::Delivered);
        let stored = fix.repo.get_order(&order.id).unwrap();
        assert_eq!(stored.status, OrderStatus::Delivered);
    }

    #[test]
    fn missing_order_degrades_not_fails() {
        let fix = fixture();
        // Shipment exists but its order was never registered.
        fix.repo
            .insert_shipment(Shipment::new(
                ShipmentId::new("AWB9").unwrap(),
                OrderId::new("ORD-GONE").unwrap(),
                "delhivery".to_string(),
                ts("2026-01-11T09:00:00Z"),
            ))
            .unwrap();

        let outcome = fix
            .ingestor
            .ingest_event(ndr_event("AWB9"), ts("2026-01-15T10:00:05Z"))
            .unwrap();
        assert!(outcome.proof_required);
        assert!(!outcome.proof_validated);
        assert_eq!(
            outcome.violations,
            vec![VIOLATION_CONTEXT_UNAVAILABLE.to_string()]
        );
        assert!(outcome.order_status.is_none());
        // Unattributable: nothing published for this event.
        assert!(fix.sink.updates().is_empty());
    }

    #[test]
    fn half_a_coordinate_pair_is_rejected() {
        let fix = fixture();
        registered(&fix);

        let mut req = ndr_event("AWB1");
        req.gps_longitude = None;
        assert!(matches!(
            fix.ingestor.ingest_event(req, ts("2026-01-15T10:00:05Z")),
            Err(EngineError::Validation(ValidationError::MissingField("gps_longitude")))
        ));
    }

    #[test]
    fn out_of_range_coordinates_rejected() {
        let fix = fixture();
        registered(&fix);

        let mut req = ndr_event("AWB1");
        req.gps_latitude = Some(91.0);
        assert!(matches!(
            fix.ingestor.ingest_event(req, ts("2026-01-15T10:00:05Z")),
            Err(EngineError::Geo(_))
        ));
    }
}
