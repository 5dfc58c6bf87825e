//! # Resolution Orchestration
//!
//! Applies a customer's resolution choice to an open NDR, whatever channel
//! it arrived on: the resolution API directly, or a reply to the messaging
//! prompt matched through the pending store.
//!
//! The dispute path carries the 2-hour timing rule: a dispute lodged within
//! two hours of the NDR event latches `overturned_within_2h` on the event,
//! which adjudication treats as strong signal. Later disputes still open a
//! challenge; they just lose the timing flag. `now` is an explicit argument
//! on every operation so the window is testable.

use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use rto_core::{ChallengeId, OrderId, PiiHash, Timestamp, ValidationError};
use rto_domain::{Address, AddressFields, Challenge, OrderStatus};

use crate::error::EngineError;
use crate::pending::PendingResolutionStore;
use crate::store::{latest_ndr_event, OrderLocks, Repository, StoreError};

/// The customer dispute window after an NDR event.
pub const DISPUTE_WINDOW_HOURS: i64 = 2;

/// A customer's resolution choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionAction {
    /// Try again on a later date.
    Reschedule,
    /// Deliver to a corrected address.
    #[serde(rename = "CHANGE_ADDRESS")]
    AddressChange,
    /// Customer collects from the carrier facility.
    SelfPickup,
    /// "Nobody ever came" — contest the NDR itself.
    Dispute,
    /// Give up and return to origin.
    Rto,
}

impl ResolutionAction {
    /// Map a free-text customer reply to an action.
    ///
    /// Accepts the menu digits from the resolution prompt and a few obvious
    /// keywords. `Rto` is not customer-selectable and never parses.
    pub fn parse_reply(message: &str) -> Option<Self> {
        let normalized = message.trim().to_lowercase();
        match normalized.as_str() {
            "1" | "reschedule" => Some(Self::Reschedule),
            "2" | "address" | "change address" => Some(Self::AddressChange),
            "3" | "pickup" | "self pickup" | "self-pickup" => Some(Self::SelfPickup),
            "4" | "dispute" => Some(Self::Dispute),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResolutionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Reschedule => "RESCHEDULE",
            Self::AddressChange => "CHANGE_ADDRESS",
            Self::SelfPickup => "SELF_PICKUP",
            Self::Dispute => "DISPUTE",
            Self::Rto => "RTO",
        };
        f.write_str(s)
    }
}

/// A resolution request for one order.
#[derive(Debug, Clone)]
pub struct ResolutionRequest {
    /// The chosen action.
    pub action: ResolutionAction,
    /// Required for `Reschedule`: the new attempt date, in the future.
    pub reschedule_date: Option<Timestamp>,
    /// Required for `AddressChange`: the corrected address.
    pub new_address: Option<AddressFields>,
    /// Free-form customer note, recorded on disputes.
    pub note: Option<String>,
}

/// What a resolution request produced.
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    /// The order acted on.
    pub order_id: OrderId,
    /// The action applied.
    pub action: ResolutionAction,
    /// The order's state afterwards.
    pub order_status: OrderStatus,
    /// For disputes: whether the 2-hour window was met.
    pub disputed_within_window: Option<bool>,
    /// For disputes: the challenge covering the disputed event.
    pub challenge_id: Option<ChallengeId>,
}

/// Applies resolution choices to orders.
pub struct ResolutionOrchestrator {
    repo: Arc<dyn Repository>,
    locks: Arc<OrderLocks>,
    pending: Arc<PendingResolutionStore>,
}

impl ResolutionOrchestrator {
    /// Wire an orchestrator over shared infrastructure.
    pub fn new(
        repo: Arc<dyn Repository>,
        locks: Arc<OrderLocks>,
        pending: Arc<PendingResolutionStore>,
    ) -> Self {
        Self {
            repo,
            locks,
            pending,
        }
    }

    /// Apply a resolution choice to an order.
    pub fn resolve(
        &self,
        order_id: &OrderId,
        req: ResolutionRequest,
        now: Timestamp,
    ) -> Result<ResolutionOutcome, EngineError> {
        let lock = self.locks.acquire(order_id);
        let _guard = lock.lock();

        let mut order = self.repo.get_order(order_id).map_err(|e| match e {
            StoreError::NotFound { .. } => EngineError::OrderNotFound(order_id.to_string()),
            other => EngineError::Store(other),
        })?;

        let mut disputed_within_window = None;
        let mut challenge_id = None;

        match req.action {
            ResolutionAction::Reschedule => {
                let date = req
                    .reschedule_date
                    .ok_or(ValidationError::MissingField("reschedule_date"))?;
                if date <= now {
                    return Err(ValidationError::InvalidField {
                        field: "reschedule_date",
                        reason: "must be in the future".to_string(),
                    }
                    .into());
                }
                order.request_reschedule(date, now)?;
            }
            ResolutionAction::AddressChange => {
                let fields = req
                    .new_address
                    .ok_or(ValidationError::MissingField("new_address"))?;
                let address = Address::new(fields, now)?;
                let new_id = address.id;
                self.repo.insert_address(address)?;
                order.request_address_change(new_id, now)?;
            }
            ResolutionAction::SelfPickup => {
                order.request_self_pickup(now)?;
            }
            ResolutionAction::Rto => {
                order.initiate_rto(now)?;
                // Latch RTO on the live shipment so later tracking noise
                // cannot unwind it.
                if let Some(mut shipment) =
                    self.repo.shipments_for_order(order_id)?.into_iter().last()
                {
                    shipment.mark_rto();
                    self.repo.put_shipment(shipment)?;
                }
            }
            ResolutionAction::Dispute => {
                let (within, id) = self.apply_dispute(&mut order, req.note.clone(), now)?;
                disputed_within_window = Some(within);
                challenge_id = Some(id);
            }
        }

        self.repo.put_order(order.clone())?;
        self.pending.complete(&order.customer_contact);

        tracing::info!(
            order_id = %order.id,
            action = %req.action,
            status = %order.status,
            "resolution applied"
        );

        Ok(ResolutionOutcome {
            order_id: order.id,
            action: req.action,
            order_status: order.status,
            disputed_within_window,
            challenge_id,
        })
    }

    /// Apply a resolution parsed from an inbound message reply.
    ///
    /// The sender is identified by hashed contact and matched against the
    /// pending store. `Reschedule` without a date defaults to tomorrow;
    /// `AddressChange` cannot be completed over a bare reply and returns a
    /// validation error directing the caller to the resolution API.
    pub fn resolve_from_reply(
        &self,
        contact_raw: &str,
        message: &str,
        now: Timestamp,
    ) -> Result<ResolutionOutcome, EngineError> {
        let contact = PiiHash::of(contact_raw);
        let pending = self
            .pending
            .active(&contact, now)
            .ok_or(EngineError::NoPendingResolution)?;

        let action = ResolutionAction::parse_reply(message).ok_or_else(|| {
            ValidationError::InvalidField {
                field: "message",
                reason: format!("\"{}\" is not a recognized resolution option", message.trim()),
            }
        })?;

        let req = match action {
            ResolutionAction::Reschedule => ResolutionRequest {
                action,
                reschedule_date: Some(now.plus(Duration::hours(24))),
                new_address: None,
                note: None,
            },
            ResolutionAction::AddressChange => {
                return Err(ValidationError::InvalidField {
                    field: "message",
                    reason: "address change needs full address fields; use the resolution API"
                        .to_string(),
                }
                .into());
            }
            _ => ResolutionRequest {
                action,
                reschedule_date: None,
                new_address: None,
                note: Some(message.trim().to_string()),
            },
        };

        self.resolve(&pending.order_id, req, now)
    }

    /// The dispute branch: latch the window flag on the latest NDR event,
    /// ensure a challenge covers it, and terminally challenge the order.
    /// Idempotent end to end — a repeat dispute reports the existing
    /// challenge and changes nothing.
    fn apply_dispute(
        &self,
        order: &mut rto_domain::Order,
        note: Option<String>,
        now: Timestamp,
    ) -> Result<(bool, ChallengeId), EngineError> {
        let mut event = latest_ndr_event(self.repo.as_ref(), &order.id)?;

        let within = now.since(&event.occurred_at) <= Duration::hours(DISPUTE_WINDOW_HOURS);
        if within {
            event.mark_disputed_within_window();
        }

        let challenge_id = match event.challenged_by {
            Some(existing) => existing,
            None => {
                let challenge = Challenge::open(
                    order.id.clone(),
                    order.brand_id.clone(),
                    event.id,
                    "CUSTOMER_DISPUTE".to_string(),
                    Vec::new(),
                    note,
                    now,
                );
                let id = challenge.id;
                event.mark_challenged(id)?;
                self.repo.insert_challenge(challenge)?;
                id
            }
        };

        self.repo.put_event(event.clone())?;
        order.mark_challenged(
            serde_json::json!({
                "event_id": event.id.to_string(),
                "within_2h": within,
                "challenge_id": challenge_id.to_string(),
            }),
            now,
        )?;

        Ok((within, challenge_id))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{EventIngestor, IngestEvent, NewOrder, NewShipment};
    use crate::notify::LoggingSender;
    use crate::sink::NullSink;
    use crate::store::MemoryRepository;
    use rto_core::{BrandId, GeoPoint, ShipmentId};
    use rto_domain::{ChallengeStatus, EventCode, NdrCode, PaymentMode, ShipmentStatus};

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    struct Fixture {
        repo: Arc<MemoryRepository>,
        ingestor: EventIngestor,
        orchestrator: ResolutionOrchestrator,
        pending: Arc<PendingResolutionStore>,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(MemoryRepository::new());
        let locks = Arc::new(OrderLocks::new());
        let pending = Arc::new(PendingResolutionStore::new());
        let ingestor = EventIngestor::new(
            repo.clone(),
            locks.clone(),
            Arc::new(NullSink),
            Arc::new(LoggingSender),
            pending.clone(),
        );
        let orchestrator = ResolutionOrchestrator::new(repo.clone(), locks, pending.clone());
        Fixture {
            repo,
            ingestor,
            orchestrator,
            pending,
        }
    }

    /// Register an order + shipment and ingest an NDR at 10:00.
    fn with_open_ndr(fix: &Fixture) -> OrderId {
        let order = fix
            .ingestor
            .register_order(
                NewOrder {
                    order_id: OrderId::new("ORD-1").unwrap(),
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
                },
                ts("2026-01-10T09:00:00Z"),
            )
            .unwrap();
        fix.ingestor
            .register_shipment(
                NewShipment {
                    shipment_id: ShipmentId::new("AWB1").unwrap(),
                    order_id: order.id.clone(),
                    carrier: "delhivery".to_string(),
                },
                ts("2026-01-11T09:00:00Z"),
            )
            .unwrap();
        fix.ingestor
            .ingest_event(
                IngestEvent {
                    shipment_id: ShipmentId::new("AWB1").unwrap(),
                    event_code: EventCode::Ndr,
                    ndr_code: Some(NdrCode::CustomerUnavailable),
                    ndr_reason: None,
                    gps_latitude: Some(12.9716),
                    gps_longitude: Some(77.5946),
                    call_duration_secs: Some(25),
                    call_outcome: None,
                    occurred_at: ts("2026-01-15T10:00:00Z"),
                },
                ts("2026-01-15T10:00:05Z"),
            )
            .unwrap();
        order.id
    }

    fn request(action: ResolutionAction) -> ResolutionRequest {
        ResolutionRequest {
            action,
            reschedule_date: None,
            new_address: None,
            note: None,
        }
    }

    // ── Reschedule ───────────────────────────────────────────────────

    #[test]
    fn reschedule_updates_promised_date() {
        let fix = fixture();
        let order_id = with_open_ndr(&fix);
        let mut req = request(ResolutionAction::Reschedule);
        req.reschedule_date = Some(ts("2026-01-18T00:00:00Z"));

        let outcome = fix
            .orchestrator
            .resolve(&order_id, req, ts("2026-01-15T11:00:00Z"))
            .unwrap();
        assert_eq!(outcome.order_status, OrderStatus::RescheduleRequested);

        let order = fix.repo.get_order(&order_id).unwrap();
        assert_eq!(order.promised_delivery_date, Some(ts("2026-01-18T00:00:00Z")));
    }

    #[test]
    fn reschedule_requires_future_date() {
        let fix = fixture();
        let order_id = with_open_ndr(&fix);

        let mut req = request(ResolutionAction::Reschedule);
        req.reschedule_date = Some(ts("2026-01-15T09:00:00Z"));
        assert!(matches!(
            fix.orchestrator.resolve(&order_id, req, ts("2026-01-15T11:00:00Z")),
            Err(EngineError::Validation(_))
        ));

        let req = request(ResolutionAction::Reschedule);
        assert!(matches!(
            fix.orchestrator.resolve(&order_id, req, ts("2026-01-15T11:00:00Z")),
            Err(EngineError::Validation(ValidationError::MissingField("reschedule_date")))
        ));
    }

    // ── Address change ───────────────────────────────────────────────

    #[test]
    fn address_change_mints_new_version_and_keeps_old() {
        let fix = fixture();
        let order_id = with_open_ndr(&fix);
        let old_address_id = fix.repo.get_order(&order_id).unwrap().address_id;

        let mut req = request(ResolutionAction::AddressChange);
        req.new_address = Some(AddressFields {
            line1: "7 Marine Drive".to_string(),
            line2: None,
            city: "Mumbai".to_string(),
            state: "Maharashtra".to_string(),
            pincode: "400001".to_string(),
            location: GeoPoint::new(19.0760, 72.8777).ok(),
        });
        let outcome = fix
            .orchestrator
            .resolve(&order_id, req, ts("2026-01-15T11:00:00Z"))
            .unwrap();
        assert_eq!(outcome.order_status, OrderStatus::AddressChangeRequested);

        let order = fix.repo.get_order(&order_id).unwrap();
        assert_ne!(order.address_id, old_address_id);
        // The old version survives untouched.
        let old = fix.repo.get_address(&old_address_id).unwrap();
        assert_eq!(old.pincode, "560001");
        let new = fix.repo.get_address(&order.address_id).unwrap();
        assert_eq!(new.pincode, "400001");
    }

    // ── RTO ──────────────────────────────────────────────────────────

    #[test]
    fn rto_latches_shipment() {
        let fix = fixture();
        let order_id = with_open_ndr(&fix);
        let outcome = fix
            .orchestrator
            .resolve(&order_id, request(ResolutionAction::Rto), ts("2026-01-15T11:00:00Z"))
            .unwrap();
        assert_eq!(outcome.order_status, OrderStatus::RtoInitiated);

        let shipment = fix.repo.get_shipment(&ShipmentId::new("AWB1").unwrap()).unwrap();
        assert!(shipment.rto_initiated);
        assert_eq!(shipment.status, ShipmentStatus::Rto);
    }

    #[test]
    fn second_action_rejected_while_one_in_flight() {
        let fix = fixture();
        let order_id = with_open_ndr(&fix);
        fix.orchestrator
            .resolve(&order_id, request(ResolutionAction::SelfPickup), ts("2026-01-15T11:00:00Z"))
            .unwrap();
        assert!(matches!(
            fix.orchestrator.resolve(
                &order_id,
                request(ResolutionAction::Rto),
                ts("2026-01-15T11:05:00Z")
            ),
            Err(EngineError::Order(_))
        ));
    }

    // ── Dispute ──────────────────────────────────────────────────────

    #[test]
    fn dispute_within_window_latches_flag() {
        let fix = fixture();
        let order_id = with_open_ndr(&fix);

        // NDR occurred at 10:00; 119 minutes later is inside the window.
        let outcome = fix
            .orchestrator
            .resolve(&order_id, request(ResolutionAction::Dispute), ts("2026-01-15T11:59:00Z"))
            .unwrap();
        assert_eq!(outcome.disputed_within_window, Some(true));
        assert_eq!(outcome.order_status, OrderStatus::NdrChallenged);

        let event = latest_ndr_event(fix.repo.as_ref(), &order_id).unwrap();
        assert!(event.overturned_within_2h);
        // The verdict itself is untouched.
        assert!(event.proof_validated);

        let challenge = fix.repo.get_challenge(&outcome.challenge_id.unwrap()).unwrap();
        assert_eq!(challenge.status, ChallengeStatus::UnderReview);
        assert_eq!(challenge.reason, "CUSTOMER_DISPUTE");
    }

    #[test]
    fn dispute_at_exactly_two_hours_is_within() {
        let fix = fixture();
        let order_id = with_open_ndr(&fix);
        let outcome = fix
            .orchestrator
            .resolve(&order_id, request(ResolutionAction::Dispute), ts("2026-01-15T12:00:00Z"))
            .unwrap();
        assert_eq!(outcome.disputed_within_window, Some(true));
    }

    #[test]
    fn dispute_after_window_opens_challenge_without_flag() {
        let fix = fixture();
        let order_id = with_open_ndr(&fix);

        // 121 minutes after the NDR.
        let outcome = fix
            .orchestrator
            .resolve(&order_id, request(ResolutionAction::Dispute), ts("2026-01-15T12:01:00Z"))
            .unwrap();
        assert_eq!(outcome.disputed_within_window, Some(false));
        assert!(outcome.challenge_id.is_some());

        let event = latest_ndr_event(fix.repo.as_ref(), &order_id).unwrap();
        assert!(!event.overturned_within_2h);
    }

    #[test]
    fn repeat_dispute_is_idempotent() {
        let fix = fixture();
        let order_id = with_open_ndr(&fix);

        let first = fix
            .orchestrator
            .resolve(&order_id, request(ResolutionAction::Dispute), ts("2026-01-15T11:00:00Z"))
            .unwrap();
        let second = fix
            .orchestrator
            .resolve(&order_id, request(ResolutionAction::Dispute), ts("2026-01-15T11:30:00Z"))
            .unwrap();
        assert_eq!(first.challenge_id, second.challenge_id);

        // Still exactly one challenge for the brand.
        let challenges = fix
            .repo
            .challenges_for_brand(&BrandId::new("brand_acme").unwrap())
            .unwrap();
        assert_eq!(challenges.len(), 1);
    }

    #[test]
    fn dispute_without_ndr_rejected() {
        let fix = fixture();
        let order = fix
            .ingestor
            .register_order(
                NewOrder {
                    order_id: OrderId::new("ORD-2").unwrap(),
                    brand_id: BrandId::new("brand_acme").unwrap(),
                    customer_contact: "+919876500000".to_string(),
                    payment_mode: PaymentMode::Prepaid,
                    amount: 500.0,
                    address: AddressFields {
                        line1: "1 Park St".to_string(),
                        line2: None,
                        city: "Kolkata".to_string(),
                        state: "West Bengal".to_string(),
                        pincode: "700016".to_string(),
                        location: None,
                    },
                    promised_delivery_date: None,
                },
                ts("2026-01-10T09:00:00Z"),
            )
            .unwrap();
        let err = fix
            .orchestrator
            .resolve(&order.id, request(ResolutionAction::Dispute), ts("2026-01-15T11:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, EngineError::NoNdrFound(_)));
    }

    // ── Reply channel ────────────────────────────────────────────────

    #[test]
    fn reply_resolves_pending_order() {
        let fix = fixture();
        let order_id = with_open_ndr(&fix);

        // "1" is reschedule; defaults to tomorrow.
        let outcome = fix
            .orchestrator
            .resolve_from_reply("+919876543210", "1", ts("2026-01-15T10:30:00Z"))
            .unwrap();
        assert_eq!(outcome.order_id, order_id);
        assert_eq!(outcome.order_status, OrderStatus::RescheduleRequested);

        let order = fix.repo.get_order(&order_id).unwrap();
        assert_eq!(order.promised_delivery_date, Some(ts("2026-01-16T10:30:00Z")));
        // The prompt is consumed.
        assert!(fix
            .pending
            .active(&order.customer_contact, ts("2026-01-15T10:31:00Z"))
            .is_none());
    }

    #[test]
    fn reply_without_pending_prompt_rejected() {
        let fix = fixture();
        with_open_ndr(&fix);
        assert!(matches!(
            fix.orchestrator.resolve_from_reply("+910000000000", "1", ts("2026-01-15T10:30:00Z")),
            Err(EngineError::NoPendingResolution)
        ));
    }

    #[test]
    fn reply_after_expiry_rejected() {
        let fix = fixture();
        with_open_ndr(&fix);
        // Prompt sent at 10:00:05; expires two hours later.
        assert!(matches!(
            fix.orchestrator.resolve_from_reply("+919876543210", "1", ts("2026-01-15T12:30:00Z")),
            Err(EngineError::NoPendingResolution)
        ));
    }

    #[test]
    fn unrecognized_reply_rejected() {
        let fix = fixture();
        with_open_ndr(&fix);
        assert!(matches!(
            fix.orchestrator.resolve_from_reply("+919876543210", "9", ts("2026-01-15T10:30:00Z")),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn parse_reply_variants() {
        assert_eq!(ResolutionAction::parse_reply(" 1 "), Some(ResolutionAction::Reschedule));
        assert_eq!(ResolutionAction::parse_reply("Dispute"), Some(ResolutionAction::Dispute));
        assert_eq!(ResolutionAction::parse_reply("self pickup"), Some(ResolutionAction::SelfPickup));
        assert_eq!(ResolutionAction::parse_reply("rto"), None);
        assert_eq!(ResolutionAction::parse_reply(""), None);
    }
}
