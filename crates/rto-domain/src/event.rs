//! # Courier Events
//!
//! Append-only records of carrier tracking events. An event's proof verdict
//! is written exactly once when the event is ingested; the dispute workflow
//! may then flip one-way latches (`challenged`, `overturned`) but can never
//! rewrite the verdict itself. What the courier claimed, and what the
//! validator concluded at that moment, is evidence.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rto_core::{ChallengeId, EventId, GeoPoint, ShipmentId, Timestamp};

// ─── Event and NDR Codes ─────────────────────────────────────────────

/// Carrier tracking event code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCode {
    /// Picked up from the seller.
    PickedUp,
    /// Moving through the carrier network.
    InTransit,
    /// With the delivery rider.
    OutForDelivery,
    /// Non-delivery report: an attempt failed.
    Ndr,
    /// Delivered to the customer.
    Delivered,
}

impl std::fmt::Display for EventCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PickedUp => "PICKED_UP",
            Self::InTransit => "IN_TRANSIT",
            Self::OutForDelivery => "OUT_FOR_DELIVERY",
            Self::Ndr => "NDR",
            Self::Delivered => "DELIVERED",
        };
        f.write_str(s)
    }
}

/// Why the carrier says the delivery attempt failed.
///
/// Only `CustomerUnavailable` puts the burden of proof on the courier;
/// unrecognized upstream codes collapse into `Other` rather than failing
/// ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NdrCode {
    /// "Customer not available" — the contested claim proof applies to.
    CustomerUnavailable,
    /// Address could not be located.
    AddressIssue,
    /// Customer refused the package.
    CustomerRefused,
    /// Anything else the carrier reports.
    #[serde(other)]
    Other,
}

impl std::fmt::Display for NdrCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CustomerUnavailable => "CUSTOMER_UNAVAILABLE",
            Self::AddressIssue => "ADDRESS_ISSUE",
            Self::CustomerRefused => "CUSTOMER_REFUSED",
            Self::Other => "OTHER",
        };
        f.write_str(s)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors mutating a courier event record.
#[derive(Error, Debug)]
pub enum EventError {
    /// The proof verdict has already been written for this event.
    #[error("proof verdict already recorded for event {event_id}")]
    VerdictAlreadyRecorded {
        /// The event identifier.
        event_id: String,
    },

    /// The event is already under a seller challenge.
    #[error("event {event_id} is already challenged by {challenge_id}")]
    AlreadyChallenged {
        /// The event identifier.
        event_id: String,
        /// The existing challenge identifier.
        challenge_id: String,
    },
}

// ─── Courier Event ───────────────────────────────────────────────────

/// One carrier tracking event with its proof-of-attempt verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierEvent {
    /// Unique event identifier, minted at ingestion.
    pub id: EventId,
    /// The shipment this event belongs to.
    pub shipment_id: ShipmentId,
    /// Carrier tracking code.
    pub event_code: EventCode,
    /// Failure reason, present on NDR events.
    pub ndr_code: Option<NdrCode>,
    /// Free-text reason from the carrier feed.
    pub ndr_reason: Option<String>,
    /// Rider GPS at the claimed attempt, when reported.
    pub gps: Option<GeoPoint>,
    /// Duration of the rider's call to the customer, in seconds.
    pub call_duration_secs: Option<u32>,
    /// Outcome label from the rider's call log (connected, no answer),
    /// when the carrier reports one. Informational; the verdict uses only
    /// the duration.
    #[serde(default)]
    pub call_outcome: Option<String>,
    /// When the carrier says the event happened.
    pub occurred_at: Timestamp,
    /// When this system ingested the event.
    pub received_at: Timestamp,
    /// Whether proof of attempt was demanded for this event.
    pub proof_required: bool,
    /// Whether the demanded proof held up. Always `false` when proof was
    /// not required.
    pub proof_validated: bool,
    /// Human-readable reasons the proof failed, empty when it held.
    pub violations: Vec<String>,
    /// Whether the verdict has been written (write-once guard).
    verdict_recorded: bool,
    /// The seller challenge covering this event, if any (one-way).
    pub challenged_by: Option<ChallengeId>,
    /// Customer disputed within the 2-hour window (one-way).
    pub overturned_within_2h: bool,
    /// Adjudication overturned this NDR (one-way).
    pub overturned: bool,
}

impl CourierEvent {
    /// Build a new event record with an unwritten verdict.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        shipment_id: ShipmentId,
        event_code: EventCode,
        ndr_code: Option<NdrCode>,
        ndr_reason: Option<String>,
        gps: Option<GeoPoint>,
        call_duration_secs: Option<u32>,
        occurred_at: Timestamp,
        received_at: Timestamp,
    ) -> Self {
        Self {
            id: EventId::new(),
            shipment_id,
            event_code,
            ndr_code,
            ndr_reason,
            gps,
            call_duration_secs,
            call_outcome: None,
            occurred_at,
            received_at,
            proof_required: false,
            proof_validated: false,
            violations: Vec::new(),
            verdict_recorded: false,
            challenged_by: None,
            overturned_within_2h: false,
            overturned: false,
        }
    }

    /// Whether this event demands proof of attempt: an NDR whose carrier
    /// claims the customer was unavailable.
    pub fn requires_proof(&self) -> bool {
        self.event_code == EventCode::Ndr && self.ndr_code == Some(NdrCode::CustomerUnavailable)
    }

    /// Whether this is a non-delivery report.
    pub fn is_ndr(&self) -> bool {
        self.event_code == EventCode::Ndr
    }

    /// Write the proof verdict. Exactly once per event.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::VerdictAlreadyRecorded`] on a second write.
    pub fn record_verdict(
        &mut self,
        proof_required: bool,
        proof_validated: bool,
        violations: Vec<String>,
    ) -> Result<(), EventError> {
        if self.verdict_recorded {
            return Err(EventError::VerdictAlreadyRecorded {
                event_id: self.id.to_string(),
            });
        }
        self.proof_required = proof_required;
        self.proof_validated = proof_validated;
        self.violations = violations;
        self.verdict_recorded = true;
        Ok(())
    }

    /// Whether the verdict has been written.
    pub fn verdict_recorded(&self) -> bool {
        self.verdict_recorded
    }

    /// Attach a seller challenge. An event carries at most one.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::AlreadyChallenged`] if a challenge is already
    /// attached.
    pub fn mark_challenged(&mut self, challenge_id: ChallengeId) -> Result<(), EventError> {
        if let Some(existing) = self.challenged_by {
            return Err(EventError::AlreadyChallenged {
                event_id: self.id.to_string(),
                challenge_id: existing.to_string(),
            });
        }
        self.challenged_by = Some(challenge_id);
        Ok(())
    }

    /// Latch the in-window customer dispute flag. Idempotent.
    pub fn mark_disputed_within_window(&mut self) {
        self.overturned_within_2h = true;
    }

    /// Latch the adjudicated-overturn flag. Idempotent. Never touches the
    /// proof verdict.
    pub fn mark_overturned(&mut self) {
        self.overturned = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn ndr_event(ndr_code: NdrCode) -> CourierEvent {
        CourierEvent::new(
            ShipmentId::new("AWB1001").unwrap(),
            EventCode::Ndr,
            Some(ndr_code),
            Some("customer not reachable".to_string()),
            GeoPoint::new(12.9716, 77.5946).ok(),
            Some(25),
            ts("2026-01-15T10:00:00Z"),
            ts("2026-01-15T10:00:05Z"),
        )
    }

    #[test]
    fn proof_required_only_for_customer_unavailable_ndr() {
        assert!(ndr_event(NdrCode::CustomerUnavailable).requires_proof());
        assert!(!ndr_event(NdrCode::AddressIssue).requires_proof());
        assert!(!ndr_event(NdrCode::CustomerRefused).requires_proof());

        let delivered = CourierEvent::new(
            ShipmentId::new("AWB1001").unwrap(),
            EventCode::Delivered,
            None,
            None,
            None,
            None,
            ts("2026-01-15T10:00:00Z"),
            ts("2026-01-15T10:00:05Z"),
        );
        assert!(!delivered.requires_proof());
    }

    #[test]
    fn verdict_is_write_once() {
        let mut e = ndr_event(NdrCode::CustomerUnavailable);
        e.record_verdict(true, true, vec![]).unwrap();
        assert!(e.verdict_recorded());
        assert!(e.proof_validated);

        let err = e
            .record_verdict(true, false, vec!["late rewrite".to_string()])
            .unwrap_err();
        assert!(matches!(err, EventError::VerdictAlreadyRecorded { .. }));
        // First verdict untouched.
        assert!(e.proof_validated);
        assert!(e.violations.is_empty());
    }

    #[test]
    fn challenge_attaches_once() {
        let mut e = ndr_event(NdrCode::CustomerUnavailable);
        let first = ChallengeId::new();
        e.mark_challenged(first).unwrap();
        assert_eq!(e.challenged_by, Some(first));

        let err = e.mark_challenged(ChallengeId::new()).unwrap_err();
        assert!(matches!(err, EventError::AlreadyChallenged { .. }));
        assert_eq!(e.challenged_by, Some(first));
    }

    #[test]
    fn latches_are_idempotent_and_leave_verdict_alone() {
        let mut e = ndr_event(NdrCode::CustomerUnavailable);
        e.record_verdict(true, true, vec![]).unwrap();

        e.mark_disputed_within_window();
        e.mark_disputed_within_window();
        assert!(e.overturned_within_2h);

        e.mark_overturned();
        e.mark_overturned();
        assert!(e.overturned);
        assert!(e.proof_validated);
    }

    #[test]
    fn ndr_code_unknown_string_deserializes_to_other() {
        let code: NdrCode = serde_json::from_str("\"WEATHER_DELAY\"").unwrap();
        assert_eq!(code, NdrCode::Other);
    }

    #[test]
    fn event_code_serde_is_screaming_snake() {
        assert_eq!(serde_json::to_string(&EventCode::OutForDelivery).unwrap(), "\"OUT_FOR_DELIVERY\"");
        assert_eq!(serde_json::to_string(&EventCode::Ndr).unwrap(), "\"NDR\"");
        let parsed: EventCode = serde_json::from_str("\"PICKED_UP\"").unwrap();
        assert_eq!(parsed, EventCode::PickedUp);
    }

    #[test]
    fn serialization_roundtrip_preserves_guard() {
        let mut e = ndr_event(NdrCode::CustomerUnavailable);
        e.record_verdict(true, false, vec!["Missing GPS coordinates".to_string()])
            .unwrap();
        let json = serde_json::to_string(&e).unwrap();
        let parsed: CourierEvent = serde_json::from_str(&json).unwrap();
        assert!(parsed.verdict_recorded());
        assert_eq!(parsed.violations, e.violations);
    }
}
