//! # Seller Challenge Workflow
//!
//! Sellers formally challenge suspicious NDRs on their orders; an external
//! adjudicator settles each challenge exactly once. This module owns both
//! ends of that workflow.
//!
//! ## Design Decision: adjudication is external
//!
//! The engine never decides a challenge on its own. Proof violations and the
//! customer's 2-hour dispute flag are evidence presented to the adjudicator,
//! not an automatic verdict. The engine's job is to keep the books straight:
//! one challenge per event, one resolution per challenge, and an overturn
//! recorded on the event only when the adjudicator accepts.

use std::sync::Arc;

use rto_core::{BrandId, ChallengeId, OrderId, Timestamp};
use rto_domain::{Challenge, ChallengeResolution};

use crate::error::EngineError;
use crate::sink::{AggregateUpdate, ShipmentFact, VerdictSink};
use crate::store::{latest_ndr_event, OrderLocks, Repository, StoreError};

/// A seller's request to challenge the latest NDR on an order.
#[derive(Debug, Clone)]
pub struct ChallengeRequest {
    /// The order the suspicious NDR sits on.
    pub order_id: OrderId,
    /// The seller raising the challenge. Must own the order.
    pub brand_id: BrandId,
    /// Why the seller believes the NDR is false.
    pub reason: String,
    /// Evidence artifacts the seller wants pulled.
    pub evidence_requested: Vec<String>,
    /// Free-form seller comments.
    pub comments: Option<String>,
}

/// Opens seller challenges and applies adjudication outcomes.
pub struct DisputeManager {
    repo: Arc<dyn Repository>,
    locks: Arc<OrderLocks>,
    sink: Arc<dyn VerdictSink>,
}

impl DisputeManager {
    /// Wire a manager over shared infrastructure.
    pub fn new(
        repo: Arc<dyn Repository>,
        locks: Arc<OrderLocks>,
        sink: Arc<dyn VerdictSink>,
    ) -> Self {
        Self { repo, locks, sink }
    }

    /// Open a challenge against the latest NDR event on an order.
    ///
    /// The order must belong to the requesting brand; a mismatch reports
    /// not-found rather than leaking another seller's order. A second
    /// challenge against an already-challenged event is rejected.
    pub fn open_challenge(
        &self,
        req: ChallengeRequest,
        now: Timestamp,
    ) -> Result<Challenge, EngineError> {
        let lock = self.locks.acquire(&req.order_id);
        let _guard = lock.lock();

        let mut order = self.repo.get_order(&req.order_id).map_err(|e| match e {
            StoreError::NotFound { .. } => EngineError::OrderNotFound(req.order_id.to_string()),
            other => EngineError::Store(other),
        })?;
        if order.brand_id != req.brand_id {
            return Err(EngineError::OrderNotFound(req.order_id.to_string()));
        }

        let mut event = latest_ndr_event(self.repo.as_ref(), &order.id)?;

        let challenge = Challenge::open(
            order.id.clone(),
            req.brand_id,
            event.id,
            req.reason,
            req.evidence_requested,
            req.comments,
            now,
        );
        event.mark_challenged(challenge.id)?;
        order.mark_challenged(
            serde_json::json!({
                "event_id": event.id.to_string(),
                "challenge_id": challenge.id.to_string(),
                "challenged_by": "SELLER",
            }),
            now,
        )?;

        self.repo.insert_challenge(challenge.clone())?;
        self.repo.put_event(event)?;
        self.repo.put_order(order)?;

        tracing::info!(
            challenge_id = %challenge.id,
            order_id = %challenge.order_id,
            brand_id = %challenge.brand_id,
            "seller challenge opened"
        );
        Ok(challenge)
    }

    /// Apply an adjudication outcome to a challenge.
    ///
    /// Accepting overturns the NDR on the underlying event and publishes the
    /// prevented RTO to the metrics boundary; rejecting leaves the event as
    /// recorded. Either way the challenge resolves exactly once.
    pub fn apply_adjudication(
        &self,
        challenge_id: &ChallengeId,
        resolution: ChallengeResolution,
        now: Timestamp,
    ) -> Result<Challenge, EngineError> {
        // First read only learns which order to lock; the copy acted on is
        // re-fetched under the guard so concurrent adjudications of the same
        // challenge serialize and the loser sees the resolved state.
        let order_id = self.fetch_challenge(challenge_id)?.order_id;

        let lock = self.locks.acquire(&order_id);
        let _guard = lock.lock();

        let mut challenge = self.fetch_challenge(challenge_id)?;
        challenge.resolve(resolution, now)?;

        if resolution == ChallengeResolution::Accepted {
            let mut event = self.repo.get_event(&challenge.event_id)?;
            event.mark_overturned();
            let shipment = self.repo.get_shipment(&event.shipment_id)?;
            self.repo.put_event(event)?;

            let order = self.repo.get_order(&challenge.order_id)?;
            let address = self.repo.get_address(&order.address_id)?;
            self.sink.publish(AggregateUpdate::NdrOverturned(ShipmentFact {
                brand_id: order.brand_id.clone(),
                carrier: shipment.carrier.clone(),
                dest_pincode: address.pincode.clone(),
                timestamp: now,
            }));
        }

        self.repo.put_challenge(challenge.clone())?;

        tracing::info!(
            challenge_id = %challenge.id,
            resolution = %resolution,
            "challenge adjudicated"
        );
        Ok(challenge)
    }

    fn fetch_challenge(&self, challenge_id: &ChallengeId) -> Result<Challenge, EngineError> {
        self.repo.get_challenge(challenge_id).map_err(|e| match e {
            StoreError::NotFound { .. } => {
                EngineError::ChallengeNotFound(challenge_id.to_string())
            }
            other => EngineError::Store(other),
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
