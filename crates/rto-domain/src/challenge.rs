//! # Seller Challenges
//!
//! A challenge is a seller's formal objection to a suspicious NDR on one of
//! their orders. It opens under review with a 24-hour expected resolution
//! and is resolved exactly once by an external adjudication.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rto_core::{BrandId, ChallengeId, EventId, OrderId, Timestamp};

/// Expected adjudication turnaround.
const EXPECTED_RESOLUTION_HOURS: i64 = 24;

/// Challenge lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengeStatus {
    /// Awaiting adjudication.
    UnderReview,
    /// Adjudicated (terminal).
    Resolved,
}

impl std::fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnderReview => f.write_str("UNDER_REVIEW"),
            Self::Resolved => f.write_str("RESOLVED"),
        }
    }
}

/// Adjudication outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengeResolution {
    /// The challenge held: the NDR is overturned.
    Accepted,
    /// The challenge failed: the NDR stands.
    Rejected,
}

impl std::fmt::Display for ChallengeResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accepted => f.write_str("ACCEPTED"),
            Self::Rejected => f.write_str("REJECTED"),
        }
    }
}

/// Errors mutating a challenge.
#[derive(Error, Debug)]
pub enum ChallengeError {
    /// The challenge has already been adjudicated.
    #[error("challenge {challenge_id} is already resolved")]
    AlreadyResolved {
        /// The challenge identifier.
        challenge_id: String,
    },
}

/// A seller's objection to an NDR event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    /// Unique challenge identifier.
    pub id: ChallengeId,
    /// The disputed order.
    pub order_id: OrderId,
    /// The seller raising the challenge.
    pub brand_id: BrandId,
    /// The NDR event under objection.
    pub event_id: EventId,
    /// Why the seller believes the NDR is false.
    pub reason: String,
    /// Evidence artifacts the seller wants pulled (call logs, GPS trace).
    pub evidence_requested: Vec<String>,
    /// Free-form seller comments.
    pub comments: Option<String>,
    /// Lifecycle state.
    pub status: ChallengeStatus,
    /// Adjudication outcome, present once resolved.
    pub resolution: Option<ChallengeResolution>,
    /// When the challenge was opened.
    pub created_at: Timestamp,
    /// When adjudication is expected (created_at + 24h).
    pub expected_resolution_at: Timestamp,
    /// When adjudication actually landed.
    pub resolved_at: Option<Timestamp>,
}

impl Challenge {
    /// Open a new challenge under review.
    pub fn open(
        order_id: OrderId,
        brand_id: BrandId,
        event_id: EventId,
        reason: String,
        evidence_requested: Vec<String>,
        comments: Option<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: ChallengeId::new(),
            order_id,
            brand_id,
            event_id,
            reason,
            evidence_requested,
            comments,
            status: ChallengeStatus::UnderReview,
            resolution: None,
            created_at,
            expected_resolution_at: created_at.plus(Duration::hours(EXPECTED_RESOLUTION_HOURS)),
            resolved_at: None,
        }
    }

    /// Record the adjudication outcome. Exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeError::AlreadyResolved`] on a second resolution.
    pub fn resolve(
        &mut self,
        resolution: ChallengeResolution,
        now: Timestamp,
    ) -> Result<(), ChallengeError> {
        if self.status == ChallengeStatus::Resolved {
            return Err(ChallengeError::AlreadyResolved {
                challenge_id: self.id.to_string(),
            });
        }
        self.status = ChallengeStatus::Resolved;
        self.resolution = Some(resolution);
        self.resolved_at = Some(now);
        Ok(())
    }

    /// Whether adjudication is overdue at `now`.
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        self.status == ChallengeStatus::UnderReview && now > self.expected_resolution_at
    }
}
