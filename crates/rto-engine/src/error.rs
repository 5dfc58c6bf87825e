//! # Engine Error Taxonomy
//!
//! One error type for all engine operations. The API layer maps these onto
//! HTTP statuses; the variants are grouped accordingly (not-found, conflict,
//! validation, storage).

use thiserror::Error;

use rto_core::{GeoError, ValidationError};
use rto_domain::{ChallengeError, EventError, OrderError};

use crate::store::StoreError;

/// Errors from engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A courier event referenced a shipment this system has never seen.
    /// Events are rejected rather than attached to a fabricated shipment.
    #[error("unknown shipment: {0}")]
    UnknownShipment(String),

    /// The referenced order does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(String),

    /// A dispute or challenge was raised against an order with no NDR
    /// event on record.
    #[error("no NDR event found for order {0}")]
    NoNdrFound(String),

    /// The referenced challenge does not exist.
    #[error("challenge not found: {0}")]
    ChallengeNotFound(String),

    /// An inbound customer reply has no pending resolution request to
    /// attach to (never sent, already answered, or expired).
    #[error("no pending resolution request for this contact")]
    NoPendingResolution,

    /// Payload validation failure.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Coordinate validation failure.
    #[error(transparent)]
    Geo(#[from] GeoError),

    /// Order state machine rejection.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Courier event guard rejection (verdict rewrite, double challenge).
    #[error(transparent)]
    Event(#[from] EventError),

    /// Challenge lifecycle rejection.
    #[error(transparent)]
    Challenge(#[from] ChallengeError),

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}
