//! # Order Resolution Lifecycle
//!
//! Models an order's path through non-delivery resolution.
//!
//! ## States
//!
//! ```text
//! Placed ──▶ NdrOpen ──▶ RescheduleRequested ─┐
//!               │    ──▶ AddressChangeRequested ─┤──▶ Delivered (terminal)
//!               │    ──▶ SelfPickupRequested ────┤──▶ RtoCompleted (terminal)
//!               │    ──▶ RtoInitiated ───────────┘
//!               │
//!               └──▶ NdrChallenged (terminal, customer dispute)
//! ```
//!
//! A later NDR event reopens a requested state back to `NdrOpen` (the
//! courier attempted again and failed again). `NdrChallenged` is reachable
//! from `NdrOpen` and from any requested state, because a customer can
//! dispute after having first picked another option.
//!
//! ## Design Decision
//!
//! An enum with validated transition methods rather than typestates: the
//! resolution graph is small, the invariants (at most one open resolution
//! action, terminal states never transition) are simple to check at runtime,
//! and orders must round-trip through storage, which typestates complicate.
//! Every accepted transition appends a [`ResolutionRecord`]; the trail is
//! never rewritten.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rto_core::{AddressId, BrandId, OrderId, PiiHash, Timestamp};

// ─── Payment Mode ────────────────────────────────────────────────────

/// How the order is paid. COD orders are the RTO risk pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    /// Cash on delivery.
    Cod,
    /// Paid at checkout.
    Prepaid,
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cod => f.write_str("COD"),
            Self::Prepaid => f.write_str("PREPAID"),
        }
    }
}

// ─── Order Status ────────────────────────────────────────────────────

/// The resolution state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order placed, no failed delivery reported.
    Placed,
    /// A non-delivery report is open and awaiting a resolution choice.
    NdrOpen,
    /// Customer asked for a new delivery attempt on a later date.
    RescheduleRequested,
    /// Customer supplied a corrected delivery address.
    AddressChangeRequested,
    /// Customer opted to collect from the carrier facility.
    SelfPickupRequested,
    /// Return-to-origin has been initiated with the carrier.
    RtoInitiated,
    /// Delivered to the customer (terminal).
    Delivered,
    /// Returned to the seller (terminal).
    RtoCompleted,
    /// Customer disputed that any delivery attempt happened (terminal).
    NdrChallenged,
}

impl OrderStatus {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::RtoCompleted | Self::NdrChallenged)
    }

    /// Whether a resolution action is already in flight.
    pub fn has_open_resolution(&self) -> bool {
        matches!(
            self,
            Self::RescheduleRequested
                | Self::AddressChangeRequested
                | Self::SelfPickupRequested
                | Self::RtoInitiated
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Placed => "PLACED",
            Self::NdrOpen => "NDR_OPEN",
            Self::RescheduleRequested => "RESCHEDULE_REQUESTED",
            Self::AddressChangeRequested => "ADDRESS_CHANGE_REQUESTED",
            Self::SelfPickupRequested => "SELF_PICKUP_REQUESTED",
            Self::RtoInitiated => "RTO_INITIATED",
            Self::Delivered => "DELIVERED",
            Self::RtoCompleted => "RTO_COMPLETED",
            Self::NdrChallenged => "NDR_CHALLENGED",
        };
        f.write_str(s)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors that can occur during order lifecycle transitions.
#[derive(Error, Debug)]
pub enum OrderError {
    /// Attempted transition is not valid from the current state.
    #[error("invalid order transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: String,
        /// Attempted target state.
        to: String,
    },

    /// A resolution action is already in flight for this order.
    #[error("order {order_id} already has an open resolution: {current}")]
    ResolutionInFlight {
        /// The order identifier.
        order_id: String,
        /// The in-flight resolution state.
        current: String,
    },

    /// Order is in a terminal state.
    #[error("order {order_id} is terminal ({status}) and cannot transition to {attempted}")]
    AlreadyTerminal {
        /// The order identifier.
        order_id: String,
        /// The terminal status.
        status: String,
        /// The transition that was attempted.
        attempted: String,
    },
}

// ─── Resolution Trail ────────────────────────────────────────────────

/// Record of one accepted order transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionRecord {
    /// State before the transition.
    pub from_status: OrderStatus,
    /// State after the transition.
    pub to_status: OrderStatus,
    /// When the transition was accepted.
    pub timestamp: Timestamp,
    /// Short label for the action (e.g. `RESCHEDULE`, `DISPUTE`).
    pub action: String,
    /// Free-form context: new address id, reschedule date, dispute window
    /// outcome. Shape varies per action.
    pub detail: serde_json::Value,
}

// ─── Order ───────────────────────────────────────────────────────────

/// An order with its resolution state and append-only trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Storefront order identifier.
    pub id: OrderId,
    /// The seller brand the order belongs to.
    pub brand_id: BrandId,
    /// Hashed customer contact. Raw contact data never persists.
    pub customer_contact: PiiHash,
    /// Payment mode.
    pub payment_mode: PaymentMode,
    /// Order value in the seller's currency.
    pub amount: f64,
    /// Current delivery address version.
    pub address_id: AddressId,
    /// Promised delivery date, updated by a reschedule.
    pub promised_delivery_date: Option<Timestamp>,
    /// Current resolution state.
    pub status: OrderStatus,
    /// When the order was registered.
    pub created_at: Timestamp,
    /// Ordered log of all accepted transitions.
    pub resolution_trail: Vec<ResolutionRecord>,
}

impl Order {
    /// Register a new order in the `Placed` state.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: OrderId,
        brand_id: BrandId,
        customer_contact: PiiHash,
        payment_mode: PaymentMode,
        amount: f64,
        address_id: AddressId,
        promised_delivery_date: Option<Timestamp>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            brand_id,
            customer_contact,
            payment_mode,
            amount,
            address_id,
            promised_delivery_date,
            status: OrderStatus::Placed,
            created_at,
            resolution_trail: Vec::new(),
        }
    }

    /// Open (or reopen) a non-delivery report against this order.
    ///
    /// Valid from `Placed` and from any requested state — a fresh NDR after
    /// a reschedule means the retry attempt also failed. Idempotent when the
    /// order is already in `NdrOpen`.
    pub fn open_ndr(&mut self, now: Timestamp) -> Result<(), OrderError> {
        self.require_not_terminal("NDR_OPEN")?;
        if self.status == OrderStatus::NdrOpen {
            return Ok(());
        }
        self.record(OrderStatus::NdrOpen, now, "NDR_REPORTED", serde_json::Value::Null);
        Ok(())
    }

    /// Customer asked for another attempt on `date` (NDR_OPEN → RESCHEDULE_REQUESTED).
    ///
    /// Also updates the promised delivery date.
    pub fn request_reschedule(&mut self, date: Timestamp, now: Timestamp) -> Result<(), OrderError> {
        self.require_ndr_open("RESCHEDULE_REQUESTED")?;
        self.promised_delivery_date = Some(date);
        self.record(
            OrderStatus::RescheduleRequested,
            now,
            "RESCHEDULE",
            serde_json::json!({ "reschedule_date": date.to_iso8601() }),
        );
        Ok(())
    }

    /// Customer supplied a corrected address (NDR_OPEN → ADDRESS_CHANGE_REQUESTED).
    ///
    /// The order is repointed at the freshly minted address version; the old
    /// version stays untouched for audit.
    pub fn request_address_change(
        &mut self,
        new_address_id: AddressId,
        now: Timestamp,
    ) -> Result<(), OrderError> {
        self.require_ndr_open("ADDRESS_CHANGE_REQUESTED")?;
        let previous = self.address_id;
        self.address_id = new_address_id;
        self.record(
            OrderStatus::AddressChangeRequested,
            now,
            "CHANGE_ADDRESS",
            serde_json::json!({
                "previous_address_id": previous.to_string(),
                "new_address_id": new_address_id.to_string(),
            }),
        );
        Ok(())
    }

    /// Customer opted for self-pickup (NDR_OPEN → SELF_PICKUP_REQUESTED).
    pub fn request_self_pickup(&mut self, now: Timestamp) -> Result<(), OrderError> {
        self.require_ndr_open("SELF_PICKUP_REQUESTED")?;
        self.record(
            OrderStatus::SelfPickupRequested,
            now,
            "SELF_PICKUP",
            serde_json::Value::Null,
        );
        Ok(())
    }

    /// Initiate return-to-origin (NDR_OPEN → RTO_INITIATED).
    pub fn initiate_rto(&mut self, now: Timestamp) -> Result<(), OrderError> {
        self.require_ndr_open("RTO_INITIATED")?;
        self.record(OrderStatus::RtoInitiated, now, "RTO", serde_json::Value::Null);
        Ok(())
    }

    /// Customer disputed that any delivery attempt happened.
    ///
    /// Valid from `NdrOpen` and from any requested state. Idempotent when
    /// already challenged — a repeat dispute changes nothing.
    pub fn mark_challenged(
        &mut self,
        detail: serde_json::Value,
        now: Timestamp,
    ) -> Result<(), OrderError> {
        if self.status == OrderStatus::NdrChallenged {
            return Ok(());
        }
        self.require_not_terminal("NDR_CHALLENGED")?;
        if self.status == OrderStatus::Placed {
            return Err(OrderError::InvalidTransition {
                from: self.status.to_string(),
                to: "NDR_CHALLENGED".to_string(),
            });
        }
        self.record(OrderStatus::NdrChallenged, now, "DISPUTE", detail);
        Ok(())
    }

    /// The courier delivered the order (any non-terminal state → DELIVERED).
    pub fn mark_delivered(&mut self, now: Timestamp) -> Result<(), OrderError> {
        if self.status == OrderStatus::Delivered {
            return Ok(());
        }
        self.require_not_terminal("DELIVERED")?;
        self.record(OrderStatus::Delivered, now, "DELIVERED", serde_json::Value::Null);
        Ok(())
    }

    /// The return reached the seller (RTO_INITIATED → RTO_COMPLETED).
    pub fn complete_rto(&mut self, now: Timestamp) -> Result<(), OrderError> {
        self.require_not_terminal("RTO_COMPLETED")?;
        if self.status != OrderStatus::RtoInitiated {
            return Err(OrderError::InvalidTransition {
                from: self.status.to_string(),
                to: "RTO_COMPLETED".to_string(),
            });
        }
        self.record(OrderStatus::RtoCompleted, now, "RTO_COMPLETED", serde_json::Value::Null);
        Ok(())
    }

    /// Validate that the order is in `NdrOpen` before a resolution action.
    fn require_ndr_open(&self, target: &str) -> Result<(), OrderError> {
        self.require_not_terminal(target)?;
        if self.status.has_open_resolution() {
            return Err(OrderError::ResolutionInFlight {
                order_id: self.id.to_string(),
                current: self.status.to_string(),
            });
        }
        if self.status != OrderStatus::NdrOpen {
            return Err(OrderError::InvalidTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        Ok(())
    }

    fn require_not_terminal(&self, target: &str) -> Result<(), OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::AlreadyTerminal {
                order_id: self.id.to_string(),
                status: self.status.to_string(),
                attempted: target.to_string(),
            });
        }
        Ok(())
    }

    /// Append a trail record and apply the transition.
    fn record(
        &mut self,
        to: OrderStatus,
        now: Timestamp,
        action: &str,
        detail: serde_json::Value,
    ) {
        self.resolution_trail.push(ResolutionRecord {
            from_status: self.status,
            to_status: to,
            timestamp: now,
            action: action.to_string(),
            detail,
        });
        self.status = to;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
