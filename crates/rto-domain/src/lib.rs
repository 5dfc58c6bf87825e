#![deny(missing_docs)]

//! # rto-domain — Domain Model for the RTO Optimizer Stack
//!
//! Pure domain types with no I/O: orders and their resolution lifecycle,
//! immutable delivery address versions, shipments, append-only courier
//! events, and seller challenges.
//!
//! ## Design Principles
//!
//! 1. **State machines, not status strings.** Order and challenge lifecycles
//!    are enums with validated transition methods. Invalid transitions are
//!    rejected with structured errors, never silently applied.
//!
//! 2. **Append, never overwrite.** Orders carry an ordered resolution trail;
//!    courier events are write-once for their proof verdict and expose only
//!    one-way latches for the dispute workflow. History is evidence.
//!
//! 3. **Addresses are immutable.** A customer-requested address change mints
//!    a new [`Address`] row; the row an earlier proof verdict was computed
//!    against is never touched.

pub mod address;
pub mod challenge;
pub mod event;
pub mod order;
pub mod shipment;

pub use address::{Address, AddressFields};
pub use challenge::{Challenge, ChallengeError, ChallengeResolution, ChallengeStatus};
pub use event::{CourierEvent, EventCode, EventError, NdrCode};
pub use order::{Order, OrderError, OrderStatus, PaymentMode, ResolutionRecord};
pub use shipment::{Shipment, ShipmentStatus};
