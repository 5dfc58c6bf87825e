#![deny(missing_docs)]

//! # rto-core — Foundational Types for the RTO Optimizer Stack
//!
//! This crate defines the foundational types that every other crate in the
//! workspace depends on. It has no internal crate dependencies — only `serde`,
//! `serde_json`, `thiserror`, `chrono`, `uuid`, and `sha2` from the external
//! ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** Every identifier is a
//!    distinct type. You cannot pass a [`ShipmentId`] where an [`OrderId`] is
//!    expected. Caller-supplied identifiers validate at construction; minted
//!    identifiers are always valid by construction.
//!
//! 2. **UTC-only [`Timestamp`].** Courier feeds arrive with mixed offsets and
//!    sloppy formats; everything is normalized to UTC with second precision
//!    at the boundary, so window arithmetic (dispute windows, lane buckets)
//!    never touches a local time zone.
//!
//! 3. **Raw contact data never persists.** [`PiiHash`] is the only form in
//!    which a phone number or email crosses into storage.
//!
//! 4. **Structured errors with `thiserror`.** No `Box<dyn Error>`, no
//!    `.unwrap()` outside tests.

pub mod error;
pub mod geo;
pub mod identity;
pub mod pii;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use error::ValidationError;
pub use geo::{distance_meters, GeoError, GeoPoint};
pub use identity::{AddressId, BrandId, ChallengeId, EventId, OrderId, ShipmentId};
pub use pii::PiiHash;
pub use temporal::Timestamp;
