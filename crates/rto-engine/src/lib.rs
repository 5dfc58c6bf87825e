#![deny(missing_docs)]

//! # rto-engine — Core Engine for the RTO Optimizer Stack
//!
//! The write-side of the system: courier event ingestion with
//! proof-of-attempt validation, NDR resolution orchestration, seller
//! dispute management, and the repository boundary they all share.
//!
//! ## Architecture
//!
//! ```text
//! courier feed ──▶ EventIngestor ──▶ Repository ──▶ VerdictSink ──▶ aggregator
//!                       │
//!                       └── NotificationSender + PendingResolutionStore
//!                               (customer engagement on NDR)
//!
//! customer ──▶ ResolutionOrchestrator ──▶ Repository
//! seller ────▶ DisputeManager ──────────▶ Repository ──▶ VerdictSink
//! ```
//!
//! All order mutations serialize through [`store::OrderLocks`]: acquire the
//! order's lock, read, validate, write. The [`sink::VerdictSink`] boundary
//! is fire-and-forget; read models lag writes and are labeled as such.

pub mod dispute;
pub mod error;
pub mod ingest;
pub mod notify;
pub mod pending;
pub mod proof;
pub mod resolution;
pub mod sink;
pub mod store;

pub use dispute::{ChallengeRequest, DisputeManager};
pub use error::EngineError;
pub use ingest::{EventIngestor, IngestEvent, IngestOutcome, NewOrder, NewShipment};
pub use notify::{DeliveryReceipt, LoggingSender, NotificationSender, NotifyError};
pub use pending::{PendingResolution, PendingResolutionStore};
pub use proof::{
    ProofValidator, ProofVerdict, MAX_GPS_DISTANCE_METERS, MIN_CALL_DURATION_SECS,
};
pub use resolution::{
    ResolutionAction, ResolutionOrchestrator, ResolutionOutcome, ResolutionRequest,
};
pub use sink::{AggregateUpdate, NullSink, RecordingSink, ShipmentFact, VerdictSink};
pub use store::{MemoryRepository, OrderLocks, Repository, Store, StoreError};
