//! # RTO Metrics
//!
//! Streaming read models over the engine's aggregation boundary: per-lane
//! carrier scorecards and per-seller dashboards, folded incrementally from
//! [`AggregateUpdate`](rto_engine::AggregateUpdate)s as they are published.
//!
//! Nothing here re-reads the order books. Every figure is derivable from the
//! update stream alone, which keeps the read side decoupled and makes
//! rebuild-from-log a property the tests can assert.

#![deny(missing_docs)]

pub mod aggregator;
pub mod report;

pub use aggregator::{AggregatorConfig, CarrierTotals, MetricsAggregator};
pub use report::{CarrierBreakdown, LaneScorecardRow, Period, ScorecardQuery, SellerDashboard};
