//! # Streaming Aggregator
//!
//! Folds the engine's update stream into two bucket families:
//!
//! - seller × carrier × UTC day, backing the seller dashboard's trailing
//!   windows, and
//! - carrier × destination pincode × ISO week, backing the lane scorecard.
//!
//! ## Design Decision: buckets, not replay
//!
//! Windowed queries sum pre-bucketed counters against a cutoff instead of
//! replaying history. Day buckets are compared at day granularity, so a
//! trailing window includes the whole of its partial first day. The trade
//! is deliberate: query cost stays proportional to the number of live
//! buckets, and [`MetricsAggregator::recompute`] proves the incremental
//! fold equivalent to a from-scratch rebuild.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;

use rto_core::{BrandId, Timestamp};
use rto_domain::EventCode;
use rto_engine::{AggregateUpdate, ShipmentFact, VerdictSink};

use crate::report::{
    CarrierBreakdown, LaneScorecardRow, Period, ScorecardQuery, SellerDashboard,
};

/// Default estimated cost of one completed RTO, in rupees. Covers forward
/// and return freight plus handling for a typical COD parcel.
const DEFAULT_RTO_UNIT_COST: f64 = 200.0;

/// Tunables for the aggregator.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Rupee cost attributed to each prevented RTO.
    pub rto_unit_cost: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            rto_unit_cost: DEFAULT_RTO_UNIT_COST,
        }
    }
}

/// Counters folded per bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CarrierTotals {
    /// Shipments registered.
    pub total_shipments: u64,
    /// Delivered events.
    pub delivered: u64,
    /// NDR events of any reason.
    pub ndrs: u64,
    /// NDRs whose demanded proof held.
    pub verified_ndrs: u64,
    /// NDRs whose demanded proof failed.
    pub suspicious_ndrs: u64,
    /// NDRs overturned by adjudication.
    pub rto_prevented: u64,
}

impl CarrierTotals {
    /// Delivered over total shipments, as a percentage (0.0 to 100.0).
    /// Zero when nothing shipped.
    pub fn success_rate(&self) -> f64 {
        if self.total_shipments == 0 {
            0.0
        } else {
            self.delivered as f64 / self.total_shipments as f64 * 100.0
        }
    }

    fn merge(&mut self, other: &CarrierTotals) {
        self.total_shipments += other.total_shipments;
        self.delivered += other.delivered;
        self.ndrs += other.ndrs;
        self.verified_ndrs += other.verified_ndrs;
        self.suspicious_ndrs += other.suspicious_ndrs;
        self.rto_prevented += other.rto_prevented;
    }
}

type BrandDayKey = (BrandId, String, Timestamp);
type LaneWeekKey = (String, String, Timestamp);

/// Incremental read models over the aggregation boundary.
pub struct MetricsAggregator {
    config: AggregatorConfig,
    brand_day: RwLock<HashMap<BrandDayKey, CarrierTotals>>,
    lane_week: RwLock<HashMap<LaneWeekKey, CarrierTotals>>,
    as_of: RwLock<Option<Timestamp>>,
}

impl MetricsAggregator {
    /// Create an empty aggregator.
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            config,
            brand_day: RwLock::new(HashMap::new()),
            lane_week: RwLock::new(HashMap::new()),
            as_of: RwLock::new(None),
        }
    }

    /// Rebuild an aggregator from a full update log. Used to prove the
    /// incremental fold is order-insensitive within a bucket.
    pub fn recompute(updates: &[AggregateUpdate], config: AggregatorConfig) -> Self {
        let agg = Self::new(config);
        for update in updates {
            agg.apply(update);
        }
        agg
    }

    /// Fold one update into both bucket families.
    pub fn apply(&self, update: &AggregateUpdate) {
        match update {
            AggregateUpdate::ShipmentRegistered(fact) => {
                self.bump(fact, |t| t.total_shipments += 1);
            }
            AggregateUpdate::EventRecorded {
                fact,
                event_code,
                proof_required,
                proof_validated,
            } => match event_code {
                EventCode::Delivered => self.bump(fact, |t| t.delivered += 1),
                EventCode::Ndr => {
                    let required = *proof_required;
                    let validated = *proof_validated;
                    self.bump(fact, |t| {
                        t.ndrs += 1;
                        if validated {
                            t.verified_ndrs += 1;
                        }
                        if required && !validated {
                            t.suspicious_ndrs += 1;
                        }
                    });
                }
                _ => self.advance_as_of(fact.timestamp),
            },
            AggregateUpdate::NdrOverturned(fact) => {
                self.bump(fact, |t| t.rto_prevented += 1);
            }
        }
    }

    fn bump(&self, fact: &ShipmentFact, f: impl Fn(&mut CarrierTotals)) {
        let day_key = (
            fact.brand_id.clone(),
            fact.carrier.clone(),
            fact.timestamp.day_bucket(),
        );
        f(self.brand_day.write().entry(day_key).or_default());

        let week_key = (
            fact.carrier.clone(),
            fact.dest_pincode.clone(),
            fact.timestamp.week_bucket(),
        );
        f(self.lane_week.write().entry(week_key).or_default());

        self.advance_as_of(fact.timestamp);
    }

    fn advance_as_of(&self, ts: Timestamp) {
        let mut guard = self.as_of.write();
        if guard.map_or(true, |current| ts > current) {
            *guard = Some(ts);
        }
    }

    /// Lane scorecard rows matching `query`, sorted by carrier, pincode,
    /// then week.
    pub fn carrier_scorecard(&self, query: &ScorecardQuery) -> Vec<LaneScorecardRow> {
        let carrier_filter = query.carrier.as_ref().map(|c| c.trim().to_lowercase());
        let week_filter = query.week_start.map(|w| w.week_bucket());
        let mut rows: Vec<LaneScorecardRow> = self
            .lane_week
            .read()
            .iter()
            .filter(|((carrier, pincode, week), _)| {
                carrier_filter.as_ref().map_or(true, |c| carrier == c)
                    && query.pincode.as_ref().map_or(true, |p| pincode == p)
                    && week_filter.map_or(true, |w| *week == w)
            })
            .map(|((carrier, pincode, week), totals)| LaneScorecardRow {
                carrier: carrier.clone(),
                pincode: pincode.clone(),
                week_start: *week,
                totals: *totals,
                success_rate: totals.success_rate(),
            })
            .collect();
        rows.sort_by(|a, b| {
            (&a.carrier, &a.pincode, a.week_start).cmp(&(&b.carrier, &b.pincode, b.week_start))
        });
        rows
    }

    /// One seller's dashboard over the trailing window ending at `now`.
    pub fn seller_dashboard(
        &self,
        brand_id: &BrandId,
        period: Period,
        now: Timestamp,
    ) -> SellerDashboard {
        let cutoff_day = period.cutoff(now).day_bucket();

        let mut per_carrier: HashMap<String, CarrierTotals> = HashMap::new();
        for ((brand, carrier, day), totals) in self.brand_day.read().iter() {
            if brand == brand_id && *day >= cutoff_day {
                per_carrier.entry(carrier.clone()).or_default().merge(totals);
            }
        }

        let mut totals = CarrierTotals::default();
        let mut carrier_breakdown: Vec<CarrierBreakdown> = per_carrier
            .into_iter()
            .map(|(carrier, t)| {
                totals.merge(&t);
                CarrierBreakdown {
                    carrier,
                    totals: t,
                    success_rate: t.success_rate(),
                }
            })
            .collect();
        carrier_breakdown.sort_by(|a, b| a.carrier.cmp(&b.carrier));

        SellerDashboard {
            brand_id: brand_id.clone(),
            period,
            success_rate: totals.success_rate(),
            estimated_cost_saved: totals.rto_prevented as f64 * self.config.rto_unit_cost,
            totals,
            carrier_breakdown,
            as_of: *self.as_of.read(),
        }
    }
}

impl VerdictSink for MetricsAggregator {
    fn publish(&self, update: AggregateUpdate) {
        self.apply(&update);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
