//! Read-model report shapes: dashboard periods, scorecard filters, and the
//! rows the API serializes.

use serde::{Deserialize, Serialize};

use rto_core::{BrandId, Timestamp};

use crate::aggregator::CarrierTotals;

/// Reporting window for the seller dashboard, ending at the query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// The trailing 24 hours.
    Day,
    /// The trailing 7 days.
    Week,
    /// The trailing 30 days.
    Month,
}

impl Period {
    /// The earliest instant inside the window ending at `now`.
    pub fn cutoff(&self, now: Timestamp) -> Timestamp {
        let days = match self {
            Self::Day => 1,
            Self::Week => 7,
            Self::Month => 30,
        };
        now.plus(chrono::Duration::days(-days))
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(format!("unknown period \"{other}\", expected day|week|month")),
        }
    }
}

/// Optional filters for the carrier scorecard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScorecardQuery {
    /// Restrict to one carrier (matched lowercase).
    pub carrier: Option<String>,
    /// Restrict to one destination pincode.
    pub pincode: Option<String>,
    /// Restrict to the ISO week containing this timestamp.
    pub week_start: Option<Timestamp>,
}

/// One carrier × destination-pincode × ISO-week scorecard row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaneScorecardRow {
    /// Carrier name, lowercase.
    pub carrier: String,
    /// Destination pincode.
    pub pincode: String,
    /// Monday of the ISO week this row covers.
    pub week_start: Timestamp,
    /// The folded counters.
    #[serde(flatten)]
    pub totals: CarrierTotals,
    /// Delivered over total shipments for the lane-week, as a percentage.
    pub success_rate: f64,
}

/// Per-carrier slice of one seller's dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarrierBreakdown {
    /// Carrier name, lowercase.
    pub carrier: String,
    /// The folded counters.
    #[serde(flatten)]
    pub totals: CarrierTotals,
    /// Delivered over total shipments for this carrier, as a percentage.
    pub success_rate: f64,
}

/// One seller's performance over a trailing window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellerDashboard {
    /// The seller.
    pub brand_id: BrandId,
    /// The trailing window reported.
    pub period: Period,
    /// Counters summed across carriers.
    #[serde(flatten)]
    pub totals: CarrierTotals,
    /// Delivered over total shipments across carriers, as a percentage.
    pub success_rate: f64,
    /// Estimated cost avoided by overturned NDRs, in rupees.
    pub estimated_cost_saved: f64,
    /// Per-carrier slices, sorted by carrier name.
    pub carrier_breakdown: Vec<CarrierBreakdown>,
    /// Timestamp of the newest fact folded in, if any.
    pub as_of: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    #[test]
    fn period_parses_case_insensitive() {
        assert_eq!("day".parse::<Period>().unwrap(), Period::Day);
        assert_eq!(" Week ".parse::<Period>().unwrap(), Period::Week);
        assert_eq!("MONTH".parse::<Period>().unwrap(), Period::Month);
        assert!("fortnight".parse::<Period>().is_err());
    }

    #[test]
    fn cutoffs_trail_the_query_time() {
        let now = ts("2026-01-31T12:00:00Z");
        assert_eq!(Period::Day.cutoff(now), ts("2026-01-30T12:00:00Z"));
        assert_eq!(Period::Week.cutoff(now), ts("2026-01-24T12:00:00Z"));
        assert_eq!(Period::Month.cutoff(now), ts("2026-01-01T12:00:00Z"));
    }
}
