//! # Temporal Types — UTC-Only Timestamps
//!
//! Defines `Timestamp`, a UTC-only timestamp type truncated to seconds
//! precision.
//!
//! ## Invariant
//!
//! All timestamps in the system are UTC. Courier webhooks arrive with mixed
//! offsets (`+05:30`, `Z`, sometimes bare seconds since epoch); everything
//! is normalized at the ingestion boundary so that dispute-window arithmetic
//! and lane bucketing never involve a local time zone. Week buckets are ISO
//! weeks starting Monday, computed in UTC.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A UTC-only timestamp, truncated to seconds precision.
///
/// Serializes as ISO 8601 with `Z` suffix (e.g. `2026-01-15T12:00:00Z`).
///
/// # Construction
///
/// - [`Timestamp::now()`] — current UTC time, truncated.
/// - [`Timestamp::from_utc()`] — from a `DateTime<Utc>`, truncating sub-seconds.
/// - [`Timestamp::parse()`] — from an ISO 8601 string, rejecting non-UTC offsets.
/// - [`Timestamp::parse_lenient()`] — from an ISO 8601 string with any offset,
///   converting to UTC; use this for external courier feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp from the current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse a timestamp from an RFC 3339 string.
    ///
    /// **Rejects non-UTC inputs.** Only the `Z` suffix is accepted; explicit
    /// offsets like `+00:00` or `+05:30` are rejected even when semantically
    /// equivalent. Internal records always carry `Z`, so anything else here
    /// indicates a producer bug worth surfacing.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimestamp`] if the string is not
    /// valid RFC 3339 or uses a non-Z offset.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if !s.ends_with('Z') {
            return Err(ValidationError::InvalidTimestamp {
                value: s.to_string(),
                reason: "must use Z suffix (UTC only)".to_string(),
            });
        }
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| ValidationError::InvalidTimestamp {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Parse a timestamp from an RFC 3339 string, accepting any timezone
    /// offset and converting to UTC.
    ///
    /// This is the lenient parser for external courier and order feeds. The
    /// result is always UTC with seconds precision, matching the strict
    /// invariant.
    pub fn parse_lenient(s: &str) -> Result<Self, ValidationError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| ValidationError::InvalidTimestamp {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the Unix epoch timestamp in seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Signed duration from `earlier` to `self`.
    ///
    /// Positive when `self` is later than `earlier`. Used for dispute-window
    /// checks (`now.since(event_ts) <= Duration::hours(2)`).
    pub fn since(&self, earlier: &Timestamp) -> Duration {
        self.0 - earlier.0
    }

    /// The timestamp shifted forward by `d`. Saturates rather than panics
    /// on overflow, which cannot occur for the durations used here.
    pub fn plus(&self, d: Duration) -> Self {
        Self(self.0.checked_add_signed(d).unwrap_or(self.0))
    }

    /// Midnight UTC of this timestamp's calendar day.
    pub fn day_bucket(&self) -> Self {
        Self(truncate_to_midnight(self.0))
    }

    /// Midnight UTC of the Monday starting this timestamp's ISO week.
    pub fn week_bucket(&self) -> Self {
        let date = self.0.date_naive().week(Weekday::Mon).first_day();
        let midnight = date.and_time(NaiveTime::MIN).and_utc();
        Self(midnight)
    }

    /// Render as ISO 8601 with Z suffix (e.g. `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_utc(dt)
    }
}

/// Truncate a `DateTime<Utc>` to seconds precision (discard nanoseconds).
fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// Truncate a `DateTime<Utc>` to midnight of its calendar day.
fn truncate_to_midnight(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    #[test]
    fn now_has_no_subseconds() {
        assert_eq!(Timestamp::now().as_datetime().nanosecond(), 0);
    }

    #[test]
    fn from_utc_truncates() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 15, 12, 30, 45).unwrap();
        let with_nanos = dt.with_nanosecond(123_456_789).unwrap();
        let t = Timestamp::from_utc(with_nanos);
        assert_eq!(t.as_datetime().nanosecond(), 0);
        assert_eq!(t.to_iso8601(), "2026-01-15T12:30:45Z");
    }

    // ---- parse() strict mode ----

    #[test]
    fn parse_z_suffix_accepted() {
        assert_eq!(ts("2026-01-15T12:00:00Z").to_iso8601(), "2026-01-15T12:00:00Z");
    }

    #[test]
    fn parse_offsets_rejected() {
        assert!(Timestamp::parse("2026-01-15T12:00:00+00:00").is_err());
        assert!(Timestamp::parse("2026-01-15T17:30:00+05:30").is_err());
        assert!(Timestamp::parse("2026-01-15T08:00:00-04:00").is_err());
    }

    #[test]
    fn parse_subseconds_truncated() {
        let t = ts("2026-01-15T12:00:00.987654Z");
        assert_eq!(t.to_iso8601(), "2026-01-15T12:00:00Z");
    }

    #[test]
    fn parse_invalid_format() {
        assert!(Timestamp::parse("not-a-date").is_err());
        assert!(Timestamp::parse("2026-01-15").is_err());
        assert!(Timestamp::parse("").is_err());
    }

    // ---- parse_lenient() ----

    #[test]
    fn parse_lenient_converts_offset() {
        let t = Timestamp::parse_lenient("2026-01-15T17:30:00+05:30").unwrap();
        assert_eq!(t.to_iso8601(), "2026-01-15T12:00:00Z");
    }

    #[test]
    fn parse_lenient_accepts_z() {
        let t = Timestamp::parse_lenient("2026-01-15T12:00:00Z").unwrap();
        assert_eq!(t.to_iso8601(), "2026-01-15T12:00:00Z");
    }

    // ---- duration arithmetic ----

    #[test]
    fn since_is_signed() {
        let earlier = ts("2026-01-15T10:00:00Z");
        let later = ts("2026-01-15T12:00:00Z");
        assert_eq!(later.since(&earlier), Duration::hours(2));
        assert_eq!(earlier.since(&later), Duration::hours(-2));
    }

    #[test]
    fn plus_shifts_forward() {
        let t = ts("2026-01-15T12:00:00Z");
        assert_eq!(t.plus(Duration::hours(24)).to_iso8601(), "2026-01-16T12:00:00Z");
    }

    // ---- buckets ----

    #[test]
    fn day_bucket_is_midnight() {
        let t = ts("2026-01-15T18:45:12Z");
        assert_eq!(t.day_bucket().to_iso8601(), "2026-01-15T00:00:00Z");
    }

    #[test]
    fn week_bucket_is_monday_midnight() {
        // 2026-01-15 is a Thursday; its ISO week starts Monday 2026-01-12.
        let t = ts("2026-01-15T18:45:12Z");
        assert_eq!(t.week_bucket().to_iso8601(), "2026-01-12T00:00:00Z");
    }

    #[test]
    fn week_bucket_monday_maps_to_itself() {
        let t = ts("2026-01-12T00:00:00Z");
        assert_eq!(t.week_bucket(), t);
    }

    #[test]
    fn week_bucket_sunday_maps_to_preceding_monday() {
        // 2026-01-18 is a Sunday; same ISO week as the 15th.
        let t = ts("2026-01-18T23:59:59Z");
        assert_eq!(t.week_bucket().to_iso8601(), "2026-01-12T00:00:00Z");
    }

    #[test]
    fn week_bucket_crosses_year_boundary() {
        // 2026-01-01 is a Thursday in ISO week 1 of 2026, starting 2025-12-29.
        let t = ts("2026-01-01T09:00:00Z");
        assert_eq!(t.week_bucket().to_iso8601(), "2025-12-29T00:00:00Z");
    }

    // ---- ordering & serde ----

    #[test]
    fn ordering() {
        assert!(ts("2026-01-15T12:00:00Z") < ts("2026-01-15T12:00:01Z"));
    }

    #[test]
    fn serde_roundtrip() {
        let t = ts("2026-01-15T12:00:00Z");
        let json = serde_json::to_string(&t).unwrap();
        let parsed: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(t, parsed);
    }
}
