//! # Proof-of-Attempt Validation
//!
//! The core of the system: when a carrier claims "customer unavailable",
//! did the rider actually show up and actually call? Two checks:
//!
//! - **GPS** — the rider's reported location must be within 200 meters of
//!   the delivery address (inclusive).
//! - **Call** — the rider's call to the customer must have lasted at least
//!   10 seconds (inclusive).
//!
//! Both thresholds are inclusive on the compliant side: exactly 200 m and
//! exactly 10 s pass. Missing data never passes — absent GPS, an ungeocoded
//! address, or a missing call record each produce an explicit violation.
//! Violations are additive; a verdict can carry both.
//!
//! Proof is only demanded of NDR events coded `CUSTOMER_UNAVAILABLE`. Every
//! other event short-circuits to valid: there is no claim to contest.

use rto_core::{distance_meters, GeoPoint};
use rto_domain::{Address, CourierEvent};

/// Maximum rider-to-address distance for a credible attempt, meters.
pub const MAX_GPS_DISTANCE_METERS: f64 = 200.0;

/// Minimum rider-to-customer call duration for a credible attempt, seconds.
pub const MIN_CALL_DURATION_SECS: u32 = 10;

const VIOLATION_GPS_TOO_FAR: &str = "GPS location not within 200m of delivery address";
const VIOLATION_GPS_MISSING: &str = "Missing GPS coordinates";
const VIOLATION_CALL: &str = "Call duration less than 10 seconds or missing";

/// The outcome of validating one courier event.
#[derive(Debug, Clone, PartialEq)]
pub struct ProofVerdict {
    /// Whether proof was demanded at all.
    pub proof_required: bool,
    /// GPS proximity check outcome.
    pub gps_valid: bool,
    /// Call duration check outcome.
    pub call_valid: bool,
    /// The overall verdict: both checks passed (or no proof was required).
    pub is_valid: bool,
    /// Human-readable reasons for failure, empty when valid.
    pub violations: Vec<String>,
}

impl ProofVerdict {
    fn no_proof_required() -> Self {
        Self {
            proof_required: false,
            gps_valid: true,
            call_valid: true,
            is_valid: true,
            violations: Vec::new(),
        }
    }
}

/// Stateless proof-of-attempt validator.
pub struct ProofValidator;

impl ProofValidator {
    /// Validate a courier event against the order's delivery address.
    ///
    /// `address` is the address version current at ingestion time; `None`
    /// means the order or address record could not be resolved, which
    /// degrades the GPS check to a violation rather than failing ingestion.
    pub fn validate(event: &CourierEvent, address: Option<&Address>) -> ProofVerdict {
        if !event.requires_proof() {
            return ProofVerdict::no_proof_required();
        }

        let mut violations = Vec::new();

        let gps_valid = match (event.gps, address.and_then(|a| a.location)) {
            (Some(rider), Some(destination)) => {
                if within_proximity(distance_meters(rider, destination)) {
                    true
                } else {
                    violations.push(VIOLATION_GPS_TOO_FAR.to_string());
                    false
                }
            }
            _ => {
                violations.push(VIOLATION_GPS_MISSING.to_string());
                false
            }
        };

        let call_valid = match event.call_duration_secs {
            Some(duration) if call_satisfies(duration) => true,
            _ => {
                violations.push(VIOLATION_CALL.to_string());
                false
            }
        };

        ProofVerdict {
            proof_required: true,
            gps_valid,
            call_valid,
            is_valid: gps_valid && call_valid,
            violations,
        }
    }
}

/// Whether a measured rider-to-address distance satisfies the proximity
/// rule. Inclusive: exactly [`MAX_GPS_DISTANCE_METERS`] passes.
pub fn within_proximity(distance_m: f64) -> bool {
    distance_m <= MAX_GPS_DISTANCE_METERS
}

/// Whether a call duration satisfies the minimum. Inclusive: exactly
/// [`MIN_CALL_DURATION_SECS`] passes.
pub fn call_satisfies(duration_secs: u32) -> bool {
    duration_secs >= MIN_CALL_DURATION_SECS
}
