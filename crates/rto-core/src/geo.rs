//! # Geodesic Primitives
//!
//! `GeoPoint` and great-circle distance for proximity checks between a
//! courier's reported attempt location and the order's delivery address.
//!
//! Distance is haversine on the mean Earth radius. Proximity thresholds in
//! this system are hundreds of meters, so sub-meter geodesic refinements
//! (ellipsoidal models) buy nothing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in meters (IUGG).
const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Errors constructing geographic coordinates.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    /// Latitude or longitude is outside its valid range or not finite.
    #[error("invalid coordinate: lat {latitude}, lng {longitude} (expected lat in [-90, 90], lng in [-180, 180])")]
    InvalidCoordinate {
        /// The rejected latitude.
        latitude: f64,
        /// The rejected longitude.
        longitude: f64,
    },
}

/// A WGS 84 coordinate pair, validated at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Create a coordinate pair, validating ranges.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidCoordinate`] if either component is
    /// non-finite, latitude is outside `[-90, 90]`, or longitude is outside
    /// `[-180, 180]`.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if valid {
            Ok(Self {
                latitude,
                longitude,
            })
        } else {
            Err(GeoError::InvalidCoordinate {
                latitude,
                longitude,
            })
        }
    }

    /// Latitude in decimal degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Great-circle distance between two points, in meters (haversine).
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_METERS * c
}
