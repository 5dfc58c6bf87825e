//! # Route Modules
//!
//! Each module defines an Axum Router for one API surface area. Routers
//! are assembled into the application in [`crate::app`].

pub mod analytics;
pub mod ndr;
pub mod seller;
pub mod webhooks;

use crate::error::AppError;
use crate::extractors::Validate;

use rto_core::{GeoPoint, Timestamp};
use rto_domain::AddressFields;

use serde::Deserialize;
use utoipa::ToSchema;

/// Address fields as they arrive on the wire, with coordinates flattened
/// to plain numbers.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddressPayload {
    /// First address line.
    pub line1: String,
    /// Optional second address line.
    #[serde(default)]
    pub line2: Option<String>,
    /// City name.
    pub city: String,
    /// State or region name.
    #[serde(default)]
    pub state: String,
    /// Postal code, 4-10 digits.
    pub pincode: String,
    /// Geocoded latitude, when the platform provides one.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Geocoded longitude, when the platform provides one.
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl AddressPayload {
    /// Convert to domain fields, validating the coordinate pair.
    pub fn into_fields(self) -> Result<AddressFields, AppError> {
        let location = match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(
                GeoPoint::new(lat, lng).map_err(|e| AppError::Validation(e.to_string()))?,
            ),
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "latitude and longitude must be provided together".to_string(),
                ))
            }
        };
        Ok(AddressFields {
            line1: self.line1,
            line2: self.line2,
            city: self.city,
            state: self.state,
            pincode: self.pincode,
            location,
        })
    }
}

impl Validate for AddressPayload {
    fn validate(&self) -> Result<(), String> {
        if self.line1.trim().is_empty() {
            return Err("line1 must not be empty".to_string());
        }
        if self.city.trim().is_empty() {
            return Err("city must not be empty".to_string());
        }
        if self.pincode.trim().is_empty() {
            return Err("pincode must not be empty".to_string());
        }
        Ok(())
    }
}

/// Parse an ISO 8601 timestamp from a request field, accepting offset
/// forms carrier feeds actually send.
pub fn parse_timestamp(field: &'static str, value: &str) -> Result<Timestamp, AppError> {
    Timestamp::parse_lenient(value)
        .map_err(|e| AppError::Validation(format!("{field}: {e}")))
}
