//! # Delivery Addresses
//!
//! Immutable address versions. An order references its current address by
//! [`AddressId`]; a customer-requested address change creates a new row and
//! repoints the order. Proof verdicts computed against an earlier address
//! version therefore remain auditable against exactly the coordinates they
//! were validated with.

use serde::{Deserialize, Serialize};

use rto_core::{AddressId, GeoPoint, Timestamp, ValidationError};

/// Raw address fields as supplied by a storefront webhook or a customer
/// resolution request, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressFields {
    /// First address line.
    pub line1: String,
    /// Optional second address line.
    pub line2: Option<String>,
    /// City name.
    pub city: String,
    /// State or region name.
    pub state: String,
    /// Postal code. Lanes are keyed by destination pincode.
    pub pincode: String,
    /// Geocoded location, if the upstream platform provides one.
    pub location: Option<GeoPoint>,
}

/// A validated, immutable delivery address version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    /// Unique identifier of this address version.
    pub id: AddressId,
    /// First address line.
    pub line1: String,
    /// Optional second address line.
    pub line2: Option<String>,
    /// City name.
    pub city: String,
    /// State or region name.
    pub state: String,
    /// Postal code.
    pub pincode: String,
    /// Geocoded location, when available. Proof validation degrades to an
    /// explicit violation when this is absent.
    pub location: Option<GeoPoint>,
    /// When this version was created.
    pub created_at: Timestamp,
}

impl Address {
    /// Validate raw fields and mint a new address version.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] if `line1`, `city`, or
    /// `pincode` is blank, or [`ValidationError::InvalidField`] if the
    /// pincode is not 4-10 digits.
    pub fn new(fields: AddressFields, created_at: Timestamp) -> Result<Self, ValidationError> {
        let line1 = fields.line1.trim().to_string();
        let city = fields.city.trim().to_string();
        let state = fields.state.trim().to_string();
        let pincode = fields.pincode.trim().to_string();

        if line1.is_empty() {
            return Err(ValidationError::MissingField("line1"));
        }
        if city.is_empty() {
            return Err(ValidationError::MissingField("city"));
        }
        if pincode.is_empty() {
            return Err(ValidationError::MissingField("pincode"));
        }
        if pincode.len() < 4 || pincode.len() > 10 || !pincode.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ValidationError::InvalidField {
                field: "pincode",
                reason: format!("\"{pincode}\" is not 4-10 digits"),
            });
        }

        Ok(Self {
            id: AddressId::new(),
            line1,
            line2: fields.line2.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()),
            city,
            state,
            pincode,
            location: fields.location,
            created_at,
        })
    }
}
