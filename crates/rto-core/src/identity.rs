//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout the RTO Optimizer
//! stack. Each identifier is a distinct type — you cannot pass an
//! [`OrderId`] where a [`ShipmentId`] is expected.
//!
//! ## Validation
//!
//! Caller-supplied identifiers ([`OrderId`], [`ShipmentId`], [`BrandId`])
//! arrive over webhooks from storefronts and courier partners and validate
//! format at construction time. Minted identifiers ([`EventId`],
//! [`AddressId`], [`ChallengeId`]) are UUIDs, always valid by construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

const MAX_EXTERNAL_ID_LEN: usize = 128;

fn validate_external_id(kind: &'static str, s: &str) -> Result<(), ValidationError> {
    let ok = !s.is_empty()
        && s.len() <= MAX_EXTERNAL_ID_LEN
        && s.chars().all(|c| c.is_ascii_graphic());
    if ok {
        Ok(())
    } else {
        Err(ValidationError::InvalidIdentifier {
            kind,
            value: s.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// External identifiers (caller-supplied, validated at construction)
// ---------------------------------------------------------------------------

/// A storefront order identifier, as issued by the seller's platform.
///
/// # Validation
///
/// - 1-128 characters, ASCII printable, no whitespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(String);

impl OrderId {
    /// Create an order identifier from a string, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidIdentifier`] if the value is empty,
    /// too long, or contains non-printable characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        validate_external_id("order", &s)?;
        Ok(Self(s))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A courier shipment (AWB) identifier, as issued by the carrier.
///
/// # Validation
///
/// - 1-128 characters, ASCII printable, no whitespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShipmentId(String);

impl ShipmentId {
    /// Create a shipment identifier from a string, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidIdentifier`] if the value is empty,
    /// too long, or contains non-printable characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        validate_external_id("shipment", &s)?;
        Ok(Self(s))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ShipmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A seller brand identifier, the tenancy key for dashboards and challenges.
///
/// # Validation
///
/// - 1-128 characters, ASCII printable, no whitespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BrandId(String);

impl BrandId {
    /// Create a brand identifier from a string, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidIdentifier`] if the value is empty,
    /// too long, or contains non-printable characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        validate_external_id("brand", &s)?;
        Ok(Self(s))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BrandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Minted identifiers (always valid by construction)
// ---------------------------------------------------------------------------

/// A unique identifier for a courier event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Create a new random event identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an event identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for a delivery address version.
///
/// Addresses are immutable; an address change mints a new [`AddressId`]
/// rather than mutating the row an earlier proof verdict was computed
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressId(Uuid);

impl AddressId {
    /// Create a new random address identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an address identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AddressId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AddressId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for a seller challenge record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChallengeId(Uuid);

impl ChallengeId {
    /// Create a new random challenge identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a challenge identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ChallengeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
