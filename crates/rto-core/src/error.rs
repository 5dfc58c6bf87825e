//! # Error Hierarchy
//!
//! Structured validation errors for the RTO Optimizer stack, built with
//! `thiserror`. Each variant carries the invalid input and the expected
//! format so operators can diagnose a bad feed without guesswork.

use thiserror::Error;

/// Validation errors for domain primitive newtypes and boundary payloads.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A caller-supplied identifier is empty or exceeds the length cap.
    #[error("invalid {kind} identifier: \"{value}\" (expected 1-128 printable characters)")]
    InvalidIdentifier {
        /// Which identifier type rejected the value.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// Timestamp string is not valid UTC ISO 8601.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A required field is absent from a payload.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A field is present but its value is unusable.
    #[error("invalid value for {field}: {reason}")]
    InvalidField {
        /// The offending field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}
