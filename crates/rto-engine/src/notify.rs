//! # Customer Notification Seam
//!
//! When an NDR opens, the customer is prompted to pick a resolution over a
//! messaging channel. Message delivery itself is someone else's product;
//! this module owns only the seam: a [`NotificationSender`] trait the
//! ingestor calls, and a logging implementation for environments without a
//! provider wired in.
//!
//! Senders receive the hashed contact, never the raw phone number or email.
//! Resolving a hash back to a deliverable endpoint is the provider
//! adapter's concern, on its side of the boundary.

use thiserror::Error;
use uuid::Uuid;

use rto_core::{OrderId, PiiHash};

/// Errors from the notification channel.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The channel is down or rejected the send.
    #[error("notification channel unavailable: {0}")]
    Unavailable(String),
}

/// Receipt for an accepted outbound message.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    /// Provider-side message identifier.
    pub message_id: String,
}

/// Outbound messaging seam.
pub trait NotificationSender: Send + Sync {
    /// Prompt the customer of `order_id` to choose a resolution.
    fn send_resolution_prompt(
        &self,
        contact: &PiiHash,
        order_id: &OrderId,
    ) -> Result<DeliveryReceipt, NotifyError>;
}

/// Sender that logs instead of delivering. Default wiring for dev and test.
#[derive(Debug, Default)]
pub struct LoggingSender;

impl NotificationSender for LoggingSender {
    fn send_resolution_prompt(
        &self,
        contact: &PiiHash,
        order_id: &OrderId,
    ) -> Result<DeliveryReceipt, NotifyError> {
        let message_id = Uuid::new_v4().to_string();
        tracing::info!(
            contact = %contact,
            order_id = %order_id,
            message_id = %message_id,
            "resolution prompt (logging sender, not delivered)"
        );
        Ok(DeliveryReceipt { message_id })
    }
}
