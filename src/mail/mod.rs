//! Outbound notification mail
//!
//! Rendering produces a subject and body; a [`Mailer`] is responsible for getting
//! them to the recipient. The service ships with [`TracingMailer`], which writes
//! each message to the structured log, and [`MemoryMailer`] for tests.

pub mod default;

use async_trait::async_trait;
use thiserror::Error;

pub use default::{MemoryMailer, TracingMailer};

/// A message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Errors raised by mail transports
#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid recipient address: {0}")]
    InvalidRecipient(String),
    #[error("mail transport unavailable: {0}")]
    Transport(String),
}

/// Delivery channel for rendered notifications
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a single message
    async fn deliver(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

/// Rejects recipients that cannot possibly be delivered to.
pub fn check_recipient(address: &str) -> Result<(), MailError> {
    let address = address.trim();
    match address.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(MailError::InvalidRecipient(address.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipients_need_local_part_and_domain() {
        assert!(check_recipient("ada@example.org").is_ok());
        assert!(matches!(
            check_recipient("ada"),
            Err(MailError::InvalidRecipient(_))
        ));
        assert!(check_recipient("@example.org").is_err());
        assert!(check_recipient("ada@").is_err());
    }
}
