//! Built-in mail transports

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::{MailError, Mailer, OutgoingMail, check_recipient};

/// Writes every message to the log instead of sending it.
#[derive(Debug, Clone)]
pub struct TracingMailer {
    from: String,
}

impl TracingMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for TracingMailer {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        check_recipient(&mail.to)?;
        tracing::info!(
            from = %self.from,
            to = %mail.to,
            subject = %mail.subject,
            body_len = mail.body.len(),
            "Delivering notification mail"
        );
        tracing::debug!(to = %mail.to, body = %mail.body, "Notification mail body");
        Ok(())
    }
}

/// Keeps delivered messages in memory.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages delivered so far, oldest first
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        check_recipient(&mail.to)?;
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(mail.clone());
        Ok(())
    }
}
