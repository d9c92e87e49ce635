//! Mailer that writes messages to the log instead of sending them.

use async_trait::async_trait;

use crate::domain::mailer::{Email, Mailer};
use crate::error::AppError;

/// Logs every message at `info` level.
///
/// Used when no mail transport is configured; the reset link is visible in
/// the service log.
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), AppError> {
        tracing::info!(
            from = %self.from,
            to = %email.to,
            subject = %email.subject,
            body = %email.text,
            "email delivered to log"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_accepts_messages() {
        let mailer = LogMailer::new("Tours <no-reply@example.com>");
        let result = mailer
            .send(Email {
                to: "user@example.com".into(),
                subject: "Hello".into(),
                text: "Body".into(),
            })
            .await;

        assert!(result.is_ok());
    }
}
