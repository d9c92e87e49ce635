//! Outgoing mail port.

use async_trait::async_trait;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Delivers transactional email.
///
/// # Implementations
///
/// - [`crate::infrastructure::mail::LogMailer`] - writes messages to the log
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AppError`] when the message could not be handed over for delivery.
    async fn send(&self, email: Email) -> Result<(), AppError>;
}
