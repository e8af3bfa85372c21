//! Outbound email boundary.
//!
//! Delivery mechanics live outside this service; the credential flows only
//! need `send -> success/failure`. [`LogMailer`] stands in until an SMTP
//! collaborator is wired up.

use anyhow::Result;
use tracing::info;

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

pub trait Mailer: Send + Sync {
    /// Deliver one message.
    ///
    /// # Errors
    ///
    /// Returns an error when delivery fails; retry policy belongs to the
    /// implementation, not the caller.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Logs instead of delivering. The body (which contains the token link) is
/// deliberately not logged.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            "email send stub"
        );
        Ok(())
    }
}

/// Build the confirmation mail with its token link.
#[must_use]
pub fn confirmation_message(base_url: &str, to_email: &str, token: &str) -> EmailMessage {
    let link = build_link(base_url, "confirm-email", token);
    EmailMessage {
        to_email: to_email.to_string(),
        subject: "Confirm your PETdor account".to_string(),
        body: format!(
            "Welcome to PETdor!\n\nConfirm your email address by opening this link:\n{link}\n\n\
             The link is valid for a limited time. If you did not create an account, ignore this message.\n"
        ),
    }
}

/// Build the password-reset mail with its token link.
#[must_use]
pub fn reset_message(base_url: &str, to_email: &str, token: &str) -> EmailMessage {
    let link = build_link(base_url, "reset-password", token);
    EmailMessage {
        to_email: to_email.to_string(),
        subject: "Reset your PETdor password".to_string(),
        body: format!(
            "A password reset was requested for your account.\n\nOpen this link to choose a new password:\n{link}\n\n\
             The link is valid for a limited time. If you did not request a reset, ignore this message.\n"
        ),
    }
}

fn build_link(base_url: &str, action: &str, token: &str) -> String {
    let base = base_url.trim_end_matches('/');
    format!("{base}/{action}?token={token}")
}
