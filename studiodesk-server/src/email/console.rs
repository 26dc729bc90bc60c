//! Email sender that writes to the log instead of a relay

use super::{EmailKind, EmailSender};

/// Logs each email's recipient, subject and link. Used when no relay is
/// configured, so local signups can still be completed from the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleEmailSender;

impl ConsoleEmailSender {
    pub fn new() -> Self {
        Self
    }

    fn log(&self, kind: EmailKind, email: &str, link: &str) {
        tracing::info!(
            to = %email,
            subject = kind.subject(),
            link = %link,
            "Email not sent, no relay configured"
        );
    }
}

impl EmailSender for ConsoleEmailSender {
    fn send_verification(&self, email: &str, link: &str) -> Result<(), String> {
        self.log(EmailKind::Verification, email, link);
        Ok(())
    }

    fn send_password_reset(&self, email: &str, link: &str) -> Result<(), String> {
        self.log(EmailKind::PasswordReset, email, link);
        Ok(())
    }
}
