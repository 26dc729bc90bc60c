//! Email sending abstractions

pub mod console;
pub mod smtp;

use std::sync::Arc;

pub use console::ConsoleEmailSender;
pub use smtp::{SmtpConfig, SmtpEmailSender};

/// Trait for sending account emails
///
/// Implementations may block; callers on the async runtime go through
/// [`deliver`].
pub trait EmailSender: Send + Sync {
    /// Send an email verification link
    fn send_verification(&self, email: &str, link: &str) -> Result<(), String>;

    /// Send a password reset link
    fn send_password_reset(&self, email: &str, link: &str) -> Result<(), String>;
}

/// Allow using Box<dyn EmailSender> as an EmailSender
impl EmailSender for Box<dyn EmailSender> {
    fn send_verification(&self, email: &str, link: &str) -> Result<(), String> {
        (**self).send_verification(email, link)
    }

    fn send_password_reset(&self, email: &str, link: &str) -> Result<(), String> {
        (**self).send_password_reset(email, link)
    }
}

/// Which email to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    Verification,
    PasswordReset,
}

impl EmailKind {
    pub fn subject(&self) -> &'static str {
        match self {
            EmailKind::Verification => "Verify your email address",
            EmailKind::PasswordReset => "Reset your password",
        }
    }
}

/// Send an email on the blocking pool and wait for it.
///
/// Delivery failures are logged and swallowed: the operation that triggered
/// the email has already been committed.
pub async fn deliver<E>(sender: &Arc<E>, kind: EmailKind, email: &str, link: String)
where
    E: EmailSender + 'static,
{
    let sender = Arc::clone(sender);
    let to = email.to_string();

    let result = tokio::task::spawn_blocking(move || match kind {
        EmailKind::Verification => sender.send_verification(&to, &link),
        EmailKind::PasswordReset => sender.send_password_reset(&to, &link),
    })
    .await;

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(email = %email, ?kind, error = %e, "Failed to send email"),
        Err(e) => tracing::warn!(email = %email, ?kind, error = %e, "Email task failed"),
    }
}
