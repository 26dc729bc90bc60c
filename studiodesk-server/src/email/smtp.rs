//! Outbound mail through an SMTP relay

use std::fmt;

use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use super::{EmailKind, EmailSender};

/// Resend's SMTP relay
pub const RESEND_SMTP_HOST: &str = "smtp.resend.com";
pub const RESEND_SMTP_USERNAME: &str = "resend";

/// Relay connection and sender identity
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    /// Implicit TLS on 465 unless overridden
    pub port: u16,
    pub username: String,
    /// Password or provider API key
    pub password: String,
    pub from_email: String,
    pub from_name: Option<String>,
}

impl SmtpConfig {
    /// Reads `SMTP_HOST`, `SMTP_USERNAME`, `SMTP_PASSWORD` and
    /// `SMTP_FROM_EMAIL`, all required. `SMTP_PORT` and `SMTP_FROM_NAME`
    /// are optional.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok().filter(|s| !s.is_empty()))
    }

    /// Same as [`SmtpConfig::from_env`] over an arbitrary lookup
    pub fn from_lookup<F>(get: &F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = get("SMTP_HOST")?;
        let username = get("SMTP_USERNAME")?;
        let password = get("SMTP_PASSWORD")?;
        let from_email = get("SMTP_FROM_EMAIL")?;

        let port = get("SMTP_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(465);

        Some(Self {
            host,
            port,
            username,
            password,
            from_email,
            from_name: get("SMTP_FROM_NAME"),
        })
    }

    /// Resend relay authenticated with an API key
    pub fn resend(api_key: String, from_email: String) -> Self {
        Self {
            host: RESEND_SMTP_HOST.to_string(),
            port: 465,
            username: RESEND_SMTP_USERNAME.to_string(),
            password: api_key,
            from_email,
            from_name: None,
        }
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .finish()
    }
}

/// Sends account emails through an authenticated SMTP relay.
///
/// Sending blocks; async callers go through [`super::deliver`].
pub struct SmtpEmailSender {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpEmailSender {
    /// Build the relay transport. No connection is made until the first send.
    pub fn new(config: SmtpConfig) -> Result<Self, String> {
        let from = match &config.from_name {
            Some(name) => format!("{} <{}>", name, config.from_email),
            None => config.from_email.clone(),
        };
        let from: Mailbox = from
            .parse()
            .map_err(|e| format!("Invalid from address {}: {}", from, e))?;

        let transport = SmtpTransport::relay(&config.host)
            .map_err(|e| format!("Failed to create SMTP transport: {}", e))?
            .port(config.port)
            .credentials(Credentials::new(config.username, config.password))
            .build();

        tracing::info!(host = %config.host, port = config.port, "SMTP transport configured");

        Ok(Self { transport, from })
    }

    fn send(&self, kind: EmailKind, to: &str, link: &str) -> Result<(), String> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| format!("Invalid recipient address: {}", e))?;
        let content = EmailContent::new(kind, link);

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(kind.subject())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(content.text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(content.html),
                    ),
            )
            .map_err(|e| format!("Failed to build email: {}", e))?;

        self.transport
            .send(&message)
            .map_err(|e| format!("Failed to send email: {}", e))?;

        tracing::info!(?kind, "Email sent");
        Ok(())
    }
}

impl EmailSender for SmtpEmailSender {
    fn send_verification(&self, email: &str, link: &str) -> Result<(), String> {
        self.send(EmailKind::Verification, email, link)
    }

    fn send_password_reset(&self, email: &str, link: &str) -> Result<(), String> {
        self.send(EmailKind::PasswordReset, email, link)
    }
}

/// Plain-text and HTML bodies for one email
struct EmailContent {
    text: String,
    html: String,
}

impl EmailContent {
    fn new(kind: EmailKind, link: &str) -> Self {
        let (intro, action, footer) = match kind {
            EmailKind::Verification => (
                "Thanks for signing up! Confirm your email address to finish creating your account.",
                "Verify email",
                "This link expires in 24 hours.",
            ),
            EmailKind::PasswordReset => (
                "Someone asked to reset the password for this account.",
                "Choose a new password",
                "This link expires in 24 hours. If you didn't ask for this, you can ignore this email.",
            ),
        };

        let text = format!("{intro}\n\n{action}: {link}\n\n{footer}");
        let html = format!(
            "<!DOCTYPE html>\
             <html><body style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
             <h1>{subject}</h1>\
             <p>{intro}</p>\
             <p><a href=\"{link}\">{action}</a></p>\
             <p style=\"font-size: 12px;\">Or paste this link into your browser:<br>{link}</p>\
             <p style=\"font-size: 12px;\">{footer}</p>\
             </body></html>",
            subject = kind.subject(),
        );

        Self { text, html }
    }
}
