//! Server configuration
//!
//! Everything is read from the environment once at startup. A missing
//! `SESSION_SECRET` is fatal: the server refuses to start without it.

use std::fmt;

use thiserror::Error;

use crate::crypto::{MAX_COST, MIN_COST};
use crate::email::SmtpConfig;

pub const DEFAULT_PORT: u16 = 8911;
pub const DEFAULT_BASE_URL: &str = "http://localhost:8910";
pub const DEFAULT_DATABASE_URL: &str = "studiodesk.db";
pub const DEFAULT_STATIC_DIR: &str = "web/dist";
pub const DEFAULT_EMAIL_FROM: &str = "noreply@example.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// Public URL of the site, used for links in emails
    pub base_url: String,

    /// SQLite database path
    pub database_url: String,

    /// Directory holding the built frontend
    pub static_dir: String,

    /// Secret used to sign session cookies
    pub session_secret: String,

    /// bcrypt cost factor
    pub bcrypt_cost: u32,

    /// Outbound mail relay; `None` logs emails instead of sending them
    pub smtp: Option<SmtpConfig>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let session_secret = get("SESSION_SECRET").ok_or(ConfigError::Missing("SESSION_SECRET"))?;

        let port = match get("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let bcrypt_cost = match get("BCRYPT_COST") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(cost) if (MIN_COST..=MAX_COST).contains(&cost) => cost,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "BCRYPT_COST",
                        value: raw,
                    })
                }
            },
            None => bcrypt::DEFAULT_COST,
        };

        let database_url = database_path(get("DATABASE_URL").as_deref());

        let email_from = get("EMAIL_FROM").unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string());
        let smtp = SmtpConfig::from_lookup(&get)
            .or_else(|| get("RESEND_API_KEY").map(|key| SmtpConfig::resend(key, email_from)));

        Ok(Self {
            port,
            base_url: get("BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            database_url,
            static_dir: get("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
            session_secret,
            bcrypt_cost,
            smtp,
        })
    }

    /// Whether cookies should carry the `Secure` attribute
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// SQLite file path from a `DATABASE_URL` value; `sqlite://` and `file:`
/// prefixes are accepted
pub fn database_path(raw: Option<&str>) -> String {
    let raw = raw.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(DEFAULT_DATABASE_URL);
    raw.strip_prefix("sqlite://")
        .or_else(|| raw.strip_prefix("file:"))
        .unwrap_or(raw)
        .to_string()
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("database_url", &self.database_url)
            .field("static_dir", &self.static_dir)
            .field("session_secret", &"<redacted>")
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("smtp", &self.smtp)
            .finish()
    }
}
