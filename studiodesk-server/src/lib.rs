//! Studio Desk server
//!
//! Accounts, session cookies, support tickets and the patch-notes feed for
//! the studio website. Storage and email delivery are pluggable so the same
//! handlers run against SQLite in production and in-memory stores in tests.

pub mod accounts;
pub mod config;
pub mod crypto;
pub mod email;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
pub mod tickets;
pub mod updates;

pub use config::Config;
pub use crypto::PasswordHasher;
pub use email::{ConsoleEmailSender, EmailSender, SmtpConfig, SmtpEmailSender};
pub use error::DeskError;
pub use session::SessionGate;
pub use state::AppState;
pub use store::{
    InMemoryTicketStore, InMemoryUpdateStore, InMemoryUserStore, SqliteStore, TicketStore,
    UpdateStore, UserStore,
};
