//! Studio Desk Core Library
//!
//! Domain types shared by the support desk server:
//! - Identities and roles resolved from a session
//! - The per-ticket view-access decision (admin, owner or capability token)
//! - High-entropy tokens for tickets, email verification and password resets

pub mod error;
pub mod identity;
pub mod ticket;
pub mod token;

pub use error::Error;
pub use identity::{CurrentUser, Identity, Role, UserId};
pub use ticket::{TicketStatus, TicketType, ViewGrant};
pub use token::generate_token;

/// Result type for studiodesk-core operations
pub type Result<T> = std::result::Result<T, Error>;
