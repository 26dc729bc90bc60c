//! Error types for the support desk domain

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("You don't have permission to do that.")]
    NotAuthenticated,

    #[error("You don't have access to do that.")]
    NotAuthorized,

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Unknown ticket status: {0}")]
    UnknownStatus(String),

    #[error("Unknown ticket type: {0}")]
    UnknownTicketType(String),
}
