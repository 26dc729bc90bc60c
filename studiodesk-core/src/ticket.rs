//! Ticket classification and view access
//!
//! A ticket can be read by an admin, by the user who filed it, or by anyone
//! presenting its capability token. Everyone else gets nothing, exactly as
//! if the ticket did not exist.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::{CurrentUser, Error, Result, UserId};

/// Lifecycle state of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }
}

impl FromStr for TicketStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(TicketStatus::Open),
            "in_progress" => Ok(TicketStatus::InProgress),
            "resolved" => Ok(TicketStatus::Resolved),
            "closed" => Ok(TicketStatus::Closed),
            other => Err(Error::UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// What kind of request a ticket is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketType {
    #[default]
    Support,
    BugReport,
}

impl TicketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketType::Support => "support",
            TicketType::BugReport => "bug_report",
        }
    }
}

impl FromStr for TicketType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "support" => Ok(TicketType::Support),
            "bug_report" => Ok(TicketType::BugReport),
            other => Err(Error::UnknownTicketType(other.to_string())),
        }
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Why a caller was allowed to read a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewGrant {
    Admin,
    Owner,
    Token,
}

impl ViewGrant {
    /// Decide whether `viewer` may read a ticket owned by `owner` whose
    /// capability token is `view_token`.
    ///
    /// Returns `None` when access is denied. An empty token never matches.
    pub fn decide(
        viewer: &CurrentUser,
        owner: Option<UserId>,
        view_token: &str,
        presented: Option<&str>,
    ) -> Option<ViewGrant> {
        if viewer.is_admin() {
            return Some(ViewGrant::Admin);
        }

        if let (Some(viewer_id), Some(owner_id)) = (viewer.id(), owner) {
            if viewer_id == owner_id {
                return Some(ViewGrant::Owner);
            }
        }

        match presented {
            Some(token) if !token.is_empty() && tokens_match(token, view_token) => {
                Some(ViewGrant::Token)
            }
            _ => None,
        }
    }
}

/// Compare two tokens in constant time
fn tokens_match(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
