//! Data models for desk storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use studiodesk_core::{Identity, Role, TicketStatus, TicketType, UserId};

/// Unique ticket identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TicketId(pub u64);

/// Unique reply identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReplyId(pub u64);

/// Unique update (patch note) identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UpdateId(pub u64);

/// A user account
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    /// Login name (normalized email)
    pub email: String,
    /// bcrypt hash, salt included
    pub password_hash: String,
    pub role: Role,
    pub email_verified: bool,
    pub verification_token: Option<String>,
    pub verification_token_expires_at: Option<DateTime<Utc>>,
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Session claims for this user
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Fields needed to create a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub email_verified: bool,
    pub verification_token: Option<String>,
    pub verification_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A support request or bug report
#[derive(Debug, Clone)]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    /// Contact address, independent of any account
    pub email: Option<String>,
    pub user_id: Option<UserId>,
    pub view_token: String,
    pub ticket_type: TicketType,
    pub status: TicketStatus,
    pub bug: BugDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Optional bug-report fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugDetails {
    pub game_version: Option<String>,
    pub platform: Option<String>,
    pub severity: Option<String>,
    pub frequency: Option<String>,
    pub steps_to_reproduce: Option<String>,
    pub expected_behavior: Option<String>,
    pub actual_behavior: Option<String>,
}

/// Fields needed to create a ticket
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub email: Option<String>,
    pub user_id: Option<UserId>,
    pub view_token: String,
    pub ticket_type: TicketType,
    pub bug: BugDetails,
    pub created_at: DateTime<Utc>,
}

/// A message in a ticket thread
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: ReplyId,
    pub ticket_id: TicketId,
    pub content: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to create a reply
#[derive(Debug, Clone)]
pub struct NewReply {
    pub ticket_id: TicketId,
    pub content: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// A patch-notes entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Update {
    pub id: UpdateId,
    pub title: String,
    pub version: Option<String>,
    pub content: String,
    pub summary: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create an update
#[derive(Debug, Clone)]
pub struct NewUpdate {
    pub title: String,
    pub version: Option<String>,
    pub content: String,
    pub summary: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Partial edit of an update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatch {
    pub title: Option<String>,
    pub version: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub is_published: Option<bool>,
}

impl Update {
    /// Apply a patch in place
    pub fn apply(&mut self, patch: &UpdatePatch, now: DateTime<Utc>) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(version) = &patch.version {
            self.version = Some(version.clone());
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(summary) = &patch.summary {
            self.summary = Some(summary.clone());
        }
        if let Some(is_published) = patch.is_published {
            self.is_published = is_published;
        }
        self.updated_at = now;
    }
}
