//! Storage abstractions for the desk

pub mod memory;
pub mod models;
pub mod sqlite;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use studiodesk_core::{Role, TicketStatus, UserId};

pub use memory::{InMemoryTicketStore, InMemoryUpdateStore, InMemoryUserStore};
pub use models::*;
pub use sqlite::SqliteStore;

use crate::error::DeskError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, DeskError>;

/// Trait for user account storage
pub trait UserStore: Send + Sync {
    /// Create a user; fails with `DuplicateAccount` if the email is taken
    fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// Get a user by ID
    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>>;

    /// Get a user by (normalized) email address
    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// List all users, newest first
    fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Atomically consume an unexpired verification token.
    ///
    /// Marks the user verified and clears both token fields. At most one
    /// caller can redeem a given token.
    fn redeem_verification_token(&self, token: &str, now: DateTime<Utc>)
        -> StoreResult<Option<User>>;

    /// Store a password reset token for a user
    fn set_reset_token(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Atomically consume an unexpired reset token, replacing the password hash
    /// and clearing both reset fields.
    fn redeem_reset_token(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<User>>;

    /// Mark a user's email verified without a token
    fn mark_verified(&self, user_id: UserId) -> StoreResult<()>;

    /// Change a user's role
    fn set_role(&self, user_id: UserId, role: Role) -> StoreResult<()>;

    /// Delete a user
    fn delete_user(&self, user_id: UserId) -> StoreResult<()>;
}

/// Trait for ticket and reply storage
pub trait TicketStore: Send + Sync {
    /// Create a ticket with status `open`
    fn create_ticket(&self, ticket: NewTicket) -> StoreResult<Ticket>;

    /// Get a ticket by ID
    fn get_ticket(&self, ticket_id: TicketId) -> StoreResult<Option<Ticket>>;

    /// List all tickets, newest first
    fn list_tickets(&self) -> StoreResult<Vec<Ticket>>;

    /// Change a ticket's status; `None` if the ticket does not exist
    fn update_status(
        &self,
        ticket_id: TicketId,
        status: TicketStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Ticket>>;

    /// Append a reply; fails with `NotFound` if the ticket does not exist
    fn create_reply(&self, reply: NewReply) -> StoreResult<Reply>;

    /// Replies for a ticket, oldest first
    fn list_replies(&self, ticket_id: TicketId) -> StoreResult<Vec<Reply>>;
}

/// Trait for patch-notes storage
pub trait UpdateStore: Send + Sync {
    fn create_update(&self, update: NewUpdate) -> StoreResult<Update>;

    fn get_update(&self, update_id: UpdateId) -> StoreResult<Option<Update>>;

    /// Published updates, newest first, at most `limit` when given
    fn list_published(&self, limit: Option<usize>) -> StoreResult<Vec<Update>>;

    fn edit_update(
        &self,
        update_id: UpdateId,
        patch: &UpdatePatch,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Update>>;

    /// Delete an update, returning what was removed
    fn delete_update(&self, update_id: UpdateId) -> StoreResult<Option<Update>>;
}

// Share one backend between several state slots
impl<T: UserStore + ?Sized> UserStore for Arc<T> {
    fn create_user(&self, user: NewUser) -> StoreResult<User> {
        (**self).create_user(user)
    }

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        (**self).get_user(user_id)
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        (**self).get_user_by_email(email)
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        (**self).list_users()
    }

    fn redeem_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<User>> {
        (**self).redeem_verification_token(token, now)
    }

    fn set_reset_token(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        (**self).set_reset_token(user_id, token, expires_at)
    }

    fn redeem_reset_token(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<User>> {
        (**self).redeem_reset_token(token, password_hash, now)
    }

    fn mark_verified(&self, user_id: UserId) -> StoreResult<()> {
        (**self).mark_verified(user_id)
    }

    fn set_role(&self, user_id: UserId, role: Role) -> StoreResult<()> {
        (**self).set_role(user_id, role)
    }

    fn delete_user(&self, user_id: UserId) -> StoreResult<()> {
        (**self).delete_user(user_id)
    }
}

impl<T: TicketStore + ?Sized> TicketStore for Arc<T> {
    fn create_ticket(&self, ticket: NewTicket) -> StoreResult<Ticket> {
        (**self).create_ticket(ticket)
    }

    fn get_ticket(&self, ticket_id: TicketId) -> StoreResult<Option<Ticket>> {
        (**self).get_ticket(ticket_id)
    }

    fn list_tickets(&self) -> StoreResult<Vec<Ticket>> {
        (**self).list_tickets()
    }

    fn update_status(
        &self,
        ticket_id: TicketId,
        status: TicketStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Ticket>> {
        (**self).update_status(ticket_id, status, now)
    }

    fn create_reply(&self, reply: NewReply) -> StoreResult<Reply> {
        (**self).create_reply(reply)
    }

    fn list_replies(&self, ticket_id: TicketId) -> StoreResult<Vec<Reply>> {
        (**self).list_replies(ticket_id)
    }
}

impl<T: UpdateStore + ?Sized> UpdateStore for Arc<T> {
    fn create_update(&self, update: NewUpdate) -> StoreResult<Update> {
        (**self).create_update(update)
    }

    fn get_update(&self, update_id: UpdateId) -> StoreResult<Option<Update>> {
        (**self).get_update(update_id)
    }

    fn list_published(&self, limit: Option<usize>) -> StoreResult<Vec<Update>> {
        (**self).list_published(limit)
    }

    fn edit_update(
        &self,
        update_id: UpdateId,
        patch: &UpdatePatch,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Update>> {
        (**self).edit_update(update_id, patch, now)
    }

    fn delete_update(&self, update_id: UpdateId) -> StoreResult<Option<Update>> {
        (**self).delete_update(update_id)
    }
}
