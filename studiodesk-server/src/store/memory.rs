//! In-memory storage implementations

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use studiodesk_core::{Role, TicketStatus, UserId};

use super::{
    NewReply, NewTicket, NewUpdate, NewUser, Reply, ReplyId, StoreResult, Ticket, TicketId,
    TicketStore, Update, UpdateId, UpdatePatch, UpdateStore, User, UserStore,
};
use crate::error::DeskError;

fn read<T>(lock: &RwLock<T>) -> StoreResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| DeskError::internal("store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> StoreResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| DeskError::internal("store lock poisoned"))
}

/// In-memory user store
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
    next_user_id: AtomicU64,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            next_user_id: AtomicU64::new(1),
        }
    }

    /// Move a user's verification token expiry (for testing purposes)
    pub fn set_verification_expiry(
        &self,
        email: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let normalized = email.to_lowercase();
        let mut users = write(&self.users)?;
        let user = users
            .values_mut()
            .find(|u| u.email == normalized)
            .ok_or(DeskError::NotFound("User"))?;
        user.verification_token_expires_at = Some(expires_at);
        Ok(())
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for InMemoryUserStore {
    fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let email = new.email.to_lowercase();
        let mut users = write(&self.users)?;
        if users.values().any(|u| u.email == email) {
            return Err(DeskError::DuplicateAccount);
        }

        let id = UserId(self.next_user_id.fetch_add(1, Ordering::SeqCst));
        let user = User {
            id,
            email,
            password_hash: new.password_hash,
            role: new.role,
            email_verified: new.email_verified,
            verification_token: new.verification_token,
            verification_token_expires_at: new.verification_token_expires_at,
            reset_token: None,
            reset_token_expires_at: None,
            created_at: new.created_at,
        };
        users.insert(id, user.clone());
        Ok(user)
    }

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        Ok(read(&self.users)?.get(&user_id).cloned())
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let normalized = email.to_lowercase();
        Ok(read(&self.users)?
            .values()
            .find(|u| u.email == normalized)
            .cloned())
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = read(&self.users)?.values().cloned().collect();
        users.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(users)
    }

    fn redeem_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<User>> {
        let mut users = write(&self.users)?;
        let user = users.values_mut().find(|u| {
            u.verification_token.as_deref() == Some(token)
                && u.verification_token_expires_at.is_some_and(|at| at > now)
        });

        Ok(user.map(|u| {
            u.email_verified = true;
            u.verification_token = None;
            u.verification_token_expires_at = None;
            u.clone()
        }))
    }

    fn set_reset_token(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut users = write(&self.users)?;
        let user = users.get_mut(&user_id).ok_or(DeskError::NotFound("User"))?;
        user.reset_token = Some(token.to_string());
        user.reset_token_expires_at = Some(expires_at);
        Ok(())
    }

    fn redeem_reset_token(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<User>> {
        let mut users = write(&self.users)?;
        let user = users.values_mut().find(|u| {
            u.reset_token.as_deref() == Some(token)
                && u.reset_token_expires_at.is_some_and(|at| at > now)
        });

        Ok(user.map(|u| {
            u.password_hash = password_hash.to_string();
            u.reset_token = None;
            u.reset_token_expires_at = None;
            u.clone()
        }))
    }

    fn mark_verified(&self, user_id: UserId) -> StoreResult<()> {
        let mut users = write(&self.users)?;
        let user = users.get_mut(&user_id).ok_or(DeskError::NotFound("User"))?;
        user.email_verified = true;
        user.verification_token = None;
        user.verification_token_expires_at = None;
        Ok(())
    }

    fn set_role(&self, user_id: UserId, role: Role) -> StoreResult<()> {
        let mut users = write(&self.users)?;
        let user = users.get_mut(&user_id).ok_or(DeskError::NotFound("User"))?;
        user.role = role;
        Ok(())
    }

    fn delete_user(&self, user_id: UserId) -> StoreResult<()> {
        write(&self.users)?
            .remove(&user_id)
            .map(|_| ())
            .ok_or(DeskError::NotFound("User"))
    }
}

/// In-memory ticket store
pub struct InMemoryTicketStore {
    tickets: RwLock<HashMap<TicketId, Ticket>>,
    replies: RwLock<Vec<Reply>>,
    next_ticket_id: AtomicU64,
    next_reply_id: AtomicU64,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self {
            tickets: RwLock::new(HashMap::new()),
            replies: RwLock::new(Vec::new()),
            next_ticket_id: AtomicU64::new(1),
            next_reply_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryTicketStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketStore for InMemoryTicketStore {
    fn create_ticket(&self, new: NewTicket) -> StoreResult<Ticket> {
        let id = TicketId(self.next_ticket_id.fetch_add(1, Ordering::SeqCst));
        let ticket = Ticket {
            id,
            title: new.title,
            description: new.description,
            email: new.email,
            user_id: new.user_id,
            view_token: new.view_token,
            ticket_type: new.ticket_type,
            status: TicketStatus::Open,
            bug: new.bug,
            created_at: new.created_at,
            updated_at: new.created_at,
        };
        write(&self.tickets)?.insert(id, ticket.clone());
        Ok(ticket)
    }

    fn get_ticket(&self, ticket_id: TicketId) -> StoreResult<Option<Ticket>> {
        Ok(read(&self.tickets)?.get(&ticket_id).cloned())
    }

    fn list_tickets(&self) -> StoreResult<Vec<Ticket>> {
        let mut tickets: Vec<Ticket> = read(&self.tickets)?.values().cloned().collect();
        tickets.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(tickets)
    }

    fn update_status(
        &self,
        ticket_id: TicketId,
        status: TicketStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Ticket>> {
        let mut tickets = write(&self.tickets)?;
        Ok(tickets.get_mut(&ticket_id).map(|t| {
            t.status = status;
            t.updated_at = now;
            t.clone()
        }))
    }

    fn create_reply(&self, new: NewReply) -> StoreResult<Reply> {
        if !read(&self.tickets)?.contains_key(&new.ticket_id) {
            return Err(DeskError::NotFound("Ticket"));
        }

        let reply = Reply {
            id: ReplyId(self.next_reply_id.fetch_add(1, Ordering::SeqCst)),
            ticket_id: new.ticket_id,
            content: new.content,
            is_admin: new.is_admin,
            created_at: new.created_at,
        };
        write(&self.replies)?.push(reply.clone());
        Ok(reply)
    }

    fn list_replies(&self, ticket_id: TicketId) -> StoreResult<Vec<Reply>> {
        let mut replies: Vec<Reply> = read(&self.replies)?
            .iter()
            .filter(|r| r.ticket_id == ticket_id)
            .cloned()
            .collect();
        replies.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(replies)
    }
}

/// In-memory patch-notes store
pub struct InMemoryUpdateStore {
    updates: RwLock<HashMap<UpdateId, Update>>,
    next_update_id: AtomicU64,
}

impl InMemoryUpdateStore {
    pub fn new() -> Self {
        Self {
            updates: RwLock::new(HashMap::new()),
            next_update_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryUpdateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateStore for InMemoryUpdateStore {
    fn create_update(&self, new: NewUpdate) -> StoreResult<Update> {
        let id = UpdateId(self.next_update_id.fetch_add(1, Ordering::SeqCst));
        let update = Update {
            id,
            title: new.title,
            version: new.version,
            content: new.content,
            summary: new.summary,
            is_published: new.is_published,
            created_at: new.created_at,
            updated_at: new.created_at,
        };
        write(&self.updates)?.insert(id, update.clone());
        Ok(update)
    }

    fn get_update(&self, update_id: UpdateId) -> StoreResult<Option<Update>> {
        Ok(read(&self.updates)?.get(&update_id).cloned())
    }

    fn list_published(&self, limit: Option<usize>) -> StoreResult<Vec<Update>> {
        let mut updates: Vec<Update> = read(&self.updates)?
            .values()
            .filter(|u| u.is_published)
            .cloned()
            .collect();
        updates.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        if let Some(limit) = limit {
            updates.truncate(limit);
        }
        Ok(updates)
    }

    fn edit_update(
        &self,
        update_id: UpdateId,
        patch: &UpdatePatch,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Update>> {
        let mut updates = write(&self.updates)?;
        Ok(updates.get_mut(&update_id).map(|u| {
            u.apply(patch, now);
            u.clone()
        }))
    }

    fn delete_update(&self, update_id: UpdateId) -> StoreResult<Option<Update>> {
        Ok(write(&self.updates)?.remove(&update_id))
    }
}

#[cfg(test)]
mod tests {
    use std::thread::ScopedJoinHandle;

    use chrono::Duration;
    use studiodesk_core::TicketType;

    use super::*;
    use crate::store::BugDetails;

    fn new_user(email: &str, token: Option<&str>) -> NewUser {
        let now = Utc::now();
        NewUser {
            email: email.to_string(),
            password_hash: "hashed_password".to_string(),
            role: Role::User,
            email_verified: false,
            verification_token: token.map(str::to_string),
            verification_token_expires_at: token.map(|_| now + Duration::hours(24)),
            created_at: now,
        }
    }

    fn new_ticket(title: &str, created_at: DateTime<Utc>) -> NewTicket {
        NewTicket {
            title: title.to_string(),
            description: "description".to_string(),
            email: None,
            user_id: None,
            view_token: "token".to_string(),
            ticket_type: TicketType::Support,
            bug: BugDetails::default(),
            created_at,
        }
    }

    #[test]
    fn test_create_user_and_lookup() {
        let store = InMemoryUserStore::new();

        let user = store.create_user(new_user("Test@Example.com", None)).unwrap();
        assert_eq!(user.email, "test@example.com");

        let found = store.get_user_by_email("TEST@example.com").unwrap();
        assert_eq!(found.unwrap().id, user.id);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let store = InMemoryUserStore::new();
        store.create_user(new_user("test@example.com", None)).unwrap();

        let result = store.create_user(new_user("test@example.com", None));
        assert!(matches!(result, Err(DeskError::DuplicateAccount)));
    }

    #[test]
    fn test_verification_token_redeemed_once() {
        let store = InMemoryUserStore::new();
        store.create_user(new_user("test@example.com", Some("abc"))).unwrap();

        let user = store.redeem_verification_token("abc", Utc::now()).unwrap().unwrap();
        assert!(user.email_verified);
        assert!(user.verification_token.is_none());
        assert!(user.verification_token_expires_at.is_none());

        assert!(store.redeem_verification_token("abc", Utc::now()).unwrap().is_none());
    }

    #[test]
    fn test_expired_verification_token_rejected() {
        let store = InMemoryUserStore::new();
        store.create_user(new_user("test@example.com", Some("abc"))).unwrap();

        let later = Utc::now() + Duration::hours(25);
        assert!(store.redeem_verification_token("abc", later).unwrap().is_none());
    }

    #[test]
    fn test_tickets_newest_first_and_replies_oldest_first() {
        let store = InMemoryTicketStore::new();
        let t0 = Utc::now();

        let first = store.create_ticket(new_ticket("first", t0)).unwrap();
        let second = store
            .create_ticket(new_ticket("second", t0 + Duration::seconds(1)))
            .unwrap();

        let listed: Vec<TicketId> = store.list_tickets().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(listed, vec![second.id, first.id]);

        for (offset, content) in [(2, "later"), (1, "earlier")] {
            store
                .create_reply(NewReply {
                    ticket_id: first.id,
                    content: content.to_string(),
                    is_admin: false,
                    created_at: t0 + Duration::seconds(offset),
                })
                .unwrap();
        }
        let replies = store.list_replies(first.id).unwrap();
        assert_eq!(replies[0].content, "earlier");
        assert_eq!(replies[1].content, "later");
    }

    #[test]
    fn test_reply_to_missing_ticket() {
        let store = InMemoryTicketStore::new();
        let result = store.create_reply(NewReply {
            ticket_id: TicketId(42),
            content: "hello".to_string(),
            is_admin: false,
            created_at: Utc::now(),
        });
        assert!(matches!(result, Err(DeskError::NotFound("Ticket"))));
    }

    fn successes<T>(handles: Vec<ScopedJoinHandle<'_, Option<T>>>) -> usize {
        handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .count()
    }

    #[test]
    fn test_concurrent_redemption_succeeds_once() {
        let store = InMemoryUserStore::new();
        let user = store.create_user(new_user("race@example.com", Some("shared"))).unwrap();
        let now = Utc::now();
        store
            .set_reset_token(user.id, "reset-shared", now + Duration::hours(1))
            .unwrap();

        let (verified, reset) = std::thread::scope(|s| {
            let verifiers: Vec<_> = (0..8)
                .map(|_| s.spawn(|| store.redeem_verification_token("shared", now).unwrap()))
                .collect();
            let resetters: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| store.redeem_reset_token("reset-shared", "new_hash", now).unwrap())
                })
                .collect();
            (successes(verifiers), successes(resetters))
        });

        assert_eq!(verified, 1);
        assert_eq!(reset, 1);
    }
}
