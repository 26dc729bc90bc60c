//! Shared application state

use std::sync::Arc;

use chrono::Utc;
use studiodesk_core::CurrentUser;
use tower_cookies::Cookies;

use crate::crypto::PasswordHasher;
use crate::email::EmailSender;
use crate::error::DeskError;
use crate::session::SessionGate;
use crate::store::{TicketStore, UpdateStore, UserStore};

/// Everything a request handler needs, generic over storage and email backends
pub struct AppState<U, T, P, E>
where
    U: UserStore,
    T: TicketStore,
    P: UpdateStore,
    E: EmailSender,
{
    pub user_store: U,
    pub ticket_store: T,
    pub update_store: P,
    pub email_sender: Arc<E>,
    pub gate: SessionGate,
    pub hasher: PasswordHasher,
    /// Public site URL used to build email links
    pub base_url: String,
}

impl<U, T, P, E> AppState<U, T, P, E>
where
    U: UserStore,
    T: TicketStore,
    P: UpdateStore,
    E: EmailSender,
{
    pub fn new(
        user_store: U,
        ticket_store: T,
        update_store: P,
        email_sender: E,
        gate: SessionGate,
        hasher: PasswordHasher,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            user_store,
            ticket_store,
            update_store,
            email_sender: Arc::new(email_sender),
            gate,
            hasher,
            base_url: base_url.into(),
        }
    }

    /// Resolve the caller of a request from its session cookie
    pub fn current_user(&self, cookies: &Cookies) -> Result<CurrentUser, DeskError> {
        self.gate.current_user(&self.user_store, cookies, Utc::now())
    }
}
