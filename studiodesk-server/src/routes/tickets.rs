//! Ticket and reply endpoints

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tower_cookies::Cookies;

use crate::email::EmailSender;
use crate::error::DeskError;
use crate::state::AppState;
use crate::store::{Reply, TicketId, TicketStore, UpdateStore, UserStore};
use crate::tickets::{self, AdminReplyInput, CreateReplyInput, CreateTicketInput, TicketView};

#[derive(Deserialize)]
pub struct TicketQuery {
    pub token: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub status: String,
}

/// GET /api/tickets
pub async fn list_tickets<U, T, P, E>(
    State(state): State<Arc<AppState<U, T, P, E>>>,
    cookies: Cookies,
) -> Result<Json<Vec<TicketView>>, DeskError>
where
    U: UserStore,
    T: TicketStore,
    P: UpdateStore,
    E: EmailSender,
{
    let current = state.current_user(&cookies)?;
    tickets::list_tickets(&state.ticket_store, &current).map(Json)
}

/// POST /api/tickets
pub async fn create_ticket<U, T, P, E>(
    State(state): State<Arc<AppState<U, T, P, E>>>,
    cookies: Cookies,
    Json(input): Json<CreateTicketInput>,
) -> Result<Json<TicketView>, DeskError>
where
    U: UserStore,
    T: TicketStore,
    P: UpdateStore,
    E: EmailSender,
{
    let current = state.current_user(&cookies)?;
    tickets::create_ticket(&state.ticket_store, input, &current, Utc::now()).map(Json)
}

/// GET /api/tickets/{id}?token=
///
/// `null` when the ticket is missing or the caller may not see it.
pub async fn get_ticket<U, T, P, E>(
    State(state): State<Arc<AppState<U, T, P, E>>>,
    cookies: Cookies,
    Path(id): Path<u64>,
    Query(query): Query<TicketQuery>,
) -> Result<Json<Option<TicketView>>, DeskError>
where
    U: UserStore,
    T: TicketStore,
    P: UpdateStore,
    E: EmailSender,
{
    let current = state.current_user(&cookies)?;
    tickets::get_ticket(
        &state.ticket_store,
        TicketId(id),
        query.token.as_deref(),
        &current,
    )
    .map(Json)
}

/// POST /api/tickets/{id}/status
pub async fn update_ticket_status<U, T, P, E>(
    State(state): State<Arc<AppState<U, T, P, E>>>,
    cookies: Cookies,
    Path(id): Path<u64>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<TicketView>, DeskError>
where
    U: UserStore,
    T: TicketStore,
    P: UpdateStore,
    E: EmailSender,
{
    let current = state.current_user(&cookies)?;
    tickets::update_ticket_status(
        &state.ticket_store,
        TicketId(id),
        &req.status,
        &current,
        Utc::now(),
    )
    .map(Json)
}

/// POST /api/replies
pub async fn create_reply<U, T, P, E>(
    State(state): State<Arc<AppState<U, T, P, E>>>,
    cookies: Cookies,
    Json(input): Json<CreateReplyInput>,
) -> Result<Json<Reply>, DeskError>
where
    U: UserStore,
    T: TicketStore,
    P: UpdateStore,
    E: EmailSender,
{
    let current = state.current_user(&cookies)?;
    tickets::create_reply(&state.ticket_store, input, &current, Utc::now()).map(Json)
}

/// POST /api/admin/replies
pub async fn admin_reply<U, T, P, E>(
    State(state): State<Arc<AppState<U, T, P, E>>>,
    cookies: Cookies,
    Json(input): Json<AdminReplyInput>,
) -> Result<Json<Reply>, DeskError>
where
    U: UserStore,
    T: TicketStore,
    P: UpdateStore,
    E: EmailSender,
{
    let current = state.current_user(&cookies)?;
    tickets::admin_reply(&state.ticket_store, input, &current, Utc::now()).map(Json)
}
