//! Patch-notes endpoints

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tower_cookies::Cookies;

use crate::email::EmailSender;
use crate::error::DeskError;
use crate::state::AppState;
use crate::store::{TicketStore, Update, UpdateId, UpdatePatch, UpdateStore, UserStore};
use crate::updates::{self, CreateUpdateInput};

#[derive(Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

/// GET /api/updates
pub async fn list_updates<U, T, P, E>(
    State(state): State<Arc<AppState<U, T, P, E>>>,
) -> Result<Json<Vec<Update>>, DeskError>
where
    U: UserStore,
    T: TicketStore,
    P: UpdateStore,
    E: EmailSender,
{
    updates::list_updates(&state.update_store).map(Json)
}

/// GET /api/updates/recent?limit=
pub async fn recent_updates<U, T, P, E>(
    State(state): State<Arc<AppState<U, T, P, E>>>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<Update>>, DeskError>
where
    U: UserStore,
    T: TicketStore,
    P: UpdateStore,
    E: EmailSender,
{
    updates::recent_updates(&state.update_store, query.limit).map(Json)
}

/// GET /api/updates/{id}
pub async fn get_update<U, T, P, E>(
    State(state): State<Arc<AppState<U, T, P, E>>>,
    cookies: Cookies,
    Path(id): Path<u64>,
) -> Result<Json<Option<Update>>, DeskError>
where
    U: UserStore,
    T: TicketStore,
    P: UpdateStore,
    E: EmailSender,
{
    let current = state.current_user(&cookies)?;
    updates::get_update(&state.update_store, UpdateId(id), &current).map(Json)
}

/// POST /api/updates
pub async fn create_update<U, T, P, E>(
    State(state): State<Arc<AppState<U, T, P, E>>>,
    cookies: Cookies,
    Json(input): Json<CreateUpdateInput>,
) -> Result<Json<Update>, DeskError>
where
    U: UserStore,
    T: TicketStore,
    P: UpdateStore,
    E: EmailSender,
{
    let current = state.current_user(&cookies)?;
    updates::create_update(&state.update_store, input, &current, Utc::now()).map(Json)
}

/// POST /api/updates/{id}
pub async fn edit_update<U, T, P, E>(
    State(state): State<Arc<AppState<U, T, P, E>>>,
    cookies: Cookies,
    Path(id): Path<u64>,
    Json(patch): Json<UpdatePatch>,
) -> Result<Json<Update>, DeskError>
where
    U: UserStore,
    T: TicketStore,
    P: UpdateStore,
    E: EmailSender,
{
    let current = state.current_user(&cookies)?;
    updates::edit_update(&state.update_store, UpdateId(id), patch, &current, Utc::now())
        .map(Json)
}

/// DELETE /api/updates/{id}
pub async fn delete_update<U, T, P, E>(
    State(state): State<Arc<AppState<U, T, P, E>>>,
    cookies: Cookies,
    Path(id): Path<u64>,
) -> Result<Json<Update>, DeskError>
where
    U: UserStore,
    T: TicketStore,
    P: UpdateStore,
    E: EmailSender,
{
    let current = state.current_user(&cookies)?;
    updates::delete_update(&state.update_store, UpdateId(id), &current).map(Json)
}
