//! Current-user endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use studiodesk_core::Identity;
use tower_cookies::Cookies;

use crate::email::EmailSender;
use crate::error::DeskError;
use crate::state::AppState;
use crate::store::{TicketStore, UpdateStore, UserStore};

/// GET /api/current-user
///
/// `null` for anonymous callers.
pub async fn get_current_user<U, T, P, E>(
    State(state): State<Arc<AppState<U, T, P, E>>>,
    cookies: Cookies,
) -> Result<Json<Option<Identity>>, DeskError>
where
    U: UserStore,
    T: TicketStore,
    P: UpdateStore,
    E: EmailSender,
{
    let current = state.current_user(&cookies)?;
    Ok(Json(current.identity().cloned()))
}
