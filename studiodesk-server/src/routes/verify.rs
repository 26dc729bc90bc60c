//! Email verification link target

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::accounts;
use crate::email::EmailSender;
use crate::error::DeskError;
use crate::state::AppState;
use crate::store::{TicketStore, UpdateStore, UserStore};

#[derive(Deserialize)]
pub struct VerifyQuery {
    pub token: Option<String>,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub message: &'static str,
}

/// GET /verify-email?token=
pub async fn verify_email<U, T, P, E>(
    State(state): State<Arc<AppState<U, T, P, E>>>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<VerifyResponse>, DeskError>
where
    U: UserStore,
    T: TicketStore,
    P: UpdateStore,
    E: EmailSender,
{
    let token = query.token.unwrap_or_default();
    accounts::verify_email(&state.user_store, token.trim(), Utc::now())?;

    Ok(Json(VerifyResponse {
        success: true,
        message: "Email verified. You can now log in.",
    }))
}
