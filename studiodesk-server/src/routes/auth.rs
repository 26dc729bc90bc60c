//! Cookie-based auth endpoint
//!
//! One POST route dispatches on a `method` field, mirroring the frontend's
//! auth client.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use studiodesk_core::{Role, UserId};
use tower_cookies::Cookies;

use crate::accounts;
use crate::email::{deliver, EmailKind, EmailSender};
use crate::error::DeskError;
use crate::state::AppState;
use crate::store::{TicketStore, UpdateStore, UserStore};

#[derive(Debug, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum AuthRequest {
    Login {
        #[serde(default)]
        username: String,
        #[serde(default)]
        password: String,
    },
    Logout,
    Signup {
        #[serde(default)]
        username: String,
        #[serde(default)]
        password: String,
        role: Option<String>,
    },
    ForgotPassword {
        #[serde(default)]
        username: String,
    },
    ResetPassword {
        #[serde(default, rename = "resetToken")]
        reset_token: String,
        #[serde(default)]
        password: String,
    },
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub id: UserId,
    pub email: String,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// POST /auth
pub async fn handle_auth<U, T, P, E>(
    State(state): State<Arc<AppState<U, T, P, E>>>,
    cookies: Cookies,
    Json(req): Json<AuthRequest>,
) -> Result<Response, DeskError>
where
    U: UserStore,
    T: TicketStore,
    P: UpdateStore,
    E: EmailSender + 'static,
{
    let now = Utc::now();

    match req {
        AuthRequest::Login { username, password } => {
            let identity = state
                .gate
                .login(&state.user_store, &state.hasher, &username, &password)?;
            state.gate.issue(&cookies, &identity, now)?;
            Ok(Json(identity).into_response())
        }

        AuthRequest::Logout => {
            state.gate.clear(&cookies);
            Ok(Json(SuccessResponse {
                success: true,
                message: None,
            })
            .into_response())
        }

        AuthRequest::Signup {
            username,
            password,
            role,
        } => {
            // Public signup only ever produces plain users
            if let Some(role) = role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
                if role.parse::<Role>().ok() != Some(Role::User) {
                    tracing::warn!(requested_role = %role, "Signup with elevated role rejected");
                    return Err(DeskError::validation("Cannot sign up with that role"));
                }
            }

            let user =
                accounts::create_user(&state.user_store, &state.hasher, &username, &password, now)?;

            if let Some(token) = user.verification_token.as_deref() {
                let link = accounts::verification_link(&state.base_url, token);
                deliver(&state.email_sender, EmailKind::Verification, &user.email, link).await;
            }

            Ok(Json(SignupResponse {
                id: user.id,
                email: user.email,
                message: "Account created. Check your email to verify your address.",
            })
            .into_response())
        }

        AuthRequest::ForgotPassword { username } => {
            if let Some((user, token)) =
                accounts::begin_password_reset(&state.user_store, &username, now)?
            {
                let link = accounts::reset_link(&state.base_url, &token);
                deliver(&state.email_sender, EmailKind::PasswordReset, &user.email, link).await;
            }

            // Same answer whether or not the account exists
            Ok(Json(SuccessResponse {
                success: true,
                message: Some("If an account exists for that email, a reset link has been sent."),
            })
            .into_response())
        }

        AuthRequest::ResetPassword {
            reset_token,
            password,
        } => {
            let user = accounts::complete_password_reset(
                &state.user_store,
                &state.hasher,
                reset_token.trim(),
                &password,
                now,
            )?;
            Ok(Json(user.identity()).into_response())
        }
    }
}
