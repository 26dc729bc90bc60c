//! HTTP routes for the desk

mod auth;
mod session;
mod tickets;
mod updates;
mod verify;

use std::path::Path;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_cookies::CookieManagerLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::email::EmailSender;
use crate::state::AppState;
use crate::store::{TicketStore, UpdateStore, UserStore};

/// Create the router with all routes
pub fn create_router<U, T, P, E>(state: Arc<AppState<U, T, P, E>>) -> Router
where
    U: UserStore + 'static,
    T: TicketStore + 'static,
    P: UpdateStore + 'static,
    E: EmailSender + 'static,
{
    create_router_with_static_path(state, crate::config::DEFAULT_STATIC_DIR)
}

/// Create the router, serving the built frontend from `static_path`
pub fn create_router_with_static_path<U, T, P, E>(
    state: Arc<AppState<U, T, P, E>>,
    static_path: &str,
) -> Router
where
    U: UserStore + 'static,
    T: TicketStore + 'static,
    P: UpdateStore + 'static,
    E: EmailSender + 'static,
{
    // Client-side routes such as /reset-password fall through to index.html
    let index = Path::new(static_path).join("index.html");
    let frontend = ServeDir::new(static_path).fallback(ServeFile::new(index));

    Router::new()
        .route("/auth", post(auth::handle_auth))
        .route("/verify-email", get(verify::verify_email))
        .route("/api/current-user", get(session::get_current_user))
        .route(
            "/api/tickets",
            get(tickets::list_tickets).post(tickets::create_ticket),
        )
        .route("/api/tickets/{id}", get(tickets::get_ticket))
        .route("/api/tickets/{id}/status", post(tickets::update_ticket_status))
        .route("/api/replies", post(tickets::create_reply))
        .route("/api/admin/replies", post(tickets::admin_reply))
        .route(
            "/api/updates",
            get(updates::list_updates).post(updates::create_update),
        )
        .route("/api/updates/recent", get(updates::recent_updates))
        .route(
            "/api/updates/{id}",
            get(updates::get_update)
                .post(updates::edit_update)
                .delete(updates::delete_update),
        )
        .fallback_service(frontend)
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
