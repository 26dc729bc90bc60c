//! Ticket store operations with per-call authorization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use studiodesk_core::{CurrentUser, TicketStatus, TicketType, UserId, ViewGrant};

use crate::crypto::{generate_token, normalize_email};
use crate::error::DeskError;
use crate::store::{BugDetails, NewReply, NewTicket, Reply, Ticket, TicketId, TicketStore};

/// Input for `createTicket`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub email: Option<String>,
    /// `support` (default) or `bug_report`
    pub ticket_type: Option<String>,
    #[serde(flatten)]
    pub bug: BugDetails,
}

/// Input for `createReply`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReplyInput {
    pub ticket_id: TicketId,
    #[serde(default)]
    pub content: String,
    /// Honored only for admin callers
    #[serde(default)]
    pub is_admin: bool,
}

/// Input for `adminReply`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminReplyInput {
    pub ticket_id: TicketId,
    #[serde(default)]
    pub content: String,
}

/// A ticket as returned to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    pub email: Option<String>,
    pub user_id: Option<UserId>,
    pub ticket_type: TicketType,
    pub status: TicketStatus,
    #[serde(flatten)]
    pub bug: BugDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Only present in the response to the creator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_token: Option<String>,
    pub replies: Vec<Reply>,
}

impl TicketView {
    /// Client view with the capability token stripped
    fn new(ticket: Ticket, replies: Vec<Reply>) -> Self {
        Self {
            id: ticket.id,
            title: ticket.title,
            description: ticket.description,
            email: ticket.email,
            user_id: ticket.user_id,
            ticket_type: ticket.ticket_type,
            status: ticket.status,
            bug: ticket.bug,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
            view_token: None,
            replies,
        }
    }
}

fn required(value: &str, field: &str) -> Result<String, DeskError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DeskError::validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Blank strings become `None`
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn with_replies<T: TicketStore>(tickets: &T, ticket: Ticket) -> Result<TicketView, DeskError> {
    let replies = tickets.list_replies(ticket.id)?;
    Ok(TicketView::new(ticket, replies))
}

/// Open a ticket. Anyone may call this; the caller's id is recorded when
/// signed in. The response is the only place the view token is revealed.
pub fn create_ticket<T: TicketStore>(
    tickets: &T,
    input: CreateTicketInput,
    current: &CurrentUser,
    now: DateTime<Utc>,
) -> Result<TicketView, DeskError> {
    let title = required(&input.title, "Title")?;
    let description = required(&input.description, "Description")?;
    let ticket_type = match optional(input.ticket_type) {
        Some(t) => t.parse::<TicketType>()?,
        None => TicketType::Support,
    };
    let bug = input.bug;

    let ticket = tickets.create_ticket(NewTicket {
        title,
        description,
        email: optional(input.email).map(|e| normalize_email(&e)),
        user_id: current.id(),
        view_token: generate_token(),
        ticket_type,
        bug: BugDetails {
            game_version: optional(bug.game_version),
            platform: optional(bug.platform),
            severity: optional(bug.severity),
            frequency: optional(bug.frequency),
            steps_to_reproduce: optional(bug.steps_to_reproduce),
            expected_behavior: optional(bug.expected_behavior),
            actual_behavior: optional(bug.actual_behavior),
        },
        created_at: now,
    })?;

    tracing::info!(
        ticket_id = ticket.id.0,
        ticket_type = %ticket.ticket_type,
        user_id = ?ticket.user_id.map(|id| id.0),
        "Ticket created"
    );

    let view_token = ticket.view_token.clone();
    let mut view = TicketView::new(ticket, Vec::new());
    view.view_token = Some(view_token);
    Ok(view)
}

/// All tickets, newest first. Admin only.
pub fn list_tickets<T: TicketStore>(
    tickets: &T,
    current: &CurrentUser,
) -> Result<Vec<TicketView>, DeskError> {
    current.require_admin()?;

    tickets
        .list_tickets()?
        .into_iter()
        .map(|ticket| with_replies(tickets, ticket))
        .collect()
}

/// Read one ticket.
///
/// Returns `None` both for a missing ticket and for a caller who is neither
/// admin, owner, nor holder of the view token.
pub fn get_ticket<T: TicketStore>(
    tickets: &T,
    id: TicketId,
    token: Option<&str>,
    current: &CurrentUser,
) -> Result<Option<TicketView>, DeskError> {
    let Some(ticket) = tickets.get_ticket(id)? else {
        return Ok(None);
    };

    match ViewGrant::decide(current, ticket.user_id, &ticket.view_token, token) {
        Some(grant) => {
            tracing::debug!(ticket_id = id.0, ?grant, "Ticket view granted");
            with_replies(tickets, ticket).map(Some)
        }
        None => Ok(None),
    }
}

/// Change a ticket's status. Admin only.
pub fn update_ticket_status<T: TicketStore>(
    tickets: &T,
    id: TicketId,
    status: &str,
    current: &CurrentUser,
    now: DateTime<Utc>,
) -> Result<TicketView, DeskError> {
    let admin = current.require_admin()?;
    let status: TicketStatus = status.trim().parse()?;

    let ticket = tickets
        .update_status(id, status, now)?
        .ok_or(DeskError::NotFound("Ticket"))?;

    tracing::info!(ticket_id = id.0, %status, admin_id = %admin.id, "Ticket status changed");
    with_replies(tickets, ticket)
}

/// Append a reply. Anyone may call this, but only an admin's reply can be
/// flagged as a staff reply.
pub fn create_reply<T: TicketStore>(
    tickets: &T,
    input: CreateReplyInput,
    current: &CurrentUser,
    now: DateTime<Utc>,
) -> Result<Reply, DeskError> {
    let content = required(&input.content, "Content")?;

    let is_admin = if input.is_admin && !current.is_admin() {
        tracing::warn!(
            ticket_id = input.ticket_id.0,
            user_id = ?current.id().map(|id| id.0),
            "Ignoring isAdmin flag from non-admin caller"
        );
        false
    } else {
        input.is_admin
    };

    let reply = tickets.create_reply(NewReply {
        ticket_id: input.ticket_id,
        content,
        is_admin,
        created_at: now,
    })?;

    tracing::info!(ticket_id = reply.ticket_id.0, reply_id = reply.id.0, is_admin, "Reply added");
    Ok(reply)
}

/// Append a staff reply. Admin only; always flagged as admin.
pub fn admin_reply<T: TicketStore>(
    tickets: &T,
    input: AdminReplyInput,
    current: &CurrentUser,
    now: DateTime<Utc>,
) -> Result<Reply, DeskError> {
    current.require_admin()?;
    let content = required(&input.content, "Content")?;

    let reply = tickets.create_reply(NewReply {
        ticket_id: input.ticket_id,
        content,
        is_admin: true,
        created_at: now,
    })?;

    tracing::info!(ticket_id = reply.ticket_id.0, reply_id = reply.id.0, "Admin reply added");
    Ok(reply)
}
