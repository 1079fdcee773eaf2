//! Staff ticket routes.
//!
//! The triage surface: listing and search, detail, updates (status,
//! category, assignment, closure), staff replies, escalations, user
//! notification, and transcript export.
//!
//! Every single-ticket operation checks category permission with the live
//! broker-aware form before acting; only the listings filter silently.

pub mod common;
pub mod get;
pub mod patch;
pub mod post;

use axum::{
    Router,
    routing::{get, patch, post},
};
use util::state::AppState;

use get::{export_ticket, export_tickets, get_flagged_tickets, get_flags, get_ticket, get_tickets};
use patch::update_ticket;
use post::{flag_ticket, notify_user, post_message, resolve_flags};

/// Builds the `/admin/tickets` route group.
///
/// - `GET   /admin/tickets`                           → List/search tickets
/// - `GET   /admin/tickets/flagged`                   → Caller's escalation queue
/// - `GET   /admin/tickets/export`                    → Batch transcript zip
/// - `GET   /admin/tickets/{ticket_id}`               → Ticket detail
/// - `PATCH /admin/tickets/{ticket_id}`               → Update/close/move/assign
/// - `POST  /admin/tickets/{ticket_id}/messages`      → Staff reply
/// - `POST  /admin/tickets/{ticket_id}/flag`          → Escalate to roles
/// - `GET   /admin/tickets/{ticket_id}/flags`         → List escalations
/// - `POST  /admin/tickets/{ticket_id}/flags/resolve` → Resolve own role's escalations
/// - `POST  /admin/tickets/{ticket_id}/notify`        → DM the ticket owner
/// - `GET   /admin/tickets/{ticket_id}/export`        → Single transcript download
pub fn admin_ticket_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_tickets))
        .route("/flagged", get(get_flagged_tickets))
        .route("/export", get(export_tickets))
        .route("/{ticket_id}", get(get_ticket))
        .route("/{ticket_id}", patch(update_ticket))
        .route("/{ticket_id}/messages", post(post_message))
        .route("/{ticket_id}/flag", post(flag_ticket))
        .route("/{ticket_id}/flags", get(get_flags))
        .route("/{ticket_id}/flags/resolve", post(resolve_flags))
        .route("/{ticket_id}/notify", post(notify_user))
        .route("/{ticket_id}/export", get(export_ticket))
}
