//! End-user ticket routes.
//!
//! Everything here operates strictly on the caller's own tickets; another
//! user's ticket is indistinguishable from a missing one.

pub mod common;
pub mod get;
pub mod post;

use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

use get::{get_ticket, get_tickets};
use post::{create_ticket, post_message};

/// Builds the `/tickets` route group for end users.
///
/// - `GET    /tickets`                        → List own tickets
/// - `POST   /tickets`                        → Open a ticket
/// - `GET    /tickets/{ticket_id}`            → Own ticket detail
/// - `POST   /tickets/{ticket_id}/messages`   → Reply on own ticket
pub fn ticket_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_tickets))
        .route("/", post(create_ticket))
        .route("/{ticket_id}", get(get_ticket))
        .route("/{ticket_id}/messages", post(post_message))
}
