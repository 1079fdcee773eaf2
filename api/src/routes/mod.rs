//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → Liveness probe (public)
//! - `/auth` → End-user Discord OAuth (public callback, token-guarded `/me`)
//! - `/tickets` → End-user ticket operations (user session required)
//! - `/admin/auth` → Staff login (public)
//! - `/admin/...` → Staff triage surface (staff session required)
//! - `/uploads` → Image uploads (either session)
//! - `/discord/interactions` → Signed webhook from Discord (signature-guarded)

pub mod admin;
pub mod auth;
pub mod health;
pub mod interactions;
pub mod tickets;
pub mod uploads;

use crate::auth::guards::{allow_any_session, allow_user};
use axum::{Router, middleware::from_fn};
use util::state::AppState;

/// Builds the complete application router for all HTTP endpoints.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health::health_routes())
        .nest("/auth", auth::auth_routes())
        .nest(
            "/tickets",
            tickets::ticket_routes().route_layer(from_fn(allow_user)),
        )
        .nest("/admin", admin::admin_routes())
        .nest(
            "/uploads",
            uploads::upload_routes().route_layer(from_fn(allow_any_session)),
        )
        .nest("/discord", interactions::interaction_routes())
        .with_state(app_state)
}
