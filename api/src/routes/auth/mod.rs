//! End-user authentication routes.
//!
//! End users sign in exclusively through Discord OAuth. The callback
//! exchanges the authorization code, confirms guild membership and the
//! ticket-opener role gate, upserts the user row, and returns a bearer
//! token.

pub mod get;

use axum::{Router, routing::get};
use util::state::AppState;

use get::{discord_callback, get_me};

/// Builds the `/auth` route group.
///
/// - `GET /auth/discord/callback?code=...` → `discord_callback`
/// - `GET /auth/me` → `get_me`
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/discord/callback", get(discord_callback))
        .route("/me", get(get_me))
}
