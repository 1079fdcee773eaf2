//! Staff authentication routes.
//!
//! Two parallel login paths issue the same kind of session token: a
//! username/password form checked against stored staff rows, and Discord
//! OAuth with the session role resolved live from guild membership.

pub mod get;
pub mod post;

use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

use get::{discord_callback, get_me};
use post::login;

/// Builds the `/admin/auth` route group.
///
/// - `POST /admin/auth/login` → `login`
/// - `GET  /admin/auth/discord/callback?code=...` → `discord_callback`
/// - `GET  /admin/auth/me` → `get_me`
pub fn admin_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/discord/callback", get(discord_callback))
        .route("/me", get(get_me))
}
