//! Staff ("admin") route groups.
//!
//! `/admin/auth` is the only unguarded group here; everything else sits
//! behind the staff-session guard.

pub mod auth;
pub mod categories;
pub mod staff;
pub mod tickets;

use crate::auth::guards::allow_staff;
use axum::{Router, middleware::from_fn};
use util::state::AppState;

/// Builds the `/admin` route tree.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::admin_auth_routes())
        .nest(
            "/tickets",
            tickets::admin_ticket_routes().route_layer(from_fn(allow_staff)),
        )
        .nest(
            "/staff",
            staff::staff_routes().route_layer(from_fn(allow_staff)),
        )
        .nest(
            "/categories",
            categories::category_routes().route_layer(from_fn(allow_staff)),
        )
}
