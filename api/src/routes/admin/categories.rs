use crate::auth::AuthStaff;
use crate::auth::guards::staff_broker_status;
use crate::response::ApiResponse;
use axum::{Extension, Json, Router, response::IntoResponse, routing::get};
use db::permissions;
use serde::Serialize;
use util::state::AppState;

/// Builds the `/admin/categories` route group.
pub fn category_routes() -> Router<AppState> {
    Router::new().route("/", get(get_categories))
}

#[derive(Debug, Serialize)]
pub struct CategoryEntry {
    pub id: String,
    pub label: String,
    pub emoji: String,
    pub description: String,
}

/// GET /admin/categories
///
/// The categories the caller may act on, housing included only after the
/// live broker verification (management roles are exempt). The dashboard
/// uses this to build its filters and the new-ticket move targets.
pub async fn get_categories(
    Extension(AuthStaff(claims)): Extension<AuthStaff>,
) -> impl IntoResponse {
    let is_broker = staff_broker_status(&claims).await;

    let categories: Vec<CategoryEntry> = permissions::allowed_categories(claims.role, is_broker)
        .into_iter()
        .map(|c| CategoryEntry {
            id: c.to_string(),
            label: c.label().to_string(),
            emoji: c.emoji().to_string(),
            description: c.description().to_string(),
        })
        .collect();

    Json(ApiResponse::success(
        categories,
        "Categories retrieved successfully",
    ))
}
