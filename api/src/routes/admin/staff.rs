use crate::auth::AuthStaff;
use crate::auth::guards::{Empty, STAFF_ROLE_MAP};
use crate::response::ApiResponse;
use crate::services::discord::DiscordService;
use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use db::models::staff;
use db::models::ticket::TicketCategory;
use db::permissions;
use serde::{Deserialize, Serialize};
use util::state::AppState;

/// Builds the `/admin/staff` route group.
///
/// - `GET /admin/staff`            → Active staff accounts (minus the caller)
/// - `GET /admin/staff/available`  → Guild members eligible for a category
pub fn staff_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_staff))
        .route("/available", get(get_available_staff))
}

#[derive(Debug, Serialize)]
pub struct StaffListEntry {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub role: String,
}

/// GET /admin/staff
///
/// All active staff accounts except the caller, for pickers.
pub async fn get_staff(
    State(app_state): State<AppState>,
    Extension(AuthStaff(claims)): Extension<AuthStaff>,
) -> impl IntoResponse {
    let db = app_state.db();

    match staff::Model::find_active(db).await {
        Ok(staff) => {
            let entries: Vec<StaffListEntry> = staff
                .into_iter()
                .filter(|s| s.id != claims.sub)
                .map(|s| StaffListEntry {
                    id: s.id,
                    username: s.username,
                    name: s.display_name,
                    role: s.role.to_string(),
                })
                .collect();

            (
                StatusCode::OK,
                Json(ApiResponse::success(entries, "Staff retrieved successfully")),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to list staff");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to retrieve staff")),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AvailableParams {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AvailableStaffEntry {
    pub discord_id: String,
    pub username: String,
    pub name: String,
    pub role: String,
}

/// GET /admin/staff/available?category=...
///
/// Guild members whose mapped staff role can see the given category,
/// resolved live from one bounded page of the member list. Used to pick
/// escalation targets that will actually be able to act.
///
/// ### Responses
/// - `200 OK` → list of eligible members
/// - `400 Bad Request` → missing or unknown category
/// - `502 Bad Gateway` → Discord unreachable
pub async fn get_available_staff(
    State(_app_state): State<AppState>,
    Extension(AuthStaff(claims)): Extension<AuthStaff>,
    Query(params): Query<AvailableParams>,
) -> impl IntoResponse {
    let Some(category) = params
        .category
        .as_deref()
        .filter(|c| !c.is_empty())
        .and_then(|c| c.parse::<TicketCategory>().ok())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error("A valid category is required")),
        )
            .into_response();
    };

    let members = match DiscordService::list_members().await {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(error = %e, "Guild member listing failed");
            return (
                StatusCode::BAD_GATEWAY,
                Json(ApiResponse::<Empty>::error("Discord is unavailable")),
            )
                .into_response();
        }
    };

    let entries: Vec<AvailableStaffEntry> = members
        .into_iter()
        .filter_map(|member| {
            let user = member.user.as_ref()?;
            // Never offer the caller as their own escalation target.
            if claims.discord_id.as_deref() == Some(user.id.as_str()) {
                return None;
            }
            let role = STAFF_ROLE_MAP.highest_role(&member.roles)?;
            if !permissions::can_access_in_table(role, category) {
                return None;
            }
            Some(AvailableStaffEntry {
                discord_id: user.id.clone(),
                username: user.username.clone(),
                name: member
                    .nick
                    .clone()
                    .or_else(|| user.global_name.clone())
                    .unwrap_or_else(|| user.username.clone()),
                role: role.to_string(),
            })
        })
        .collect();

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            entries,
            "Available staff retrieved successfully",
        )),
    )
        .into_response()
}
