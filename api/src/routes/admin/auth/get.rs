use crate::auth::guards::{Empty, STAFF_ROLE_MAP};
use crate::auth::{AuthStaff, generate_staff_jwt};
use crate::response::ApiResponse;
use crate::routes::admin::auth::post::{StaffResponse, StaffSessionResponse};
use crate::services::discord::DiscordService;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use db::models::staff;
use serde::Deserialize;
use util::{config, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
}

/// GET /admin/auth/discord/callback
///
/// Completes the OAuth flow for staff. The session role is resolved live
/// from the member's guild roles through the configured role map, taking the
/// highest-priority match; members without any mapped role are refused. The
/// staff row is upserted so assignments and flags reference a real account.
///
/// ### Responses
/// - `200 OK` → `{ token, expires_at, staff }`
/// - `400 Bad Request` → missing `code`
/// - `401 Unauthorized` → Discord rejected the code
/// - `403 Forbidden` → not a guild member, or no staff role
/// - `502 Bad Gateway` → Discord unreachable
pub async fn discord_callback(
    State(app_state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> impl IntoResponse {
    let db = app_state.db();

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error("Missing authorization code")),
        )
            .into_response();
    };

    let redirect_uri = format!("{}/api/admin/auth/discord/callback", config::app_url());
    let token = match DiscordService::exchange_code(&code, &redirect_uri).await {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(error = %e, "Staff OAuth code exchange failed");
            return (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::<Empty>::error("Discord authentication failed")),
            )
                .into_response();
        }
    };

    let discord_user = match DiscordService::fetch_user(&token.access_token).await {
        Ok(u) => u,
        Err(e) => {
            tracing::warn!(error = %e, "Staff lookup failed during login");
            return (
                StatusCode::BAD_GATEWAY,
                Json(ApiResponse::<Empty>::error("Discord is unavailable")),
            )
                .into_response();
        }
    };

    let member = match DiscordService::fetch_member_me(&token.access_token).await {
        Ok(Some(m)) => m,
        Ok(None) => {
            return (
                StatusCode::FORBIDDEN,
                Json(ApiResponse::<Empty>::error(
                    "You are not a member of the community server",
                )),
            )
                .into_response();
        }
        Err(e) => {
            tracing::warn!(error = %e, "Staff membership lookup failed");
            return (
                StatusCode::BAD_GATEWAY,
                Json(ApiResponse::<Empty>::error("Discord is unavailable")),
            )
                .into_response();
        }
    };

    // Highest-priority mapped role wins when the member holds several.
    let Some(role) = STAFF_ROLE_MAP.highest_role(&member.roles) else {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::<Empty>::error(
                "Your account has no staff role",
            )),
        )
            .into_response();
    };

    let display_name = member
        .nick
        .clone()
        .or_else(|| discord_user.global_name.clone())
        .unwrap_or_else(|| discord_user.username.clone());

    let staff = match staff::Model::upsert_from_discord(
        db,
        &discord_user.id,
        &discord_user.username,
        &display_name,
        role,
        discord_user.avatar_url().as_deref(),
    )
    .await
    {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to upsert staff on login");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to complete login")),
            )
                .into_response();
        }
    };

    let (token, expires_at) = generate_staff_jwt(&staff);
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            StaffSessionResponse {
                token,
                expires_at,
                staff: staff.into(),
            },
            "Logged in successfully",
        )),
    )
        .into_response()
}

/// GET /admin/auth/me
///
/// The staff identity behind the presented token.
pub async fn get_me(AuthStaff(claims): AuthStaff) -> impl IntoResponse {
    Json(ApiResponse::success(
        StaffResponse {
            id: claims.sub,
            username: claims.username,
            name: claims.name,
            role: claims.role.to_string(),
            avatar: claims.avatar,
        },
        "Session retrieved successfully",
    ))
}
