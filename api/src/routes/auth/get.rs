use crate::auth::guards::{ALLOWED_USER_ROLE_IDS, Empty};
use crate::auth::{AuthUser, generate_user_jwt};
use crate::response::ApiResponse;
use crate::services::discord::DiscordService;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use db::models::user;
use serde::{Deserialize, Serialize};
use util::{config, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct UserResponse {
    pub id: i64,
    pub discord_id: String,
    pub username: String,
    pub display_name: String,
    pub avatar: Option<String>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            discord_id: user.discord_id,
            username: user.username,
            display_name: user.display_name,
            avatar: user.avatar,
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct UserSessionResponse {
    pub token: String,
    pub expires_at: String,
    pub user: UserResponse,
}

/// GET /auth/discord/callback
///
/// Completes the OAuth flow for end users: code → token → identity → guild
/// membership. Login is refused for non-members and for members without any
/// of the configured ticket-opener roles; everyone else gets their user row
/// upserted and a session token.
///
/// ### Responses
/// - `200 OK` → `{ token, expires_at, user }`
/// - `400 Bad Request` → missing `code`
/// - `401 Unauthorized` → Discord rejected the code
/// - `403 Forbidden` → not a guild member, or no ticket-opener role
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

    let redirect_uri = format!("{}/api/auth/discord/callback", config::app_url());
    let token = match DiscordService::exchange_code(&code, &redirect_uri).await {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(error = %e, "User OAuth code exchange failed");
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
            tracing::warn!(error = %e, "User lookup failed during login");
            return (
                StatusCode::BAD_GATEWAY,
                Json(ApiResponse::<Empty>::error("Discord is unavailable")),
            )
                .into_response();
        }
    };

    let member = match DiscordService::fetch_member_me(&token.access_token).await {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(error = %e, "Membership lookup failed during login");
            return (
                StatusCode::BAD_GATEWAY,
                Json(ApiResponse::<Empty>::error("Discord is unavailable")),
            )
                .into_response();
        }
    };

    let Some(member) = member else {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::<Empty>::error(
                "You must be a member of the community server to open tickets",
            )),
        )
            .into_response();
    };

    // An empty configured list means membership alone is enough.
    let gate = &*ALLOWED_USER_ROLE_IDS;
    if !gate.is_empty() && !member.roles.iter().any(|r| gate.contains(r)) {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::<Empty>::error(
                "Your account has no permission to open tickets",
            )),
        )
            .into_response();
    }

    // Prefer the server nickname, then the global display name.
    let display_name = member
        .nick
        .clone()
        .or_else(|| discord_user.global_name.clone())
        .unwrap_or_else(|| discord_user.username.clone());

    let user = match user::Model::upsert_from_discord(
        db,
        &discord_user.id,
        &discord_user.username,
        &display_name,
        discord_user.avatar_url().as_deref(),
        discord_user.email.as_deref(),
    )
    .await
    {
        Ok(u) => u,
        Err(e) => {
            tracing::error!(error = %e, "Failed to upsert user on login");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to complete login")),
            )
                .into_response();
        }
    };

    let (token, expires_at) = generate_user_jwt(&user);
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            UserSessionResponse {
                token,
                expires_at,
                user: user.into(),
            },
            "Logged in successfully",
        )),
    )
        .into_response()
}

/// GET /auth/me
///
/// Returns the user behind the presented token.
///
/// ### Responses
/// - `200 OK` → `{ user }`
/// - `401 Unauthorized` → missing/invalid token
/// - `404 Not Found` → the account no longer exists
pub async fn get_me(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> impl IntoResponse {
    let db = app_state.db();

    match user::Model::get_by_id(db, claims.sub).await {
        Ok(Some(user)) => (
            StatusCode::OK,
            Json(ApiResponse::<UserResponse>::success(
                user.into(),
                "User retrieved successfully",
            )),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Empty>::error("User not found")),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load user");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to load user")),
            )
                .into_response()
        }
    }
}
