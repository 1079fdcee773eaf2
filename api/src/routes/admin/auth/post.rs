use crate::auth::generate_staff_jwt;
use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use common::format_validation_errors;
use db::models::staff;
use serde::{Deserialize, Serialize};
use util::state::AppState;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Default)]
pub struct StaffResponse {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub role: String,
    pub avatar: Option<String>,
}

impl From<staff::Model> for StaffResponse {
    fn from(staff: staff::Model) -> Self {
        Self {
            id: staff.id,
            username: staff.username,
            name: staff.display_name,
            role: staff.role.to_string(),
            avatar: staff.avatar,
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct StaffSessionResponse {
    pub token: String,
    pub expires_at: String,
    pub staff: StaffResponse,
}

/// POST /admin/auth/login
///
/// Username/password login for stored staff accounts.
///
/// ### Request Body
/// ```json
/// { "username": "alice", "password": "strongpassword" }
/// ```
///
/// ### Responses
/// - `200 OK` → `{ token, expires_at, staff }`
/// - `400 Bad Request` → missing fields
/// - `401 Unauthorized` → unknown user, wrong password, or inactive account
pub async fn login(
    State(app_state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let db = app_state.db();

    if let Err(errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error(format_validation_errors(&errors))),
        )
            .into_response();
    }

    match staff::Model::verify_credentials(db, &req.username, &req.password).await {
        Ok(Some(staff)) => {
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
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<Empty>::error("Invalid username or password")),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Staff login failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to log in")),
            )
                .into_response()
        }
    }
}
