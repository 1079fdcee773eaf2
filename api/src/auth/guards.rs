use crate::auth::claims::{AuthStaff, AuthUser, StaffClaims};
use crate::response::ApiResponse;
use crate::services::discord::DiscordService;
use axum::{
    Json,
    body::Body,
    extract::FromRequestParts,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use db::models::ticket::TicketCategory;
use db::permissions::{self, RoleMap};
use once_cell::sync::Lazy;
use util::config;

/// Discord role-id → staff role mapping, loaded once from configuration.
pub static STAFF_ROLE_MAP: Lazy<RoleMap> =
    Lazy::new(|| RoleMap::from_spec(&config::discord_staff_roles()));

/// Discord role ids whose holders may open tickets.
pub static ALLOWED_USER_ROLE_IDS: Lazy<Vec<String>> = Lazy::new(|| {
    config::discord_user_roles()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
});

#[derive(serde::Serialize, Default)]
pub struct Empty;

/// Helper to extract and validate a staff session from a request, inserting
/// the claims back into the request extensions for downstream handlers.
async fn extract_and_insert_staff(
    req: Request<Body>,
) -> Result<(Request<Body>, AuthStaff), (StatusCode, Json<ApiResponse<Empty>>)> {
    let (mut parts, body) = req.into_parts();
    let staff = AuthStaff::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Authentication required")),
            )
        })?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(staff.clone());
    Ok((req, staff))
}

async fn extract_and_insert_user(
    req: Request<Body>,
) -> Result<(Request<Body>, AuthUser), (StatusCode, Json<ApiResponse<Empty>>)> {
    let (mut parts, body) = req.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Authentication required")),
            )
        })?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user.clone());
    Ok((req, user))
}

/// Guard requiring a valid staff session.
pub async fn allow_staff(
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, _staff) = extract_and_insert_staff(req).await?;
    Ok(next.run(req).await)
}

/// Guard requiring a valid end-user session.
pub async fn allow_user(
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, _user) = extract_and_insert_user(req).await?;
    Ok(next.run(req).await)
}

/// Guard accepting either identity. Used by the upload endpoint, which both
/// sides of the conversation share.
pub async fn allow_any_session(
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (mut parts, body) = req.into_parts();

    if let Ok(staff) = AuthStaff::from_request_parts(&mut parts, &()).await {
        let mut req = Request::from_parts(parts, body);
        req.extensions_mut().insert(staff);
        return Ok(next.run(req).await);
    }

    if let Ok(user) = AuthUser::from_request_parts(&mut parts, &()).await {
        let mut req = Request::from_parts(parts, body);
        req.extensions_mut().insert(user);
        return Ok(next.run(req).await);
    }

    Err((
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::error("Authentication required")),
    ))
}

/// Resolves the caller's broker status for housing checks.
///
/// Password-only staff have no Discord identity to verify and OAuth staff
/// whose lookup fails are treated as non-brokers: authorization-path
/// failures deny.
pub async fn staff_broker_status(claims: &StaffClaims) -> bool {
    if permissions::broker_exempt(claims.role) {
        return true;
    }
    match claims.discord_id.as_deref() {
        Some(discord_id) => DiscordService::member_has_broker_role(discord_id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, discord_id, "Broker role lookup failed; denying");
                false
            }),
        None => false,
    }
}

/// Full permission check for write actions on a ticket category.
///
/// Performs the live broker lookup only when the category demands it, then
/// defers to the static table.
pub async fn staff_can_access(claims: &StaffClaims, category: TicketCategory) -> bool {
    let is_broker = if category == TicketCategory::Housing && !permissions::broker_exempt(claims.role)
    {
        staff_broker_status(claims).await
    } else {
        false
    };

    permissions::can_access_with_broker(claims.role, category, is_broker)
}
