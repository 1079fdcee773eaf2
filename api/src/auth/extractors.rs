use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use axum_extra::extract::TypedHeader;
use headers::{Authorization, authorization::Bearer};

use crate::auth::claims::{AuthStaff, AuthUser};
use crate::auth::{verify_staff_token, verify_user_token};

/// Extracts `AuthStaff` from the `Authorization: Bearer` header.
///
/// The token must verify against the shared secret and carry the staff
/// scope; an end-user token is rejected exactly like a missing one.
///
/// # Errors
/// - Returns `401 Unauthorized` if the header is missing, malformed, or the
///   token is invalid, expired, or has the wrong scope.
impl<S> FromRequestParts<S> for AuthStaff
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    (
                        StatusCode::UNAUTHORIZED,
                        "Missing or invalid Authorization header",
                    )
                })?;

        verify_staff_token(bearer.token())
            .map(AuthStaff)
            .ok_or((StatusCode::UNAUTHORIZED, "Invalid or expired token"))
    }
}

/// Extracts `AuthUser` from the `Authorization: Bearer` header.
///
/// Same rules as [`AuthStaff`], for the end-user scope.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    (
                        StatusCode::UNAUTHORIZED,
                        "Missing or invalid Authorization header",
                    )
                })?;

        verify_user_token(bearer.token())
            .map(AuthUser)
            .ok_or((StatusCode::UNAUTHORIZED, "Invalid or expired token"))
    }
}
