use crate::auth::claims::{AuthStaff, AuthUser};
use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts},
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::TypedHeader;
use headers::UserAgent;
use std::net::SocketAddr;
use tracing::info;

/// Logs method, path, IP address, session identity (if any), and user-agent
/// for each incoming HTTP request. Automatically skips CORS preflight
/// `OPTIONS` requests.
pub async fn log_request(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let (mut parts, body) = req.into_parts();

    // Skip logging for preflight requests
    if parts.method == Method::OPTIONS {
        let req = Request::from_parts(parts, body);
        return Ok(next.run(req).await);
    }

    // Identify the session, if there is one. Staff and user tokens are
    // logged distinctly so support traffic can be separated from admin use.
    let session = if let Ok(AuthStaff(c)) = AuthStaff::from_request_parts(&mut parts, &()).await {
        format!("staff:{}", c.sub)
    } else if let Ok(AuthUser(c)) = AuthUser::from_request_parts(&mut parts, &()).await {
        format!("user:{}", c.sub)
    } else {
        "anonymous".to_string()
    };

    let user_agent = TypedHeader::<UserAgent>::from_request_parts(&mut parts, &())
        .await
        .ok()
        .map(|TypedHeader(ua)| ua.to_string());

    info!(
        method = ?parts.method,
        path = %parts.uri.path(),
        ip = %addr.ip(),
        session = %session,
        user_agent = user_agent.unwrap_or_else(|| "unknown".into()),
        "Incoming request"
    );

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}
