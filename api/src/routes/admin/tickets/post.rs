use crate::auth::AuthStaff;
use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use crate::routes::admin::tickets::common::{flag_response, load_ticket_checked};
use crate::routes::tickets::common::message_responses;
use crate::services::discord::{DiscordService, new_message_embed, ticket_updated_embed};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use db::models::staff::StaffRole;
use db::models::ticket::{Model as TicketModel, TicketError};
use db::models::ticket_flag::Model as FlagModel;
use db::models::ticket_message::Model as MessageModel;
use db::models::user;
use db::permissions;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use util::{config, state::AppState};

#[derive(Debug, Deserialize)]
pub struct StaffMessageRequest {
    pub content: Option<String>,
    #[serde(default)]
    pub staff_only: bool,
    #[serde(default)]
    pub notify_user: bool,
}

/// POST /admin/tickets/{ticket_id}/messages
///
/// Staff reply. The ticket moves to in-progress, and the first responder
/// claims an unassigned ticket. `staff_only` notes stay invisible to the
/// end user; `notify_user` additionally sends a best-effort DM.
///
/// ### Responses
/// - `201 Created` → the stored message
/// - `400 Bad Request` → empty content
/// - `403 Forbidden` → no permission on the ticket's category
/// - `404 Not Found` → no such ticket
/// - `409 Conflict` → the ticket is closed
pub async fn post_message(
    State(app_state): State<AppState>,
    Path(ticket_id): Path<i64>,
    Extension(AuthStaff(claims)): Extension<AuthStaff>,
    Json(req): Json<StaffMessageRequest>,
) -> impl IntoResponse {
    let db = app_state.db();

    let ticket = match load_ticket_checked(db, ticket_id, &claims).await {
        Ok(t) => t,
        Err(reply) => return reply.into_response(),
    };

    if ticket.status == db::models::ticket::TicketStatus::Closed {
        return (
            StatusCode::CONFLICT,
            Json(ApiResponse::<Empty>::error("Ticket is closed")),
        )
            .into_response();
    }

    let content = req.content.unwrap_or_default();
    let message =
        match MessageModel::create_from_staff(db, ticket.id, claims.sub, &content, req.staff_only)
            .await
        {
            Ok(m) => m,
            Err(e @ TicketError::EmptyMessage) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::<Empty>::error(e.to_string())),
                )
                    .into_response();
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to store staff message");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::<Empty>::error("Failed to send message")),
                )
                    .into_response();
            }
        };

    if let Err(e) = TicketModel::record_staff_reply(db, ticket.id, claims.sub).await {
        tracing::error!(error = %e, "Failed to update ticket after staff reply");
    }

    // Internal notes never notify; regular replies do when asked.
    if req.notify_user && !req.staff_only {
        if let Ok(Some(user)) = user::Model::get_by_id(db, ticket.user_id).await {
            let url = format!("{}/tickets/{}", config::app_url(), ticket.id);
            let embed = new_message_embed(
                ticket.ticket_number,
                ticket.category.label(),
                &ticket.subject,
                &message.content,
                &url,
            );
            DiscordService::send_dm(&user.discord_id, embed).await;
        }
    }

    match message_responses(db, vec![message]).await {
        Ok(mut responses) if !responses.is_empty() => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                responses.remove(0),
                "Message sent successfully",
            )),
        )
            .into_response(),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<Empty>::error("Failed to send message")),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct FlagRequest {
    #[serde(default)]
    pub roles: Vec<String>,
    pub message: Option<String>,
}

/// POST /admin/tickets/{ticket_id}/flag
///
/// Escalates a ticket to one or more roles. Each target must be able to see
/// the ticket's category per the static table; targets that cannot are
/// silently dropped, and the request only fails when nothing remains. One
/// escalation exists per (ticket, role): re-flagging refreshes it and clears
/// its resolution.
///
/// ### Request body
/// ```json
/// { "roles": ["ceo", "moderator"], "message": "needs management eyes" }
/// ```
///
/// ### Responses
/// - `201 Created` → the created/refreshed escalations
/// - `400 Bad Request` → no valid target roles
/// - `403 Forbidden` → no permission on the ticket's category
/// - `404 Not Found` → no such ticket
pub async fn flag_ticket(
    State(app_state): State<AppState>,
    Path(ticket_id): Path<i64>,
    Extension(AuthStaff(claims)): Extension<AuthStaff>,
    Json(req): Json<FlagRequest>,
) -> impl IntoResponse {
    let db = app_state.db();

    let ticket = match load_ticket_checked(db, ticket_id, &claims).await {
        Ok(t) => t,
        Err(reply) => return reply.into_response(),
    };

    // Unknown role names and roles without access to the category are both
    // dropped from the batch rather than failing it.
    let mut targets: Vec<StaffRole> = Vec::new();
    for raw in &req.roles {
        if let Ok(role) = StaffRole::from_str(raw) {
            if permissions::can_access_in_table(role, ticket.category) && !targets.contains(&role) {
                targets.push(role);
            }
        }
    }

    if targets.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error("No valid escalation targets")),
        )
            .into_response();
    }

    let message = req.message.as_deref().filter(|m| !m.trim().is_empty());

    let flags = async {
        let mut out = Vec::new();
        for role in &targets {
            let flag = FlagModel::upsert(db, ticket.id, *role, claims.sub, message).await?;
            out.push(flag_response(db, flag).await?);
        }
        Ok::<_, sea_orm::DbErr>(out)
    }
    .await;

    let flags = match flags {
        Ok(f) => f,
        Err(e) => {
            tracing::error!(error = %e, "Failed to store escalation");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to flag ticket")),
            )
                .into_response();
        }
    };

    let target_labels = targets
        .iter()
        .map(|r| r.label())
        .collect::<Vec<_>>()
        .join(", ");
    let note = match message {
        Some(m) => format!("🚩 {} flagged this ticket to {}: \"{}\"", claims.name, target_labels, m),
        None => format!("🚩 {} flagged this ticket to {}", claims.name, target_labels),
    };
    if let Err(e) = MessageModel::create_system(db, ticket.id, &note).await {
        tracing::error!(error = %e, "Failed to record escalation message");
    }

    (
        StatusCode::CREATED,
        Json(ApiResponse::success(flags, "Ticket flagged successfully")),
    )
        .into_response()
}

#[derive(Debug, Serialize, Default)]
pub struct ResolveResponse {
    pub updated: u64,
}

/// POST /admin/tickets/{ticket_id}/flags/resolve
///
/// Resolves every unresolved escalation targeting the caller's role on this
/// ticket. Idempotent: resolving with nothing pending reports zero updates
/// and still succeeds.
pub async fn resolve_flags(
    State(app_state): State<AppState>,
    Path(ticket_id): Path<i64>,
    Extension(AuthStaff(claims)): Extension<AuthStaff>,
) -> impl IntoResponse {
    let db = app_state.db();

    if let Err(reply) = load_ticket_checked(db, ticket_id, &claims).await {
        return reply.into_response();
    }

    match FlagModel::resolve_for_role(db, ticket_id, claims.role).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                ResolveResponse { updated },
                "Flags resolved successfully",
            )),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to resolve flags");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to resolve flags")),
            )
                .into_response()
        }
    }
}

/// POST /admin/tickets/{ticket_id}/notify
///
/// Sends the user a ticket-updated DM. Unlike the notifications attached to
/// replies and closures, the DM is this endpoint's whole job, so its failure
/// is reported instead of swallowed.
///
/// ### Responses
/// - `200 OK` → notification delivered, system message appended
/// - `502 Bad Gateway` → Discord refused the delivery
pub async fn notify_user(
    State(app_state): State<AppState>,
    Path(ticket_id): Path<i64>,
    Extension(AuthStaff(claims)): Extension<AuthStaff>,
) -> impl IntoResponse {
    let db = app_state.db();

    let ticket = match load_ticket_checked(db, ticket_id, &claims).await {
        Ok(t) => t,
        Err(reply) => return reply.into_response(),
    };

    let user = match user::Model::get_by_id(db, ticket.user_id).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<Empty>::error("Ticket owner not found")),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load ticket owner");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to notify user")),
            )
                .into_response();
        }
    };

    let url = format!("{}/tickets/{}", config::app_url(), ticket.id);
    let embed = ticket_updated_embed(ticket.ticket_number, &ticket.subject, &url);

    if DiscordService::send_dm(&user.discord_id, embed).await {
        let note = format!("📨 {} sent the user a notification on Discord", claims.name);
        if let Err(e) = MessageModel::create_system(db, ticket.id, &note).await {
            tracing::error!(error = %e, "Failed to record notification message");
        }
        (
            StatusCode::OK,
            Json(ApiResponse::success(Empty, "Notification sent")),
        )
            .into_response()
    } else {
        (
            StatusCode::BAD_GATEWAY,
            Json(ApiResponse::<Empty>::error("Could not deliver the notification")),
        )
            .into_response()
    }
}
