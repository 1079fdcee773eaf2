use crate::auth::AuthStaff;
use crate::auth::guards::{Empty, staff_can_access};
use crate::response::ApiResponse;
use crate::routes::admin::tickets::common::{load_ticket_checked, summarize};
use crate::services::discord::{DiscordService, ticket_closed_embed};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use db::models::ticket::{Model as TicketModel, TicketCategory, TicketError, TicketStatus};
use db::models::ticket_message::Model as MessageModel;
use db::models::{staff, user};
use serde::Deserialize;
use util::{config, state::AppState};

#[derive(Debug, Deserialize)]
pub struct UpdateTicketRequest {
    pub status: Option<String>,
    pub subject: Option<String>,
    pub category: Option<String>,
    pub assigned_to_id: Option<i64>,
    pub closed_reason: Option<String>,
}

/// PATCH /admin/tickets/{ticket_id}
///
/// Staff triage in one endpoint: status changes (closing runs the full
/// closure flow), subject edits, reassignment, and category moves.
///
/// Category moves are re-validated against the destination category
/// independently of the source, and recorded with a system message. Closing
/// stamps the reason and time, appends the rating invitation, and notifies
/// the user best-effort; a failed DM never rolls the close back.
///
/// ### Responses
/// - `200 OK` → the updated ticket summary
/// - `400 Bad Request` → unknown status or category value
/// - `403 Forbidden` → no permission on the current or destination category
/// - `404 Not Found` → no such ticket or assignee
/// - `409 Conflict` → ticket closed, already closed, or destination slot taken
pub async fn update_ticket(
    State(app_state): State<AppState>,
    Path(ticket_id): Path<i64>,
    Extension(AuthStaff(claims)): Extension<AuthStaff>,
    Json(req): Json<UpdateTicketRequest>,
) -> impl IntoResponse {
    let db = app_state.db();

    let ticket = match load_ticket_checked(db, ticket_id, &claims).await {
        Ok(t) => t,
        Err(reply) => return reply.into_response(),
    };

    // Category move first: permission must hold for the destination on its
    // own, and later status edits apply to the moved ticket.
    if let Some(raw) = req.category.as_deref().filter(|c| !c.is_empty()) {
        let Ok(category) = raw.parse::<TicketCategory>() else {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<Empty>::error("Invalid category value")),
            )
                .into_response();
        };

        if category != ticket.category {
            if !staff_can_access(&claims, category).await {
                return (
                    StatusCode::FORBIDDEN,
                    Json(ApiResponse::<Empty>::error(
                        "No permission for the destination category",
                    )),
                )
                    .into_response();
            }

            let old = ticket.category;
            match TicketModel::change_category(db, ticket_id, category).await {
                Ok(_) => {
                    let note = format!(
                        "📁 {} moved this ticket from {} to {}",
                        claims.name,
                        old.label(),
                        category.label()
                    );
                    if let Err(e) = MessageModel::create_system(db, ticket_id, &note).await {
                        tracing::error!(error = %e, "Failed to record category change");
                    }
                }
                Err(e @ (TicketError::Closed | TicketError::DuplicateActive(_))) => {
                    return (
                        StatusCode::CONFLICT,
                        Json(ApiResponse::<Empty>::error(e.to_string())),
                    )
                        .into_response();
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to change category");
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ApiResponse::<Empty>::error("Failed to update ticket")),
                    )
                        .into_response();
                }
            }
        }
    }

    if let Some(assignee_id) = req.assigned_to_id {
        if staff::Model::get_by_id(db, assignee_id)
            .await
            .ok()
            .flatten()
            .is_none()
        {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<Empty>::error("Assignee not found")),
            )
                .into_response();
        }

        match TicketModel::claim(db, ticket_id, assignee_id).await {
            Ok(_) => {}
            Err(e @ TicketError::Closed) => {
                return (
                    StatusCode::CONFLICT,
                    Json(ApiResponse::<Empty>::error(e.to_string())),
                )
                    .into_response();
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to assign ticket");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::<Empty>::error("Failed to update ticket")),
                )
                    .into_response();
            }
        }
    }

    if let Some(subject) = req.subject.as_deref().filter(|s| !s.trim().is_empty()) {
        if let Err(e) = TicketModel::set_subject(db, ticket_id, subject.trim()).await {
            tracing::error!(error = %e, "Failed to update subject");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to update ticket")),
            )
                .into_response();
        }
    }

    if let Some(raw) = req.status.as_deref().filter(|s| !s.is_empty()) {
        let Ok(status) = raw.parse::<TicketStatus>() else {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<Empty>::error("Invalid status value")),
            )
                .into_response();
        };

        if status == TicketStatus::Closed {
            if let Err(reply) = close_ticket(db, ticket_id, &claims, req.closed_reason.as_deref()).await
            {
                return reply.into_response();
            }
        } else {
            match TicketModel::set_status(db, ticket_id, status).await {
                Ok(_) => {}
                Err(e @ TicketError::Closed) => {
                    return (
                        StatusCode::CONFLICT,
                        Json(ApiResponse::<Empty>::error(e.to_string())),
                    )
                        .into_response();
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to update status");
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ApiResponse::<Empty>::error("Failed to update ticket")),
                    )
                        .into_response();
                }
            }
        }
    }

    let updated = match TicketModel::get_by_id(db, ticket_id).await {
        Ok(Some(t)) => t,
        _ => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to update ticket")),
            )
                .into_response();
        }
    };

    match summarize(db, updated).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(ApiResponse::success(summary, "Ticket updated successfully")),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build ticket summary");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to update ticket")),
            )
                .into_response()
        }
    }
}

/// Runs the closure flow: state change, rating-invitation system message,
/// best-effort DM. Only the state change can fail the request.
async fn close_ticket(
    db: &sea_orm::DatabaseConnection,
    ticket_id: i64,
    claims: &crate::auth::StaffClaims,
    reason: Option<&str>,
) -> Result<(), super::common::ErrorReply> {
    let closed = match TicketModel::close(db, ticket_id, reason).await {
        Ok(t) => t,
        Err(e @ TicketError::AlreadyClosed) => {
            return Err((
                StatusCode::CONFLICT,
                Json(ApiResponse::error(e.to_string())),
            ));
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to close ticket");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to close ticket")),
            ));
        }
    };

    let note = format!(
        "🔒 {} closed this ticket. Rate your support experience at {}/rate",
        claims.name,
        config::app_url()
    );
    if let Err(e) = MessageModel::create_system(db, ticket_id, &note).await {
        tracing::error!(error = %e, "Failed to record closure message");
    }

    // Best effort: a failed notification never rolls back the close.
    if let Ok(Some(user)) = user::Model::get_by_id(db, closed.user_id).await {
        let url = format!("{}/tickets/{}", config::app_url(), closed.id);
        let embed = ticket_closed_embed(
            closed.ticket_number,
            closed.category.label(),
            &claims.name,
            &url,
        );
        DiscordService::send_dm(&user.discord_id, embed).await;
    }

    Ok(())
}
