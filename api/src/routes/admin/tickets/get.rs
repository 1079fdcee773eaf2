use crate::auth::AuthStaff;
use crate::auth::guards::{Empty, staff_broker_status};
use crate::response::ApiResponse;
use crate::routes::admin::tickets::common::{
    AdminTicketSummary, FlagResponse, flag_response, load_ticket_checked, load_transcript,
    summarize,
};
use crate::routes::tickets::common::{MessageResponse, TicketResponse, message_responses};
use crate::services::transcript;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use db::models::ticket::{Model as TicketModel, TicketCategory, TicketStatus};
use db::models::ticket_flag::Model as FlagModel;
use db::models::ticket_message::Model as MessageModel;
use db::permissions;
use serde::{Deserialize, Serialize};
use util::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub category: Option<String>,
    pub query: Option<String>,
}

/// GET /admin/tickets
///
/// Dashboard listing with optional status/category filters and a subject
/// search. Rows in categories the caller's role cannot see are silently
/// filtered out (the synchronous check; unverified housing access hides
/// rather than reveals).
///
/// ### Responses
/// - `200 OK` → list of ticket summaries
/// - `400 Bad Request` → unknown status or category value
pub async fn get_tickets(
    State(app_state): State<AppState>,
    Extension(AuthStaff(claims)): Extension<AuthStaff>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let db = app_state.db();

    let status = match params.status.as_deref() {
        None | Some("") => None,
        Some(raw) => match raw.parse::<TicketStatus>() {
            Ok(s) => Some(s),
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::<Empty>::error("Invalid status value")),
                )
                    .into_response();
            }
        },
    };
    let category = match params.category.as_deref() {
        None | Some("") => None,
        Some(raw) => match raw.parse::<TicketCategory>() {
            Ok(c) => Some(c),
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::<Empty>::error("Invalid category value")),
                )
                    .into_response();
            }
        },
    };

    let tickets =
        match TicketModel::find_filtered(db, status, category, params.query.as_deref()).await {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list tickets");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::<Empty>::error("Failed to retrieve tickets")),
                )
                    .into_response();
            }
        };

    let mut summaries: Vec<AdminTicketSummary> = Vec::new();
    for ticket in tickets
        .into_iter()
        .filter(|t| permissions::can_access(claims.role, t.category))
    {
        match summarize(db, ticket).await {
            Ok(summary) => summaries.push(summary),
            Err(e) => {
                tracing::error!(error = %e, "Failed to build ticket summary");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::<Empty>::error("Failed to retrieve tickets")),
                )
                    .into_response();
            }
        }
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            summaries,
            "Tickets retrieved successfully",
        )),
    )
        .into_response()
}

#[derive(Debug, Serialize, Default)]
pub struct AdminTicketDetail {
    pub ticket: TicketResponse,
    pub user: Option<super::common::TicketUserResponse>,
    pub assigned_to: Option<super::common::AssigneeResponse>,
    pub messages: Vec<MessageResponse>,
    pub flags: Vec<FlagResponse>,
}

/// GET /admin/tickets/{ticket_id}
///
/// Full ticket detail for staff, internal notes and escalations included.
///
/// ### Responses
/// - `200 OK` → `{ ticket, user, assigned_to, messages, flags }`
/// - `403 Forbidden` → caller's role cannot act on the ticket's category
/// - `404 Not Found` → no such ticket
pub async fn get_ticket(
    State(app_state): State<AppState>,
    Path(ticket_id): Path<i64>,
    Extension(AuthStaff(claims)): Extension<AuthStaff>,
) -> impl IntoResponse {
    let db = app_state.db();

    let ticket = match load_ticket_checked(db, ticket_id, &claims).await {
        Ok(t) => t,
        Err(reply) => return reply.into_response(),
    };

    let detail = async {
        let user = db::models::user::Model::get_by_id(db, ticket.user_id).await?;
        let assigned_to = match ticket.assigned_to {
            Some(id) => db::models::staff::Model::get_by_id(db, id)
                .await?
                .map(Into::into),
            None => None,
        };
        let messages = MessageModel::find_all_for_ticket(db, ticket.id, true).await?;
        let messages = message_responses(db, messages).await?;

        let mut flags = Vec::new();
        for flag in FlagModel::find_for_ticket(db, ticket.id).await? {
            flags.push(flag_response(db, flag).await?);
        }

        Ok::<_, sea_orm::DbErr>(AdminTicketDetail {
            ticket: ticket.into(),
            user: user.map(Into::into),
            assigned_to,
            messages,
            flags,
        })
    }
    .await;

    match detail {
        Ok(detail) => (
            StatusCode::OK,
            Json(ApiResponse::success(detail, "Ticket retrieved successfully")),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load ticket detail");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to retrieve ticket")),
            )
                .into_response()
        }
    }
}

/// GET /admin/tickets/{ticket_id}/flags
///
/// Every escalation on a ticket, newest first.
pub async fn get_flags(
    State(app_state): State<AppState>,
    Path(ticket_id): Path<i64>,
    Extension(AuthStaff(claims)): Extension<AuthStaff>,
) -> impl IntoResponse {
    let db = app_state.db();

    if let Err(reply) = load_ticket_checked(db, ticket_id, &claims).await {
        return reply.into_response();
    }

    let flags = async {
        let mut out = Vec::new();
        for flag in FlagModel::find_for_ticket(db, ticket_id).await? {
            out.push(flag_response(db, flag).await?);
        }
        Ok::<_, sea_orm::DbErr>(out)
    }
    .await;

    match flags {
        Ok(flags) => (
            StatusCode::OK,
            Json(ApiResponse::success(flags, "Flags retrieved successfully")),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list flags");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to retrieve flags")),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FlaggedTicketResponse {
    #[serde(flatten)]
    pub summary: AdminTicketSummary,
    pub flagged_by: Option<super::common::AssigneeResponse>,
    pub flag_message: Option<String>,
    pub flagged_at: String,
}

/// GET /admin/tickets/flagged
///
/// The caller's escalation queue: unresolved flags targeting their role,
/// joined with ticket summaries and silently filtered by category
/// permission.
pub async fn get_flagged_tickets(
    State(app_state): State<AppState>,
    Extension(AuthStaff(claims)): Extension<AuthStaff>,
) -> impl IntoResponse {
    let db = app_state.db();

    let rows = match FlagModel::unresolved_for_role(db, claims.role).await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load escalation queue");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to retrieve flagged tickets")),
            )
                .into_response();
        }
    };

    let queue = async {
        let mut out = Vec::new();
        for (flag, ticket) in rows {
            if !permissions::can_access(claims.role, ticket.category) {
                continue;
            }
            let flagged_by = db::models::staff::Model::get_by_id(db, flag.flagged_by_id)
                .await?
                .map(Into::into);
            out.push(FlaggedTicketResponse {
                summary: summarize(db, ticket).await?,
                flagged_by,
                flag_message: flag.message,
                flagged_at: flag.created_at.to_rfc3339(),
            });
        }
        Ok::<_, sea_orm::DbErr>(out)
    }
    .await;

    match queue {
        Ok(queue) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                queue,
                "Flagged tickets retrieved successfully",
            )),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build escalation queue");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to retrieve flagged tickets")),
            )
                .into_response()
        }
    }
}

/// GET /admin/tickets/{ticket_id}/export
///
/// Downloads one ticket's transcript as a standalone HTML document.
pub async fn export_ticket(
    State(app_state): State<AppState>,
    Path(ticket_id): Path<i64>,
    Extension(AuthStaff(claims)): Extension<AuthStaff>,
) -> impl IntoResponse {
    let db = app_state.db();

    let ticket = match load_ticket_checked(db, ticket_id, &claims).await {
        Ok(t) => t,
        Err(reply) => return reply.into_response(),
    };
    let ticket_number = ticket.ticket_number;

    match load_transcript(db, ticket).await {
        Ok(data) => {
            let html = transcript::render(&data);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"ticket-{ticket_number}-transcript.html\""),
                    ),
                ],
                html,
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to build transcript");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to export ticket")),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub status: Option<String>,
}

/// GET /admin/tickets/export?status=open|closed|all
///
/// Zips one transcript per ticket across every category the caller can see
/// (broker-verified where applicable). An empty selection is an error, not
/// an empty archive.
///
/// ### Responses
/// - `200 OK` → `application/zip` download
/// - `400 Bad Request` → unknown status filter
/// - `404 Not Found` → no tickets matched
pub async fn export_tickets(
    State(app_state): State<AppState>,
    Extension(AuthStaff(claims)): Extension<AuthStaff>,
    Query(params): Query<ExportParams>,
) -> impl IntoResponse {
    let db = app_state.db();

    let (closed, label) = match params.status.as_deref() {
        None | Some("") | Some("all") => (None, "all"),
        Some("open") => (Some(false), "open"),
        Some("closed") => (Some(true), "closed"),
        Some(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<Empty>::error("Invalid status filter")),
            )
                .into_response();
        }
    };

    let is_broker = staff_broker_status(&claims).await;
    let categories = permissions::allowed_categories(claims.role, is_broker);

    let tickets = match TicketModel::find_in_categories(db, &categories, closed).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "Failed to collect tickets for export");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to export tickets")),
            )
                .into_response();
        }
    };

    if tickets.is_empty() {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Empty>::error("No tickets to export")),
        )
            .into_response();
    }

    let archive = async {
        let mut data = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            data.push(load_transcript(db, ticket).await?);
        }
        Ok::<_, sea_orm::DbErr>(data)
    }
    .await;

    let data = match archive {
        Ok(d) => d,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build transcripts for export");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to export tickets")),
            )
                .into_response();
        }
    };

    match transcript::export_archive(&data) {
        Ok(bytes) => {
            let date = chrono::Utc::now().format("%Y-%m-%d");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/zip".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"tickets-{label}-{date}.zip\""),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to write export archive");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to export tickets")),
            )
                .into_response()
        }
    }
}
