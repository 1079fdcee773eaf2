use crate::auth::AuthUser;
use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use crate::routes::tickets::common::{MessageResponse, TicketResponse, message_responses};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use db::models::ticket::{Model as TicketModel, TicketStatus};
use db::models::ticket_flag::Model as FlagModel;
use db::models::ticket_message::Model as MessageModel;
use db::models::{staff, ticket};
use serde::{Deserialize, Serialize};
use util::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TicketSummaryResponse {
    #[serde(flatten)]
    pub ticket: TicketResponse,
    pub assigned_to: Option<String>,
    pub last_message: Option<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct TicketDetailResponse {
    pub ticket: TicketResponse,
    pub assigned_to: Option<String>,
    pub messages: Vec<MessageResponse>,
    pub is_flagged: bool,
}

/// GET /tickets
///
/// The caller's own tickets, newest activity first, with the assignee name
/// and a preview of the latest visible message.
///
/// ### Query parameters
/// - `status` (optional) → filter by ticket status
///
/// ### Responses
/// - `200 OK` → list of ticket summaries
/// - `400 Bad Request` → unknown status value
pub async fn get_tickets(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
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

    let tickets = match TicketModel::find_for_user(db, claims.sub, status).await {
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

    let mut summaries = Vec::with_capacity(tickets.len());
    for ticket in tickets {
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

async fn summarize(
    db: &sea_orm::DatabaseConnection,
    ticket: ticket::Model,
) -> Result<TicketSummaryResponse, sea_orm::DbErr> {
    let assigned_to = match ticket.assigned_to {
        Some(id) => staff::Model::get_by_id(db, id).await?.map(|s| s.display_name),
        None => None,
    };
    let last_message = MessageModel::last_visible_for_ticket(db, ticket.id)
        .await?
        .map(|m| m.content);

    Ok(TicketSummaryResponse {
        ticket: ticket.into(),
        assigned_to,
        last_message,
    })
}

/// GET /tickets/{ticket_id}
///
/// One of the caller's own tickets with its full visible history. Internal
/// staff notes are excluded, and active escalations surface only as a
/// boolean.
///
/// ### Responses
/// - `200 OK` → `{ ticket, assigned_to, messages, is_flagged }`
/// - `404 Not Found` → no such ticket, or it belongs to someone else
pub async fn get_ticket(
    State(app_state): State<AppState>,
    Path(ticket_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> impl IntoResponse {
    let db = app_state.db();

    let ticket = match TicketModel::get_by_id(db, ticket_id).await {
        Ok(Some(t)) if t.user_id == claims.sub => t,
        // Someone else's ticket reads as absent, not forbidden.
        Ok(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<Empty>::error("Ticket not found")),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load ticket");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to retrieve ticket")),
            )
                .into_response();
        }
    };

    let detail = async {
        let assigned_to = match ticket.assigned_to {
            Some(id) => staff::Model::get_by_id(db, id).await?.map(|s| s.display_name),
            None => None,
        };
        let messages = MessageModel::find_all_for_ticket(db, ticket.id, false).await?;
        let messages = message_responses(db, messages).await?;
        let flags = FlagModel::unresolved_count_for_ticket(db, ticket.id).await?;

        Ok::<_, sea_orm::DbErr>(TicketDetailResponse {
            ticket: ticket.into(),
            assigned_to,
            messages,
            is_flagged: flags > 0,
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
