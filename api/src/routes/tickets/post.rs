use crate::auth::AuthUser;
use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use crate::routes::tickets::common::{MessageResponse, TicketResponse, message_responses};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use db::models::ticket::{Model as TicketModel, TicketCategory, TicketError};
use db::models::ticket_message::{Model as MessageModel, NewAttachment};
use serde::{Deserialize, Serialize};
use util::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub category: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct CreatedTicketResponse {
    pub ticket: TicketResponse,
    pub messages: Vec<MessageResponse>,
}

/// POST /tickets
///
/// Opens a ticket with its initial message. One active ticket per category
/// per user: a second one is refused until the first is closed.
///
/// ### Request body
/// ```json
/// { "category": "bugs", "subject": "Crash on login", "message": "It happens every time..." }
/// ```
///
/// ### Responses
/// - `201 Created` → `{ ticket, messages }`
/// - `400 Bad Request` → missing field or unknown category
/// - `409 Conflict` → an active ticket already exists in that category
pub async fn create_ticket(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(req): Json<CreateTicketRequest>,
) -> impl IntoResponse {
    let db = app_state.db();

    let (Some(category), Some(subject), Some(message)) = (
        req.category.filter(|s| !s.trim().is_empty()),
        req.subject.filter(|s| !s.trim().is_empty()),
        req.message.filter(|s| !s.trim().is_empty()),
    ) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error(
                "Category, subject and message are required",
            )),
        )
            .into_response();
    };

    let Ok(category) = category.parse::<TicketCategory>() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error("Invalid category")),
        )
            .into_response();
    };

    let ticket = match TicketModel::create(db, claims.sub, category, subject.trim()).await {
        Ok(t) => t,
        Err(e @ TicketError::DuplicateActive(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::<Empty>::error(e.to_string())),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create ticket");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to create ticket")),
            )
                .into_response();
        }
    };

    let created = async {
        MessageModel::create_from_user(db, ticket.id, claims.sub, &message, &[]).await?;
        let messages = MessageModel::find_all_for_ticket(db, ticket.id, false).await?;
        let messages = message_responses(db, messages).await?;
        Ok::<_, TicketError>(CreatedTicketResponse {
            ticket: ticket.into(),
            messages,
        })
    }
    .await;

    match created {
        Ok(response) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(response, "Ticket created successfully")),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to store initial message");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to create ticket")),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub content: Option<String>,
    #[serde(default)]
    pub attachments: Vec<NewAttachment>,
}

/// POST /tickets/{ticket_id}/messages
///
/// Appends a message (and any uploaded attachments) to the caller's own
/// ticket, moving it back to awaiting-reply. Closed tickets refuse new
/// messages outright.
///
/// ### Responses
/// - `201 Created` → the stored message
/// - `400 Bad Request` → neither content nor attachments given
/// - `404 Not Found` → no such ticket, or not the caller's
/// - `409 Conflict` → the ticket is closed
pub async fn post_message(
    State(app_state): State<AppState>,
    Path(ticket_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(req): Json<PostMessageRequest>,
) -> impl IntoResponse {
    let db = app_state.db();

    let ticket = match TicketModel::get_by_id(db, ticket_id).await {
        Ok(Some(t)) if t.user_id == claims.sub => t,
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
                Json(ApiResponse::<Empty>::error("Failed to send message")),
            )
                .into_response();
        }
    };

    if ticket.status == db::models::ticket::TicketStatus::Closed {
        return (
            StatusCode::CONFLICT,
            Json(ApiResponse::<Empty>::error(
                "This ticket is closed. Open a new one if you still need help.",
            )),
        )
            .into_response();
    }

    let content = req.content.unwrap_or_default();
    let message =
        match MessageModel::create_from_user(db, ticket.id, claims.sub, &content, &req.attachments)
            .await
        {
            Ok((m, _)) => m,
            Err(e @ TicketError::EmptyMessage) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::<Empty>::error(e.to_string())),
                )
                    .into_response();
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to store message");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::<Empty>::error("Failed to send message")),
                )
                    .into_response();
            }
        };

    match TicketModel::record_user_reply(db, ticket.id).await {
        Ok(_) => {}
        Err(TicketError::Closed) => {
            // Lost a race with a close; the message stands, the status does not change.
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to update ticket after message");
        }
    }

    let response = match message_responses(db, vec![message]).await {
        Ok(mut responses) => responses.pop(),
        Err(_) => None,
    };

    match response {
        Some(message) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(message, "Message sent successfully")),
        )
            .into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<Empty>::error("Failed to send message")),
        )
            .into_response(),
    }
}
