use crate::auth::StaffClaims;
use crate::auth::guards::{Empty, staff_can_access};
use crate::response::ApiResponse;
use crate::routes::tickets::common::TicketResponse;
use crate::services::transcript::{TranscriptAuthor, TranscriptData, TranscriptMessage};
use axum::{Json, http::StatusCode};
use db::models::ticket::Model as TicketModel;
use db::models::ticket_message::Model as MessageModel;
use db::models::{attachment, staff, ticket, ticket_flag, user};
use sea_orm::{DatabaseConnection, DbErr};
use serde::Serialize;
use std::collections::HashMap;

pub type ErrorReply = (StatusCode, Json<ApiResponse<Empty>>);

pub fn internal_error(message: &str) -> ErrorReply {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::error(message)),
    )
}

/// Loads a ticket and enforces the caller's category permission, with the
/// live broker check where the category demands it.
///
/// Absence and denial stay distinct: a missing ticket is 404, a real ticket
/// in a category the caller cannot act on is 403.
pub async fn load_ticket_checked(
    db: &DatabaseConnection,
    ticket_id: i64,
    claims: &StaffClaims,
) -> Result<ticket::Model, ErrorReply> {
    let ticket = TicketModel::get_by_id(db, ticket_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load ticket");
            internal_error("Failed to load ticket")
        })?
        .ok_or((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Ticket not found")),
        ))?;

    if !staff_can_access(claims, ticket.category).await {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("No permission for this category")),
        ));
    }

    Ok(ticket)
}

#[derive(Debug, Serialize, Default)]
pub struct TicketUserResponse {
    pub id: i64,
    pub discord_id: String,
    pub username: String,
    pub display_name: String,
    pub avatar: Option<String>,
}

impl From<user::Model> for TicketUserResponse {
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

#[derive(Debug, Serialize)]
pub struct AssigneeResponse {
    pub id: i64,
    pub name: String,
    pub role: String,
}

impl From<staff::Model> for AssigneeResponse {
    fn from(staff: staff::Model) -> Self {
        Self {
            id: staff.id,
            name: staff.display_name,
            role: staff.role.to_string(),
        }
    }
}

/// Listing entry for the dashboard: ticket plus owner, assignee and the most
/// recent message preview.
#[derive(Debug, Serialize)]
pub struct AdminTicketSummary {
    #[serde(flatten)]
    pub ticket: TicketResponse,
    pub user: Option<TicketUserResponse>,
    pub assigned_to: Option<AssigneeResponse>,
    pub last_message: Option<String>,
}

pub async fn summarize(
    db: &DatabaseConnection,
    ticket: ticket::Model,
) -> Result<AdminTicketSummary, DbErr> {
    let user = user::Model::get_by_id(db, ticket.user_id).await?;
    let assigned_to = match ticket.assigned_to {
        Some(id) => staff::Model::get_by_id(db, id).await?.map(Into::into),
        None => None,
    };
    let last_message = MessageModel::last_for_ticket(db, ticket.id)
        .await?
        .map(|m| m.content);

    Ok(AdminTicketSummary {
        ticket: ticket.into(),
        user: user.map(Into::into),
        assigned_to,
        last_message,
    })
}

#[derive(Debug, Serialize)]
pub struct FlagResponse {
    pub id: i64,
    pub ticket_id: i64,
    pub flagged_role: String,
    pub flagged_by: Option<AssigneeResponse>,
    pub message: Option<String>,
    pub resolved: bool,
    pub resolved_at: Option<String>,
    pub created_at: String,
}

pub async fn flag_response(
    db: &DatabaseConnection,
    flag: ticket_flag::Model,
) -> Result<FlagResponse, DbErr> {
    let flagged_by = staff::Model::get_by_id(db, flag.flagged_by_id)
        .await?
        .map(Into::into);

    Ok(FlagResponse {
        id: flag.id,
        ticket_id: flag.ticket_id,
        flagged_role: flag.flagged_role.to_string(),
        flagged_by,
        message: flag.message,
        resolved: flag.resolved,
        resolved_at: flag.resolved_at.map(|t| t.to_rfc3339()),
        created_at: flag.created_at.to_rfc3339(),
    })
}

/// Assembles everything the transcript renderer needs for one ticket,
/// internal notes included.
pub async fn load_transcript(
    db: &DatabaseConnection,
    ticket: ticket::Model,
) -> Result<TranscriptData, DbErr> {
    let user = user::Model::get_by_id(db, ticket.user_id)
        .await?
        .unwrap_or_else(|| placeholder_user(ticket.user_id));
    let assigned = match ticket.assigned_to {
        Some(id) => staff::Model::get_by_id(db, id).await?,
        None => None,
    };

    let mut staff_cache: HashMap<i64, Option<staff::Model>> = HashMap::new();
    let mut user_cache: HashMap<i64, Option<user::Model>> = HashMap::new();

    let raw = MessageModel::find_all_for_ticket(db, ticket.id, true).await?;
    let mut messages = Vec::with_capacity(raw.len());
    for message in raw {
        let author = if message.is_system {
            TranscriptAuthor::System
        } else if let Some(staff_id) = message.staff_id {
            if !staff_cache.contains_key(&staff_id) {
                staff_cache.insert(staff_id, staff::Model::get_by_id(db, staff_id).await?);
            }
            match staff_cache.get(&staff_id).and_then(|s| s.as_ref()) {
                Some(s) => TranscriptAuthor::Staff {
                    name: s.display_name.clone(),
                    role: s.role,
                },
                None => TranscriptAuthor::System,
            }
        } else if let Some(user_id) = message.user_id {
            if !user_cache.contains_key(&user_id) {
                user_cache.insert(user_id, user::Model::get_by_id(db, user_id).await?);
            }
            match user_cache.get(&user_id).and_then(|u| u.as_ref()) {
                Some(u) => TranscriptAuthor::User(u.display_name.clone()),
                None => TranscriptAuthor::System,
            }
        } else {
            TranscriptAuthor::System
        };

        let attachments = attachment::Model::find_for_message(db, message.id).await?;
        messages.push(TranscriptMessage {
            message,
            author,
            attachments,
        });
    }

    Ok(TranscriptData {
        ticket,
        user,
        assigned,
        messages,
    })
}

fn placeholder_user(user_id: i64) -> user::Model {
    let epoch = chrono::DateTime::<chrono::Utc>::UNIX_EPOCH;
    user::Model {
        id: user_id,
        discord_id: String::new(),
        username: "unknown".into(),
        display_name: "Unknown user".into(),
        avatar: None,
        email: None,
        created_at: epoch,
        updated_at: epoch,
    }
}
