use db::models::{attachment, staff, ticket, ticket_message, user};
use sea_orm::{DatabaseConnection, DbErr};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Serialize, Default)]
pub struct TicketResponse {
    pub id: i64,
    pub ticket_number: i64,
    pub category: String,
    pub subject: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub closed_at: Option<String>,
    pub closed_reason: Option<String>,
}

impl From<ticket::Model> for TicketResponse {
    fn from(ticket: ticket::Model) -> Self {
        Self {
            id: ticket.id,
            ticket_number: ticket.ticket_number,
            category: ticket.category.to_string(),
            subject: ticket.subject,
            status: ticket.status.to_string(),
            created_at: ticket.created_at.to_rfc3339(),
            updated_at: ticket.updated_at.to_rfc3339(),
            closed_at: ticket.closed_at.map(|t| t.to_rfc3339()),
            closed_reason: ticket.closed_reason,
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct AttachmentResponse {
    pub id: i64,
    pub url: String,
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
}

impl From<attachment::Model> for AttachmentResponse {
    fn from(att: attachment::Model) -> Self {
        Self {
            id: att.id,
            url: att.url,
            filename: att.filename,
            mime_type: att.mime_type,
            size: att.size,
        }
    }
}

/// Who wrote a message, resolved for display.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageAuthor {
    User {
        name: String,
        avatar: Option<String>,
    },
    Staff {
        name: String,
        role: String,
    },
    System,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: i64,
    pub content: String,
    pub staff_only: bool,
    pub author: MessageAuthor,
    pub attachments: Vec<AttachmentResponse>,
    pub created_at: String,
}

/// Resolves author identities and attachments for a batch of messages,
/// loading each referenced user/staff row once.
pub async fn message_responses(
    db: &DatabaseConnection,
    messages: Vec<ticket_message::Model>,
) -> Result<Vec<MessageResponse>, DbErr> {
    let mut users: HashMap<i64, Option<user::Model>> = HashMap::new();
    let mut staff: HashMap<i64, Option<staff::Model>> = HashMap::new();

    let mut out = Vec::with_capacity(messages.len());
    for message in messages {
        let author = if message.is_system {
            MessageAuthor::System
        } else if let Some(staff_id) = message.staff_id {
            if !staff.contains_key(&staff_id) {
                staff.insert(staff_id, staff::Model::get_by_id(db, staff_id).await?);
            }
            match staff.get(&staff_id).and_then(|s| s.as_ref()) {
                Some(s) => MessageAuthor::Staff {
                    name: s.display_name.clone(),
                    role: s.role.label().to_string(),
                },
                None => MessageAuthor::System,
            }
        } else if let Some(user_id) = message.user_id {
            if !users.contains_key(&user_id) {
                users.insert(user_id, user::Model::get_by_id(db, user_id).await?);
            }
            match users.get(&user_id).and_then(|u| u.as_ref()) {
                Some(u) => MessageAuthor::User {
                    name: u.display_name.clone(),
                    avatar: u.avatar.clone(),
                },
                None => MessageAuthor::System,
            }
        } else {
            MessageAuthor::System
        };

        let attachments = attachment::Model::find_for_message(db, message.id)
            .await?
            .into_iter()
            .map(AttachmentResponse::from)
            .collect();

        out.push(MessageResponse {
            id: message.id,
            content: message.content,
            staff_only: message.staff_only,
            author,
            attachments,
            created_at: message.created_at.to_rfc3339(),
        });
    }

    Ok(out)
}
