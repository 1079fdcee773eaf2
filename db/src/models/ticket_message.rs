use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait};
use serde::{Deserialize, Serialize};

use super::attachment;
use super::ticket::TicketError;

/// A single message in a ticket's history.
///
/// Exactly one author field is populated: `user_id` for the ticket owner,
/// `staff_id` for staff replies, neither when `is_system` is set. Staff-only
/// messages are internal notes never shown to the end user.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ticket_messages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub ticket_id: i64,
    pub user_id: Option<i64>,
    pub staff_id: Option<i64>,
    pub is_system: bool,
    pub staff_only: bool,

    pub content: String,

    pub created_at: DateTime<Utc>,
}

/// Attachment payload accepted alongside a new message.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAttachment {
    pub url: String,
    pub filename: String,
    pub mime_type: String,
    #[serde(default)]
    pub size: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ticket::Entity",
        from = "Column::TicketId",
        to = "super::ticket::Column::Id"
    )]
    Ticket,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::staff::Entity",
        from = "Column::StaffId",
        to = "super::staff::Column::Id"
    )]
    Staff,

    #[sea_orm(has_many = "super::attachment::Entity")]
    Attachment,
}

impl Related<super::ticket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ticket.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::staff::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Staff.def()
    }
}

impl Related<super::attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Creates a message from the ticket owner, with its attachments, in one
    /// transaction. Empty content with no attachments is rejected.
    pub async fn create_from_user(
        db: &DbConn,
        ticket_id: i64,
        user_id: i64,
        content: &str,
        attachments: &[NewAttachment],
    ) -> Result<(Model, Vec<attachment::Model>), TicketError> {
        let content = content.trim();
        if content.is_empty() && attachments.is_empty() {
            return Err(TicketError::EmptyMessage);
        }

        let txn = db.begin().await?;

        let message = ActiveModel {
            ticket_id: Set(ticket_id),
            user_id: Set(Some(user_id)),
            content: Set(content.to_owned()),
            is_system: Set(false),
            staff_only: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut saved = Vec::with_capacity(attachments.len());
        for att in attachments {
            saved.push(attachment::Model::create(&txn, message.id, att).await?);
        }

        txn.commit().await?;
        Ok((message, saved))
    }

    /// Creates a staff reply. Staff messages always carry content.
    pub async fn create_from_staff(
        db: &DbConn,
        ticket_id: i64,
        staff_id: i64,
        content: &str,
        staff_only: bool,
    ) -> Result<Model, TicketError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(TicketError::EmptyMessage);
        }

        let active = ActiveModel {
            ticket_id: Set(ticket_id),
            staff_id: Set(Some(staff_id)),
            content: Set(content.to_owned()),
            is_system: Set(false),
            staff_only: Set(staff_only),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        Ok(active.insert(db).await?)
    }

    /// Appends a system-generated notice (closure, category change, flag, ...).
    pub async fn create_system(
        db: &DbConn,
        ticket_id: i64,
        content: &str,
    ) -> Result<Model, DbErr> {
        let active = ActiveModel {
            ticket_id: Set(ticket_id),
            content: Set(content.to_owned()),
            is_system: Set(true),
            staff_only: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        active.insert(db).await
    }

    /// Full history in creation order.
    pub async fn find_all_for_ticket(
        db: &DbConn,
        ticket_id: i64,
        include_staff_only: bool,
    ) -> Result<Vec<Model>, DbErr> {
        let mut query = Entity::find().filter(Column::TicketId.eq(ticket_id));
        if !include_staff_only {
            query = query.filter(Column::StaffOnly.eq(false));
        }
        query
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    /// Most recent message, for listing previews.
    pub async fn last_for_ticket(db: &DbConn, ticket_id: i64) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::TicketId.eq(ticket_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .one(db)
            .await
    }

    /// Most recent user-visible message, for the end-user listing preview.
    pub async fn last_visible_for_ticket(
        db: &DbConn,
        ticket_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::TicketId.eq(ticket_id))
            .filter(Column::StaffOnly.eq(false))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .one(db)
            .await
    }
}
