use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{ConnectionTrait, QueryFilter};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::ticket_message::NewAttachment;

/// A file attached to a message. The binary lives on the external image
/// host; only the public URL and metadata are stored here. Attachments are
/// owned by their message and removed with it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attachments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub message_id: i64,

    pub url: String,
    pub filename: String,
    pub mime_type: String,
    /// Best effort; zero when the host did not report one.
    pub size: i64,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ticket_message::Entity",
        from = "Column::MessageId",
        to = "super::ticket_message::Column::Id"
    )]
    TicketMessage,
}

impl Related<super::ticket_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TicketMessage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        message_id: i64,
        att: &NewAttachment,
    ) -> Result<Model, DbErr> {
        let active = ActiveModel {
            message_id: Set(message_id),
            url: Set(att.url.clone()),
            filename: Set(att.filename.clone()),
            mime_type: Set(att.mime_type.clone()),
            size: Set(att.size),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        active.insert(db).await
    }

    pub async fn find_for_message(db: &DbConn, message_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::MessageId.eq(message_id))
            .all(db)
            .await
    }
}
