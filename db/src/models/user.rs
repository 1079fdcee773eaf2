use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::QueryFilter;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An end user, identified by their Discord account.
///
/// Rows are upserted on every successful OAuth login so the stored identity
/// (username, server nickname, avatar) tracks Discord.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub discord_id: String,
    pub username: String,
    pub display_name: String,
    pub avatar: Option<String>,
    pub email: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ticket::Entity")]
    Ticket,
}

impl Related<super::ticket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ticket.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Creates or refreshes the row for a Discord account.
    pub async fn upsert_from_discord(
        db: &DbConn,
        discord_id: &str,
        username: &str,
        display_name: &str,
        avatar: Option<&str>,
        email: Option<&str>,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();

        match Self::find_by_discord_id(db, discord_id).await? {
            Some(existing) => {
                let mut active: ActiveModel = existing.into();
                active.username = Set(username.to_owned());
                active.display_name = Set(display_name.to_owned());
                active.avatar = Set(avatar.map(str::to_owned));
                active.email = Set(email.map(str::to_owned));
                active.updated_at = Set(now);
                active.update(db).await
            }
            None => {
                let active = ActiveModel {
                    discord_id: Set(discord_id.to_owned()),
                    username: Set(username.to_owned()),
                    display_name: Set(display_name.to_owned()),
                    avatar: Set(avatar.map(str::to_owned)),
                    email: Set(email.map(str::to_owned)),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                active.insert(db).await
            }
        }
    }

    pub async fn find_by_discord_id(
        db: &DbConn,
        discord_id: &str,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::DiscordId.eq(discord_id))
            .one(db)
            .await
    }

    pub async fn get_by_id(db: &DbConn, user_id: i64) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(user_id).one(db).await
    }
}
