use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use sea_orm::ActiveValue::Set;
use sea_orm::DeriveActiveEnum;
use sea_orm::QueryFilter;
use sea_orm::QueryOrder;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A staff member.
///
/// Two credential strategies share this table: password accounts carry an
/// argon2 `password_hash` and keep the role stored here, while Discord OAuth
/// accounts carry a `discord_id` and have their role re-resolved from guild
/// membership on every login (the row is refreshed to match).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "staff")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub username: String,
    pub display_name: String,
    pub role: StaffRole,
    pub active: bool,
    pub avatar: Option<String>,

    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub discord_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "staff_role")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StaffRole {
    #[sea_orm(string_value = "helper")]
    Helper,

    #[sea_orm(string_value = "support")]
    Support,

    #[sea_orm(string_value = "moderator")]
    Moderator,

    #[sea_orm(string_value = "coordinator")]
    Coordinator,

    #[sea_orm(string_value = "community_manager")]
    CommunityManager,

    #[sea_orm(string_value = "dev")]
    Dev,

    #[sea_orm(string_value = "ceo")]
    Ceo,
}

impl StaffRole {
    /// Human label for transcripts and notifications.
    pub fn label(&self) -> &'static str {
        match self {
            StaffRole::Helper => "Helper",
            StaffRole::Support => "Support",
            StaffRole::Moderator => "Moderator",
            StaffRole::Coordinator => "Coordinator",
            StaffRole::CommunityManager => "Community Manager",
            StaffRole::Dev => "Developer",
            StaffRole::Ceo => "CEO",
        }
    }
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
    /// Creates a password-credentialed staff account.
    pub async fn create_with_password(
        db: &DbConn,
        username: &str,
        display_name: &str,
        role: StaffRole,
        password: &str,
    ) -> Result<Model, DbErr> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| DbErr::Custom(format!("Failed to hash password: {e}")))?
            .to_string();

        let now = Utc::now();
        let active_model = ActiveModel {
            username: Set(username.to_owned()),
            display_name: Set(display_name.to_owned()),
            role: Set(role),
            active: Set(true),
            password_hash: Set(Some(hash)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        active_model.insert(db).await
    }

    /// Verifies username/password against an active staff row.
    ///
    /// Returns `None` for unknown usernames, inactive accounts, accounts
    /// without a password credential, and wrong passwords alike.
    pub async fn verify_credentials(
        db: &DbConn,
        username: &str,
        password: &str,
    ) -> Result<Option<Model>, DbErr> {
        let staff = Entity::find()
            .filter(Column::Username.eq(username))
            .filter(Column::Active.eq(true))
            .one(db)
            .await?;

        let Some(staff) = staff else {
            return Ok(None);
        };
        let Some(stored) = staff.password_hash.as_deref() else {
            return Ok(None);
        };

        let parsed = match PasswordHash::new(stored) {
            Ok(p) => p,
            Err(_) => return Ok(None),
        };

        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
        {
            Ok(Some(staff))
        } else {
            Ok(None)
        }
    }

    /// Creates or refreshes the row for a Discord-authenticated staff member.
    ///
    /// The role is the one freshly resolved from guild membership; storing it
    /// keeps foreign keys meaningful, while the login flow remains the
    /// authority on what role the session carries.
    pub async fn upsert_from_discord(
        db: &DbConn,
        discord_id: &str,
        username: &str,
        display_name: &str,
        role: StaffRole,
        avatar: Option<&str>,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();

        let existing = Entity::find()
            .filter(Column::DiscordId.eq(discord_id))
            .one(db)
            .await?;

        match existing {
            Some(staff) => {
                let mut active: ActiveModel = staff.into();
                active.username = Set(username.to_owned());
                active.display_name = Set(display_name.to_owned());
                active.role = Set(role);
                active.avatar = Set(avatar.map(str::to_owned));
                active.updated_at = Set(now);
                active.update(db).await
            }
            None => {
                let active = ActiveModel {
                    username: Set(username.to_owned()),
                    display_name: Set(display_name.to_owned()),
                    role: Set(role),
                    active: Set(true),
                    avatar: Set(avatar.map(str::to_owned)),
                    discord_id: Set(Some(discord_id.to_owned())),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                active.insert(db).await
            }
        }
    }

    pub async fn get_by_id(db: &DbConn, staff_id: i64) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(staff_id).one(db).await
    }

    /// All active staff, ordered by display name.
    pub async fn find_active(db: &DbConn) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::Active.eq(true))
            .order_by_asc(Column::DisplayName)
            .all(db)
            .await
    }
}
