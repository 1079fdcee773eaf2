use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::DeriveActiveEnum;
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// Default reason recorded when staff close a ticket without giving one.
pub const DEFAULT_CLOSED_REASON: &str = "Closed by staff";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Sequential human-facing number, independent of the row id.
    pub ticket_number: i64,

    pub category: TicketCategory,
    pub subject: String,
    pub status: TicketStatus,

    pub user_id: i64,
    pub assigned_to: Option<i64>,

    /// `Some(true)` while the ticket is active, `None` once closed. Takes
    /// part in the unique `(user_id, category, open_slot)` index: NULLs never
    /// collide, so the storage layer admits at most one active ticket per
    /// user per category while closed tickets stack freely.
    #[serde(skip_serializing)]
    pub open_slot: Option<bool>,

    pub closed_at: Option<DateTime<Utc>>,
    pub closed_reason: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "ticket_status")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TicketStatus {
    #[sea_orm(string_value = "open")]
    Open,

    #[sea_orm(string_value = "in_progress")]
    InProgress,

    #[sea_orm(string_value = "awaiting_reply")]
    AwaitingReply,

    #[sea_orm(string_value = "closed")]
    Closed,
}

impl TicketStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::AwaitingReply => "Awaiting Reply",
            TicketStatus::Closed => "Closed",
        }
    }
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
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "ticket_category")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TicketCategory {
    #[sea_orm(string_value = "support")]
    Support,

    #[sea_orm(string_value = "bugs")]
    Bugs,

    #[sea_orm(string_value = "reports")]
    Reports,

    #[sea_orm(string_value = "donations")]
    Donations,

    #[sea_orm(string_value = "boost")]
    Boost,

    #[sea_orm(string_value = "housing")]
    Housing,

    #[sea_orm(string_value = "review")]
    Review,
}

impl TicketCategory {
    pub fn label(&self) -> &'static str {
        match self {
            TicketCategory::Support => "Support",
            TicketCategory::Bugs => "Bug Reports",
            TicketCategory::Reports => "Reports",
            TicketCategory::Donations => "Donations",
            TicketCategory::Boost => "Boost",
            TicketCategory::Housing => "Housing",
            TicketCategory::Review => "Review",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            TicketCategory::Support => "📁",
            TicketCategory::Bugs => "🐛",
            TicketCategory::Reports => "⚠️",
            TicketCategory::Donations => "💎",
            TicketCategory::Boost => "🚀",
            TicketCategory::Housing => "🏠",
            TicketCategory::Review => "🔍",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TicketCategory::Support => "Technical support and general help",
            TicketCategory::Bugs => "Report errors and technical problems",
            TicketCategory::Reports => "Report infractions and conduct issues",
            TicketCategory::Donations => "Donation-related matters",
            TicketCategory::Boost => "Support for server boosters",
            TicketCategory::Housing => "Housing and property matters",
            TicketCategory::Review => "Request review of decisions and penalties",
        }
    }
}

/// Lifecycle violations surfaced to the HTTP layer.
#[derive(Debug, Error)]
pub enum TicketError {
    #[error("Ticket not found")]
    NotFound,

    #[error(
        "You already have an active ticket in the \"{}\" category. Close it before opening another one.",
        .0.label()
    )]
    DuplicateActive(TicketCategory),

    #[error("Ticket is closed")]
    Closed,

    #[error("Ticket is already closed")]
    AlreadyClosed,

    #[error("Message must have content or at least one attachment")]
    EmptyMessage,

    #[error(transparent)]
    Db(#[from] DbErr),
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::staff::Entity",
        from = "Column::AssignedTo",
        to = "super::staff::Column::Id"
    )]
    AssignedStaff,

    #[sea_orm(has_many = "super::ticket_message::Entity")]
    TicketMessage,

    #[sea_orm(has_many = "super::ticket_flag::Entity")]
    TicketFlag,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::staff::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssignedStaff.def()
    }
}

impl Related<super::ticket_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TicketMessage.def()
    }
}

impl Related<super::ticket_flag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TicketFlag.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn is_unique_violation(err: &DbErr) -> bool {
    err.to_string().contains("UNIQUE")
}

impl Model {
    /// Opens a new ticket.
    ///
    /// The duplicate pre-check and the sequential number assignment run in
    /// one transaction; the unique open-slot index is the backstop for
    /// concurrent creations, so a losing racer also surfaces as
    /// [`TicketError::DuplicateActive`].
    pub async fn create(
        db: &DbConn,
        user_id: i64,
        category: TicketCategory,
        subject: &str,
    ) -> Result<Model, TicketError> {
        let txn = db.begin().await?;

        if Self::find_active_for_user(&txn, user_id, category)
            .await?
            .is_some()
        {
            return Err(TicketError::DuplicateActive(category));
        }

        let max_number: Option<i64> = Entity::find()
            .select_only()
            .column_as(Column::TicketNumber.max(), "max_number")
            .into_tuple()
            .one(&txn)
            .await?
            .flatten();

        let now = Utc::now();
        let active_model = ActiveModel {
            ticket_number: Set(max_number.unwrap_or(0) + 1),
            category: Set(category),
            subject: Set(subject.to_owned()),
            status: Set(TicketStatus::Open),
            user_id: Set(user_id),
            open_slot: Set(Some(true)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let ticket = match active_model.insert(&txn).await {
            Ok(t) => t,
            Err(e) if is_unique_violation(&e) => {
                return Err(TicketError::DuplicateActive(category));
            }
            Err(e) => return Err(e.into()),
        };

        txn.commit().await?;
        Ok(ticket)
    }

    pub async fn get_by_id<C: ConnectionTrait>(
        db: &C,
        ticket_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(ticket_id).one(db).await
    }

    async fn require<C: ConnectionTrait>(db: &C, ticket_id: i64) -> Result<Model, TicketError> {
        Self::get_by_id(db, ticket_id)
            .await?
            .ok_or(TicketError::NotFound)
    }

    /// The user's active (non-closed) ticket in a category, if any.
    pub async fn find_active_for_user<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        category: TicketCategory,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::Category.eq(category))
            .filter(Column::Status.ne(TicketStatus::Closed))
            .one(db)
            .await
    }

    /// All of a user's tickets, newest activity first.
    pub async fn find_for_user(
        db: &DbConn,
        user_id: i64,
        status: Option<TicketStatus>,
    ) -> Result<Vec<Model>, DbErr> {
        let mut query = Entity::find().filter(Column::UserId.eq(user_id));
        if let Some(status) = status {
            query = query.filter(Column::Status.eq(status));
        }
        query.order_by_desc(Column::UpdatedAt).all(db).await
    }

    /// Staff listing with optional status/category filters and a
    /// case-insensitive subject search.
    pub async fn find_filtered(
        db: &DbConn,
        status: Option<TicketStatus>,
        category: Option<TicketCategory>,
        query: Option<&str>,
    ) -> Result<Vec<Model>, DbErr> {
        let mut condition = Condition::all();
        if let Some(status) = status {
            condition = condition.add(Column::Status.eq(status));
        }
        if let Some(category) = category {
            condition = condition.add(Column::Category.eq(category));
        }
        if let Some(q) = query {
            let pattern = format!("%{}%", q.to_lowercase());
            condition = condition.add(migration::Expr::cust("LOWER(subject)").like(&pattern));
        }

        Entity::find()
            .filter(condition)
            .order_by_asc(Column::Status)
            .order_by_desc(Column::UpdatedAt)
            .all(db)
            .await
    }

    /// Tickets in the given categories, optionally restricted to
    /// open-ish/closed, in ticket-number order. Used by the batch exporter.
    pub async fn find_in_categories(
        db: &DbConn,
        categories: &[TicketCategory],
        closed: Option<bool>,
    ) -> Result<Vec<Model>, DbErr> {
        let mut query = Entity::find()
            .filter(Column::Category.is_in(categories.iter().copied()));
        match closed {
            Some(true) => query = query.filter(Column::Status.eq(TicketStatus::Closed)),
            Some(false) => query = query.filter(Column::Status.ne(TicketStatus::Closed)),
            None => {}
        }
        query.order_by_asc(Column::TicketNumber).all(db).await
    }

    pub async fn is_owner(db: &DbConn, ticket_id: i64, user_id: i64) -> bool {
        match Self::get_by_id(db, ticket_id).await {
            Ok(Some(t)) => t.user_id == user_id,
            _ => false,
        }
    }

    /// A user replied: the ticket goes back to waiting on staff.
    ///
    /// Closed tickets reject the message outright.
    pub async fn record_user_reply(db: &DbConn, ticket_id: i64) -> Result<Model, TicketError> {
        let ticket = Self::require(db, ticket_id).await?;
        if ticket.status == TicketStatus::Closed {
            return Err(TicketError::Closed);
        }

        let mut active: ActiveModel = ticket.into();
        active.status = Set(TicketStatus::AwaitingReply);
        active.updated_at = Set(Utc::now());
        Ok(active.update(db).await?)
    }

    /// Staff replied: the ticket moves to in-progress, and an unassigned
    /// ticket is claimed by the responder. Concurrent first responders race
    /// last-write-wins; assignment is advisory, not authorization-bearing.
    pub async fn record_staff_reply(
        db: &DbConn,
        ticket_id: i64,
        staff_id: i64,
    ) -> Result<Model, TicketError> {
        let ticket = Self::require(db, ticket_id).await?;
        if ticket.status == TicketStatus::Closed {
            return Err(TicketError::Closed);
        }

        let assigned = ticket.assigned_to;
        let mut active: ActiveModel = ticket.into();
        active.status = Set(TicketStatus::InProgress);
        active.assigned_to = Set(Some(assigned.unwrap_or(staff_id)));
        active.updated_at = Set(Utc::now());
        Ok(active.update(db).await?)
    }

    /// Closes the ticket, freeing its open slot.
    ///
    /// Closing an already-closed ticket is rejected so the closure side
    /// effects (system message, notification) can never run twice.
    pub async fn close(
        db: &DbConn,
        ticket_id: i64,
        reason: Option<&str>,
    ) -> Result<Model, TicketError> {
        let ticket = Self::require(db, ticket_id).await?;
        if ticket.status == TicketStatus::Closed {
            return Err(TicketError::AlreadyClosed);
        }

        let now = Utc::now();
        let mut active: ActiveModel = ticket.into();
        active.status = Set(TicketStatus::Closed);
        active.open_slot = Set(None);
        active.closed_at = Set(Some(now));
        active.closed_reason = Set(Some(
            reason.unwrap_or(DEFAULT_CLOSED_REASON).to_owned(),
        ));
        active.updated_at = Set(now);
        Ok(active.update(db).await?)
    }

    /// Moves the ticket to another category. Status is left untouched.
    ///
    /// The caller re-validates permission against the destination category
    /// before invoking this. If the owner already has an active ticket there,
    /// the unique open-slot index rejects the move as a duplicate.
    pub async fn change_category(
        db: &DbConn,
        ticket_id: i64,
        category: TicketCategory,
    ) -> Result<Model, TicketError> {
        let ticket = Self::require(db, ticket_id).await?;
        if ticket.status == TicketStatus::Closed {
            return Err(TicketError::Closed);
        }

        let mut active: ActiveModel = ticket.into();
        active.category = Set(category);
        active.updated_at = Set(Utc::now());
        match active.update(db).await {
            Ok(t) => Ok(t),
            Err(e) if is_unique_violation(&e) => Err(TicketError::DuplicateActive(category)),
            Err(e) => Err(e.into()),
        }
    }

    /// Manual claim. A freshly opened ticket moves to in-progress; a ticket
    /// already further along keeps its status.
    pub async fn claim(db: &DbConn, ticket_id: i64, staff_id: i64) -> Result<Model, TicketError> {
        let ticket = Self::require(db, ticket_id).await?;
        if ticket.status == TicketStatus::Closed {
            return Err(TicketError::Closed);
        }

        let status = ticket.status;
        let mut active: ActiveModel = ticket.into();
        active.assigned_to = Set(Some(staff_id));
        if status == TicketStatus::Open {
            active.status = Set(TicketStatus::InProgress);
        }
        active.updated_at = Set(Utc::now());
        Ok(active.update(db).await?)
    }

    /// Explicit status override from the dashboard, for the non-terminal
    /// states. Closing goes through [`Model::close`] so the closure side
    /// effects always run, and closed tickets stay closed.
    pub async fn set_status(
        db: &DbConn,
        ticket_id: i64,
        status: TicketStatus,
    ) -> Result<Model, TicketError> {
        debug_assert_ne!(status, TicketStatus::Closed);

        let ticket = Self::require(db, ticket_id).await?;
        if ticket.status == TicketStatus::Closed {
            return Err(TicketError::Closed);
        }

        let mut active: ActiveModel = ticket.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        Ok(active.update(db).await?)
    }

    pub async fn set_subject(
        db: &DbConn,
        ticket_id: i64,
        subject: &str,
    ) -> Result<Model, TicketError> {
        let ticket = Self::require(db, ticket_id).await?;

        let mut active: ActiveModel = ticket.into();
        active.subject = Set(subject.to_owned());
        active.updated_at = Set(Utc::now());
        Ok(active.update(db).await?)
    }
}
