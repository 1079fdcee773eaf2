use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};

use super::staff::StaffRole;
use super::ticket;

/// An escalation routing a ticket to the attention of a whole role.
///
/// At most one flag exists per (ticket, role); re-flagging the same role
/// refreshes the note and reopens a resolved escalation instead of creating
/// a duplicate. Flags are never deleted, only marked resolved.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ticket_flags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub ticket_id: i64,
    pub flagged_role: StaffRole,
    pub flagged_by_id: i64,

    pub message: Option<String>,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
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
        belongs_to = "super::staff::Entity",
        from = "Column::FlaggedById",
        to = "super::staff::Column::Id"
    )]
    FlaggedBy,
}

impl Related<super::ticket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ticket.def()
    }
}

impl Related<super::staff::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FlaggedBy.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Creates or refreshes the escalation for (ticket, role).
    ///
    /// A refresh overwrites the note and flagger, stamps a new creation
    /// time, and clears any prior resolution.
    pub async fn upsert(
        db: &DbConn,
        ticket_id: i64,
        role: StaffRole,
        flagged_by_id: i64,
        message: Option<&str>,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();

        let existing = Entity::find()
            .filter(Column::TicketId.eq(ticket_id))
            .filter(Column::FlaggedRole.eq(role))
            .one(db)
            .await?;

        match existing {
            Some(flag) => {
                let mut active: ActiveModel = flag.into();
                active.flagged_by_id = Set(flagged_by_id);
                active.message = Set(message.map(str::to_owned));
                active.resolved = Set(false);
                active.resolved_at = Set(None);
                active.created_at = Set(now);
                active.update(db).await
            }
            None => {
                let active = ActiveModel {
                    ticket_id: Set(ticket_id),
                    flagged_role: Set(role),
                    flagged_by_id: Set(flagged_by_id),
                    message: Set(message.map(str::to_owned)),
                    resolved: Set(false),
                    created_at: Set(now),
                    ..Default::default()
                };
                active.insert(db).await
            }
        }
    }

    /// Marks every unresolved flag targeting `role` on this ticket resolved.
    ///
    /// Idempotent: returns the number of rows updated, zero included.
    pub async fn resolve_for_role(
        db: &DbConn,
        ticket_id: i64,
        role: StaffRole,
    ) -> Result<u64, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::Resolved, migration::Expr::value(true))
            .col_expr(
                Column::ResolvedAt,
                migration::Expr::value(Utc::now()),
            )
            .filter(Column::TicketId.eq(ticket_id))
            .filter(Column::FlaggedRole.eq(role))
            .filter(Column::Resolved.eq(false))
            .exec(db)
            .await?;

        Ok(result.rows_affected)
    }

    /// All flags on a ticket, newest first.
    pub async fn find_for_ticket(db: &DbConn, ticket_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::TicketId.eq(ticket_id))
            .order_by_desc(Column::CreatedAt)
            .all(db)
            .await
    }

    pub async fn unresolved_count_for_ticket(db: &DbConn, ticket_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::TicketId.eq(ticket_id))
            .filter(Column::Resolved.eq(false))
            .count(db)
            .await
    }

    /// The escalation queue for a role: unresolved flags joined with their
    /// tickets, newest flag first.
    pub async fn unresolved_for_role(
        db: &DbConn,
        role: StaffRole,
    ) -> Result<Vec<(Model, ticket::Model)>, DbErr> {
        let rows = Entity::find()
            .filter(Column::FlaggedRole.eq(role))
            .filter(Column::Resolved.eq(false))
            .find_also_related(ticket::Entity)
            .order_by_desc(Column::CreatedAt)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(flag, ticket)| ticket.map(|t| (flag, t)))
            .collect())
    }
}
