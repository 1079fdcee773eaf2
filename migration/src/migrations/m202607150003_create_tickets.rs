use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202607150003_create_tickets"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("tickets"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("ticket_number"))
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("category"))
                            .enumeration(
                                Alias::new("ticket_category"),
                                vec![
                                    Alias::new("support"),
                                    Alias::new("bugs"),
                                    Alias::new("reports"),
                                    Alias::new("donations"),
                                    Alias::new("boost"),
                                    Alias::new("housing"),
                                    Alias::new("review"),
                                ],
                            )
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alias::new("subject")).text().not_null())
                    .col(
                        ColumnDef::new(Alias::new("status"))
                            .enumeration(
                                Alias::new("ticket_status"),
                                vec![
                                    Alias::new("open"),
                                    Alias::new("in_progress"),
                                    Alias::new("awaiting_reply"),
                                    Alias::new("closed"),
                                ],
                            )
                            .not_null()
                            .default("open"),
                    )
                    .col(
                        ColumnDef::new(Alias::new("user_id"))
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("assigned_to"))
                            .big_integer()
                            .null(),
                    )
                    // Non-NULL while the ticket is active, NULLed on close.
                    // Part of the unique index below: NULLs never collide, so
                    // closed tickets stack freely while at most one active
                    // ticket per (user, category) can exist.
                    .col(ColumnDef::new(Alias::new("open_slot")).boolean().null())
                    .col(ColumnDef::new(Alias::new("closed_at")).timestamp().null())
                    .col(ColumnDef::new(Alias::new("closed_reason")).text().null())
                    .col(
                        ColumnDef::new(Alias::new("created_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::cust("CURRENT_TIMESTAMP")),
                    )
                    .col(
                        ColumnDef::new(Alias::new("updated_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::cust("CURRENT_TIMESTAMP")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alias::new("tickets"), Alias::new("user_id"))
                            .to(Alias::new("users"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alias::new("tickets"), Alias::new("assigned_to"))
                            .to(Alias::new("staff"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_tickets_ticket_number")
                    .table(Alias::new("tickets"))
                    .col(Alias::new("ticket_number"))
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_tickets_user_category_open")
                    .table(Alias::new("tickets"))
                    .col(Alias::new("user_id"))
                    .col(Alias::new("category"))
                    .col(Alias::new("open_slot"))
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("tickets")).to_owned())
            .await
    }
}
