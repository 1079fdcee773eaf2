use crate::seed::Seeder;
use db::models::ticket::{Model as Ticket, TicketCategory};
use db::models::ticket_message::Model as Message;
use db::models::user;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, PaginatorTrait};
use std::future::Future;
use std::pin::Pin;

/// A couple of demo users and tickets for development databases. Skipped
/// entirely when any ticket already exists.
pub struct DemoSeeder;

const DEMO_TICKETS: &[(&str, TicketCategory, &str, &str)] = &[
    (
        "1000000000000000001",
        TicketCategory::Bugs,
        "Game crashes after the latest update",
        "Since yesterday's patch the client closes as soon as I enter the garage.",
    ),
    (
        "1000000000000000002",
        TicketCategory::Support,
        "Lost access to my account",
        "I changed phones and can't get past the login verification anymore.",
    ),
    (
        "1000000000000000002",
        TicketCategory::Boost,
        "Booster perks not applied",
        "I boosted the server last week but the perks never showed up.",
    ),
];

impl Seeder for DemoSeeder {
    fn seed<'a>(
        &'a self,
        db: &'a DatabaseConnection,
    ) -> Pin<Box<dyn Future<Output = Result<(), DbErr>> + Send + 'a>> {
        Box::pin(async move {
            if db::models::ticket::Entity::find().count(db).await? > 0 {
                return Ok(());
            }

            for (i, (discord_id, category, subject, body)) in DEMO_TICKETS.iter().enumerate() {
                let user = user::Model::upsert_from_discord(
                    db,
                    discord_id,
                    &format!("demo_user_{i}"),
                    &format!("Demo User {i}"),
                    None,
                    None,
                )
                .await?;

                let ticket = Ticket::create(db, user.id, *category, subject)
                    .await
                    .map_err(|e| DbErr::Custom(e.to_string()))?;
                Message::create_from_user(db, ticket.id, user.id, body, &[])
                    .await
                    .map_err(|e| DbErr::Custom(e.to_string()))?;
            }

            Ok(())
        })
    }
}
