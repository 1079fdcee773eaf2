use crate::seed::Seeder;
use db::models::staff::{self, StaffRole};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use std::future::Future;
use std::pin::Pin;

/// Built-in password staff accounts, one per rank. Existing usernames are
/// left untouched so the seeder is safe to rerun.
pub struct StaffSeeder;

const ACCOUNTS: &[(&str, &str, StaffRole)] = &[
    ("ceo", "CEO", StaffRole::Ceo),
    ("community", "Community Manager", StaffRole::CommunityManager),
    ("coordinator", "Coordinator", StaffRole::Coordinator),
    ("moderator", "Moderator", StaffRole::Moderator),
    ("support", "Support", StaffRole::Support),
];

impl Seeder for StaffSeeder {
    fn seed<'a>(
        &'a self,
        db: &'a DatabaseConnection,
    ) -> Pin<Box<dyn Future<Output = Result<(), DbErr>> + Send + 'a>> {
        Box::pin(async move {
            for (username, display_name, role) in ACCOUNTS {
                let existing = staff::Entity::find()
                    .filter(staff::Column::Username.eq(*username))
                    .one(db)
                    .await?;

                if existing.is_none() {
                    // Initial password matches the username; changed on first login.
                    staff::Model::create_with_password(db, username, display_name, *role, username)
                        .await?;
                }
            }

            Ok(())
        })
    }
}
