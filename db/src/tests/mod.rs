mod flag_tests;
mod lifecycle_tests;
mod message_tests;
mod staff_tests;

use crate::models::staff::{self, StaffRole};
use crate::models::user;
use sea_orm::DatabaseConnection;

pub async fn seed_user(db: &DatabaseConnection, discord_id: &str) -> user::Model {
    user::Model::upsert_from_discord(db, discord_id, "tester", "Tester", None, None)
        .await
        .expect("Failed to seed user")
}

pub async fn seed_staff(
    db: &DatabaseConnection,
    username: &str,
    role: StaffRole,
) -> staff::Model {
    staff::Model::create_with_password(db, username, username, role, "password")
        .await
        .expect("Failed to seed staff")
}
