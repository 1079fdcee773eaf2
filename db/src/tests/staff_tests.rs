use crate::models::staff::{Model as Staff, StaffRole};
use crate::test_utils::setup_test_db;

#[tokio::test]
async fn password_login_round_trip() {
    let db = setup_test_db().await;
    Staff::create_with_password(&db, "alice", "Alice", StaffRole::Coordinator, "hunter2")
        .await
        .unwrap();

    let ok = Staff::verify_credentials(&db, "alice", "hunter2")
        .await
        .unwrap();
    assert!(ok.is_some());
    assert_eq!(ok.unwrap().role, StaffRole::Coordinator);

    assert!(
        Staff::verify_credentials(&db, "alice", "wrong")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        Staff::verify_credentials(&db, "nobody", "hunter2")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn discord_staff_rows_are_upserted_with_fresh_roles() {
    let db = setup_test_db().await;

    let first = Staff::upsert_from_discord(
        &db,
        "42",
        "alice",
        "Alice",
        StaffRole::Support,
        Some("https://cdn.discordapp.com/avatars/42/a.png"),
    )
    .await
    .unwrap();
    assert_eq!(first.role, StaffRole::Support);
    assert!(first.password_hash.is_none());

    // Promoted in Discord; next login refreshes the stored role in place.
    let second = Staff::upsert_from_discord(&db, "42", "alice", "Alice", StaffRole::Moderator, None)
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.role, StaffRole::Moderator);
    assert_eq!(second.avatar, None);
}

#[tokio::test]
async fn oauth_accounts_cannot_password_login() {
    let db = setup_test_db().await;
    Staff::upsert_from_discord(&db, "42", "alice", "Alice", StaffRole::Support, None)
        .await
        .unwrap();

    assert!(
        Staff::verify_credentials(&db, "alice", "anything")
            .await
            .unwrap()
            .is_none()
    );
}
