use super::{seed_staff, seed_user};
use crate::models::staff::StaffRole;
use crate::models::ticket::{Model as Ticket, TicketCategory, TicketError, TicketStatus};
use crate::test_utils::setup_test_db;

#[tokio::test]
async fn tickets_get_sequential_numbers() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;

    let first = Ticket::create(&db, user.id, TicketCategory::Support, "First")
        .await
        .unwrap();
    let second = Ticket::create(&db, user.id, TicketCategory::Bugs, "Second")
        .await
        .unwrap();

    assert_eq!(first.ticket_number, 1);
    assert_eq!(second.ticket_number, 2);
    assert_eq!(first.status, TicketStatus::Open);
    assert_eq!(first.assigned_to, None);
}

#[tokio::test]
async fn second_active_ticket_in_same_category_is_rejected() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;

    Ticket::create(&db, user.id, TicketCategory::Bugs, "Crash on login")
        .await
        .unwrap();

    let err = Ticket::create(&db, user.id, TicketCategory::Bugs, "Another crash")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TicketError::DuplicateActive(TicketCategory::Bugs)
    ));

    // A different category is unaffected, as is a different user.
    Ticket::create(&db, user.id, TicketCategory::Support, "Unrelated")
        .await
        .unwrap();
    let other = seed_user(&db, "200").await;
    Ticket::create(&db, other.id, TicketCategory::Bugs, "Their own crash")
        .await
        .unwrap();
}

#[tokio::test]
async fn closing_frees_the_category_slot() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;

    let first = Ticket::create(&db, user.id, TicketCategory::Bugs, "T1")
        .await
        .unwrap();

    assert!(
        Ticket::create(&db, user.id, TicketCategory::Bugs, "T2")
            .await
            .is_err()
    );

    let closed = Ticket::close(&db, first.id, None).await.unwrap();
    assert_eq!(closed.status, TicketStatus::Closed);
    assert!(closed.closed_at.is_some());
    assert_eq!(
        closed.closed_reason.as_deref(),
        Some(crate::models::ticket::DEFAULT_CLOSED_REASON)
    );
    assert_eq!(closed.open_slot, None);

    // Now the user may open a fresh ticket in the same category.
    Ticket::create(&db, user.id, TicketCategory::Bugs, "T2")
        .await
        .unwrap();
}

#[tokio::test]
async fn close_carries_the_given_reason() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let ticket = Ticket::create(&db, user.id, TicketCategory::Support, "T")
        .await
        .unwrap();

    let closed = Ticket::close(&db, ticket.id, Some("Resolved via DM"))
        .await
        .unwrap();
    assert_eq!(closed.closed_reason.as_deref(), Some("Resolved via DM"));
}

#[tokio::test]
async fn closing_twice_is_rejected() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let ticket = Ticket::create(&db, user.id, TicketCategory::Support, "T")
        .await
        .unwrap();

    Ticket::close(&db, ticket.id, None).await.unwrap();
    let err = Ticket::close(&db, ticket.id, None).await.unwrap_err();
    assert!(matches!(err, TicketError::AlreadyClosed));
}

#[tokio::test]
async fn user_reply_moves_ticket_to_awaiting_reply() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let ticket = Ticket::create(&db, user.id, TicketCategory::Support, "T")
        .await
        .unwrap();

    let updated = Ticket::record_user_reply(&db, ticket.id).await.unwrap();
    assert_eq!(updated.status, TicketStatus::AwaitingReply);
}

#[tokio::test]
async fn user_reply_to_closed_ticket_is_rejected() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let ticket = Ticket::create(&db, user.id, TicketCategory::Support, "T")
        .await
        .unwrap();
    Ticket::close(&db, ticket.id, None).await.unwrap();

    let err = Ticket::record_user_reply(&db, ticket.id).await.unwrap_err();
    assert!(matches!(err, TicketError::Closed));
}

#[tokio::test]
async fn first_staff_reply_claims_the_ticket() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let responder = seed_staff(&db, "alice", StaffRole::Support).await;
    let ticket = Ticket::create(&db, user.id, TicketCategory::Support, "T")
        .await
        .unwrap();

    let updated = Ticket::record_staff_reply(&db, ticket.id, responder.id)
        .await
        .unwrap();
    assert_eq!(updated.status, TicketStatus::InProgress);
    assert_eq!(updated.assigned_to, Some(responder.id));
}

#[tokio::test]
async fn later_staff_replies_keep_the_original_assignee() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let first = seed_staff(&db, "alice", StaffRole::Support).await;
    let second = seed_staff(&db, "bob", StaffRole::Moderator).await;
    let ticket = Ticket::create(&db, user.id, TicketCategory::Support, "T")
        .await
        .unwrap();

    Ticket::record_staff_reply(&db, ticket.id, first.id)
        .await
        .unwrap();
    let updated = Ticket::record_staff_reply(&db, ticket.id, second.id)
        .await
        .unwrap();
    assert_eq!(updated.assigned_to, Some(first.id));
}

#[tokio::test]
async fn staff_reply_to_closed_ticket_is_rejected() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let responder = seed_staff(&db, "alice", StaffRole::Support).await;
    let ticket = Ticket::create(&db, user.id, TicketCategory::Support, "T")
        .await
        .unwrap();
    Ticket::close(&db, ticket.id, None).await.unwrap();

    let err = Ticket::record_staff_reply(&db, ticket.id, responder.id)
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::Closed));
}

#[tokio::test]
async fn category_change_keeps_status() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let staff = seed_staff(&db, "alice", StaffRole::Support).await;
    let ticket = Ticket::create(&db, user.id, TicketCategory::Support, "T")
        .await
        .unwrap();
    Ticket::record_staff_reply(&db, ticket.id, staff.id)
        .await
        .unwrap();

    let moved = Ticket::change_category(&db, ticket.id, TicketCategory::Bugs)
        .await
        .unwrap();
    assert_eq!(moved.category, TicketCategory::Bugs);
    assert_eq!(moved.status, TicketStatus::InProgress);
}

#[tokio::test]
async fn category_change_on_closed_ticket_is_rejected() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let ticket = Ticket::create(&db, user.id, TicketCategory::Support, "T")
        .await
        .unwrap();
    Ticket::close(&db, ticket.id, None).await.unwrap();

    let err = Ticket::change_category(&db, ticket.id, TicketCategory::Bugs)
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::Closed));
}

#[tokio::test]
async fn category_change_into_an_occupied_slot_is_rejected() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let first = Ticket::create(&db, user.id, TicketCategory::Support, "T1")
        .await
        .unwrap();
    Ticket::create(&db, user.id, TicketCategory::Bugs, "T2")
        .await
        .unwrap();

    let err = Ticket::change_category(&db, first.id, TicketCategory::Bugs)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TicketError::DuplicateActive(TicketCategory::Bugs)
    ));
}

#[tokio::test]
async fn manual_claim_bumps_open_tickets_only() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let staff = seed_staff(&db, "alice", StaffRole::Support).await;

    let open = Ticket::create(&db, user.id, TicketCategory::Support, "T1")
        .await
        .unwrap();
    let claimed = Ticket::claim(&db, open.id, staff.id).await.unwrap();
    assert_eq!(claimed.status, TicketStatus::InProgress);
    assert_eq!(claimed.assigned_to, Some(staff.id));

    // A ticket already awaiting the user keeps its status on reassignment.
    let waiting = Ticket::create(&db, user.id, TicketCategory::Bugs, "T2")
        .await
        .unwrap();
    Ticket::record_staff_reply(&db, waiting.id, staff.id)
        .await
        .unwrap();
    Ticket::record_user_reply(&db, waiting.id).await.unwrap();
    let reclaimed = Ticket::claim(&db, waiting.id, staff.id).await.unwrap();
    assert_eq!(reclaimed.status, TicketStatus::AwaitingReply);
}

#[tokio::test]
async fn filtered_listing_matches_subject_search() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    Ticket::create(&db, user.id, TicketCategory::Support, "Cannot log in")
        .await
        .unwrap();
    Ticket::create(&db, user.id, TicketCategory::Bugs, "Broken minimap")
        .await
        .unwrap();

    let hits = Ticket::find_filtered(&db, None, None, Some("LOG"))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].subject, "Cannot log in");

    let by_category = Ticket::find_filtered(&db, None, Some(TicketCategory::Bugs), None)
        .await
        .unwrap();
    assert_eq!(by_category.len(), 1);

    let by_status = Ticket::find_filtered(&db, Some(TicketStatus::Closed), None, None)
        .await
        .unwrap();
    assert!(by_status.is_empty());
}
