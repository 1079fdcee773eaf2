use super::{seed_staff, seed_user};
use crate::models::staff::StaffRole;
use crate::models::ticket::{Model as Ticket, TicketCategory};
use crate::models::ticket_flag::Model as Flag;
use crate::test_utils::setup_test_db;

#[tokio::test]
async fn reflagging_the_same_role_updates_in_place() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let alice = seed_staff(&db, "alice", StaffRole::Support).await;
    let bob = seed_staff(&db, "bob", StaffRole::Moderator).await;
    let ticket = Ticket::create(&db, user.id, TicketCategory::Support, "T")
        .await
        .unwrap();

    let first = Flag::upsert(&db, ticket.id, StaffRole::Ceo, alice.id, Some("urgent"))
        .await
        .unwrap();
    let second = Flag::upsert(&db, ticket.id, StaffRole::Ceo, bob.id, Some("even more urgent"))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.flagged_by_id, bob.id);
    assert_eq!(second.message.as_deref(), Some("even more urgent"));
    assert!(!second.resolved);

    let all = Flag::find_for_ticket(&db, ticket.id).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn reflagging_reopens_a_resolved_escalation() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let alice = seed_staff(&db, "alice", StaffRole::Support).await;
    let ticket = Ticket::create(&db, user.id, TicketCategory::Support, "T")
        .await
        .unwrap();

    Flag::upsert(&db, ticket.id, StaffRole::Ceo, alice.id, None)
        .await
        .unwrap();
    let resolved = Flag::resolve_for_role(&db, ticket.id, StaffRole::Ceo)
        .await
        .unwrap();
    assert_eq!(resolved, 1);

    let reopened = Flag::upsert(&db, ticket.id, StaffRole::Ceo, alice.id, Some("again"))
        .await
        .unwrap();
    assert!(!reopened.resolved);
    assert_eq!(reopened.resolved_at, None);
    assert_eq!(
        Flag::unresolved_count_for_ticket(&db, ticket.id).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn resolving_with_nothing_pending_reports_zero() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let ticket = Ticket::create(&db, user.id, TicketCategory::Support, "T")
        .await
        .unwrap();

    let resolved = Flag::resolve_for_role(&db, ticket.id, StaffRole::Ceo)
        .await
        .unwrap();
    assert_eq!(resolved, 0);
}

#[tokio::test]
async fn resolve_only_touches_the_callers_role() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let alice = seed_staff(&db, "alice", StaffRole::Support).await;
    let ticket = Ticket::create(&db, user.id, TicketCategory::Support, "T")
        .await
        .unwrap();

    Flag::upsert(&db, ticket.id, StaffRole::Ceo, alice.id, None)
        .await
        .unwrap();
    Flag::upsert(&db, ticket.id, StaffRole::Moderator, alice.id, None)
        .await
        .unwrap();

    let resolved = Flag::resolve_for_role(&db, ticket.id, StaffRole::Ceo)
        .await
        .unwrap();
    assert_eq!(resolved, 1);
    assert_eq!(
        Flag::unresolved_count_for_ticket(&db, ticket.id).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn queue_lists_unresolved_flags_for_a_role_with_their_tickets() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let alice = seed_staff(&db, "alice", StaffRole::Support).await;

    let t1 = Ticket::create(&db, user.id, TicketCategory::Support, "T1")
        .await
        .unwrap();
    let t2 = Ticket::create(&db, user.id, TicketCategory::Bugs, "T2")
        .await
        .unwrap();

    Flag::upsert(&db, t1.id, StaffRole::Ceo, alice.id, Some("look"))
        .await
        .unwrap();
    Flag::upsert(&db, t2.id, StaffRole::Ceo, alice.id, None)
        .await
        .unwrap();
    Flag::upsert(&db, t2.id, StaffRole::Moderator, alice.id, None)
        .await
        .unwrap();
    Flag::resolve_for_role(&db, t2.id, StaffRole::Ceo).await.unwrap();

    let queue = Flag::unresolved_for_role(&db, StaffRole::Ceo).await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].1.id, t1.id);

    let moderator_queue = Flag::unresolved_for_role(&db, StaffRole::Moderator)
        .await
        .unwrap();
    assert_eq!(moderator_queue.len(), 1);
    assert_eq!(moderator_queue[0].1.id, t2.id);
}
