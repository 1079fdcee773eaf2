use super::{seed_staff, seed_user};
use crate::models::staff::StaffRole;
use crate::models::ticket::{Model as Ticket, TicketCategory, TicketError};
use crate::models::ticket_message::{Model as Message, NewAttachment};
use crate::test_utils::setup_test_db;

fn image_attachment() -> NewAttachment {
    NewAttachment {
        url: "https://i.imgur.com/abc123.png".into(),
        filename: "screenshot.png".into(),
        mime_type: "image/png".into(),
        size: 2048,
    }
}

#[tokio::test]
async fn empty_message_without_attachments_is_rejected() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let ticket = Ticket::create(&db, user.id, TicketCategory::Support, "T")
        .await
        .unwrap();

    let err = Message::create_from_user(&db, ticket.id, user.id, "   ", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::EmptyMessage));
}

#[tokio::test]
async fn attachment_only_message_is_allowed() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let ticket = Ticket::create(&db, user.id, TicketCategory::Support, "T")
        .await
        .unwrap();

    let (message, attachments) =
        Message::create_from_user(&db, ticket.id, user.id, "", &[image_attachment()])
            .await
            .unwrap();

    assert_eq!(message.content, "");
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].message_id, message.id);
    assert_eq!(attachments[0].mime_type, "image/png");
}

#[tokio::test]
async fn staff_reply_requires_content() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let staff = seed_staff(&db, "alice", StaffRole::Support).await;
    let ticket = Ticket::create(&db, user.id, TicketCategory::Support, "T")
        .await
        .unwrap();

    let err = Message::create_from_staff(&db, ticket.id, staff.id, "  ", false)
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::EmptyMessage));
}

#[tokio::test]
async fn history_is_chronological_and_hides_internal_notes_from_users() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let staff = seed_staff(&db, "alice", StaffRole::Support).await;
    let ticket = Ticket::create(&db, user.id, TicketCategory::Support, "T")
        .await
        .unwrap();

    Message::create_from_user(&db, ticket.id, user.id, "first", &[])
        .await
        .unwrap();
    Message::create_from_staff(&db, ticket.id, staff.id, "internal note", true)
        .await
        .unwrap();
    Message::create_from_staff(&db, ticket.id, staff.id, "reply", false)
        .await
        .unwrap();
    Message::create_system(&db, ticket.id, "category changed")
        .await
        .unwrap();

    let staff_view = Message::find_all_for_ticket(&db, ticket.id, true)
        .await
        .unwrap();
    assert_eq!(staff_view.len(), 4);
    let contents: Vec<_> = staff_view.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["first", "internal note", "reply", "category changed"]);

    let user_view = Message::find_all_for_ticket(&db, ticket.id, false)
        .await
        .unwrap();
    assert_eq!(user_view.len(), 3);
    assert!(user_view.iter().all(|m| !m.staff_only));
}

#[tokio::test]
async fn author_fields_are_mutually_exclusive() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let staff = seed_staff(&db, "alice", StaffRole::Support).await;
    let ticket = Ticket::create(&db, user.id, TicketCategory::Support, "T")
        .await
        .unwrap();

    let (from_user, _) = Message::create_from_user(&db, ticket.id, user.id, "hi", &[])
        .await
        .unwrap();
    assert_eq!(from_user.user_id, Some(user.id));
    assert_eq!(from_user.staff_id, None);
    assert!(!from_user.is_system);

    let from_staff = Message::create_from_staff(&db, ticket.id, staff.id, "hello", false)
        .await
        .unwrap();
    assert_eq!(from_staff.user_id, None);
    assert_eq!(from_staff.staff_id, Some(staff.id));
    assert!(!from_staff.is_system);

    let system = Message::create_system(&db, ticket.id, "notice").await.unwrap();
    assert_eq!(system.user_id, None);
    assert_eq!(system.staff_id, None);
    assert!(system.is_system);
}

#[tokio::test]
async fn last_message_preview_is_the_newest() {
    let db = setup_test_db().await;
    let user = seed_user(&db, "100").await;
    let ticket = Ticket::create(&db, user.id, TicketCategory::Support, "T")
        .await
        .unwrap();

    Message::create_from_user(&db, ticket.id, user.id, "first", &[])
        .await
        .unwrap();
    Message::create_from_user(&db, ticket.id, user.id, "second", &[])
        .await
        .unwrap();

    let last = Message::last_for_ticket(&db, ticket.id).await.unwrap().unwrap();
    assert_eq!(last.content, "second");
}
