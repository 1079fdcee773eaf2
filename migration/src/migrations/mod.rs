pub mod m202607150001_create_users;
pub mod m202607150002_create_staff;
pub mod m202607150003_create_tickets;
pub mod m202607150004_create_ticket_messages;
pub mod m202607150005_create_attachments;
pub mod m202607150006_create_ticket_flags;
