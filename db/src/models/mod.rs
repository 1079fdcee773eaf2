pub mod attachment;
pub mod staff;
pub mod ticket;
pub mod ticket_flag;
pub mod ticket_message;
pub mod user;
