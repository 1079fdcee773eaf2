pub mod discord;
pub mod transcript;
pub mod uploads;
