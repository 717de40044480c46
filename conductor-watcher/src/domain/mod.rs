pub mod config;
pub mod outbox;
