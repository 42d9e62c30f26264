pub mod ai;
pub mod backend;
pub mod config;
pub mod notify;
pub mod reminders;
pub mod types;
pub mod views;
