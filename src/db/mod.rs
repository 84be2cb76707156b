//! Database access layer (schedule store)
//!
//! Short synchronous-style queries against SQLite via sqlx. The scheduler
//! only ever reads schedule entries; mutation happens through the HTTP
//! surface.

pub mod init;
pub mod play_log;
pub mod schedules;
pub mod settings;
