//! Error types for marquee
//!
//! Module-specific error types using thiserror for clear error propagation.
//! Nothing in the scheduling core treats these as fatal: failures are logged
//! and the loop continues on its next tick.

use thiserror::Error;

/// Main error type for marquee
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Player command delivery errors
    #[error("Player command error: {0}")]
    Player(String),

    /// Schedule entry lookup failures
    #[error("Schedule not found: {0}")]
    ScheduleNotFound(i64),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using the marquee Error
pub type Result<T> = std::result::Result<T, Error>;
