//! # Marquee
//!
//! Unattended playback scheduling daemon for signage surfaces.
//!
//! **Purpose:** continuously decide what plays now from a set of
//! time-bounded, prioritized schedule entries, hand playback off to a player
//! over a command channel, and stay interruptible through externally issued
//! override commands.
//!
//! The scheduling engine lives in [`playback::scheduler`]; media decoding,
//! output surface geometry, and persistence schemas are external
//! collaborators reached through the contracts in [`playback::player`] and
//! [`db`].

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod playback;
pub mod state;

pub use error::{Error, Result};
pub use state::SharedState;
