//! Playback scheduling components

pub mod bus;
pub mod player;
pub mod scheduler;
pub mod selection;

pub use scheduler::Scheduler;
