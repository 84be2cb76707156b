//! Event types for the marquee event system
//!
//! Scheduler transitions are broadcast to all SSE listeners through the
//! `SharedState` broadcast channel. Events are serialized with a `type` tag.

use crate::playback::player::MediaKind;
use serde::Serialize;

/// Events published by the scheduler
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum MarqueeEvent {
    /// A schedule entry started playing
    PlaybackStarted {
        schedule_id: i64,
        media_id: i64,
        kind: MediaKind,
        forced: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The current item finished and its play was logged
    PlaybackFinished {
        schedule_id: Option<i64>,
        media_id: Option<i64>,
        duration_seconds: i64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback progress update (sent on each player time tick)
    PlaybackProgress {
        elapsed: i64,
        total: i64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One of the scheduler flags changed
    SchedulerStateChanged {
        playing: bool,
        paused: bool,
        window_blocked: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl MarqueeEvent {
    /// Event type string used as the SSE event field
    pub fn type_str(&self) -> &'static str {
        match self {
            MarqueeEvent::PlaybackStarted { .. } => "PlaybackStarted",
            MarqueeEvent::PlaybackFinished { .. } => "PlaybackFinished",
            MarqueeEvent::PlaybackProgress { .. } => "PlaybackProgress",
            MarqueeEvent::SchedulerStateChanged { .. } => "SchedulerStateChanged",
        }
    }
}
