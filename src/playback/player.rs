//! Player contract
//!
//! The scheduler does not decode or render media. It hands playback off to a
//! player through [`PlayerHandle`] and receives exactly two events back:
//! periodic time ticks while an item is showing, and a single `Finished` when
//! the current item ends. `Finished` is the sole authority for "this item is
//! done"; the scheduler never infers completion from elapsed time on its own.
//!
//! [`TimedPlayer`] is the bundled headless implementation: it drives image and
//! text items purely by their resolved duration and treats a duration of zero
//! as unbounded (the real renderer signals end-of-stream for those).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Media type of a playable item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
    Text,
}

impl MediaKind {
    /// Parse the media `type` column. Unknown values behave like images
    /// (fixed display duration).
    pub fn from_db(s: &str) -> Self {
        match s {
            "video" => MediaKind::Video,
            "text" => MediaKind::Text,
            _ => MediaKind::Image,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
            MediaKind::Text => "text",
        }
    }
}

/// Styling attributes, relevant only when the media kind is text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyle {
    pub text_size: Option<i64>,
    pub text_color: Option<String>,
    pub bg_color: Option<String>,
    pub scroll_mode: Option<String>,
}

/// A fully resolved playback payload handed to the player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayItem {
    pub schedule_id: i64,
    pub media_id: i64,
    pub name: Option<String>,
    pub path: String,
    pub kind: MediaKind,
    /// Effective play duration in seconds; 0 means unbounded (the player
    /// reports completion from the underlying media)
    pub duration: i64,
    pub style: TextStyle,
}

/// Commands sent to the player
#[derive(Debug, Clone)]
pub enum PlayerCommand {
    /// Start showing an item. Safe to call with the item already displayed.
    Play(PlayItem),
    /// Best-effort hint to stage the following item for a seamless switch
    PrefetchNext(PlayItem),
    /// Stop the current item without emitting `Finished`
    Stop,
}

/// Events emitted by the player back to the scheduler
#[derive(Debug, Clone, Copy)]
pub enum PlayerEvent {
    /// Steady cadence while something is showing
    TimeTick { elapsed: i64, total: i64 },
    /// The current item's playback ended. Emitted exactly once per play.
    Finished,
}

/// Sending side of the player command channel
///
/// Cloneable; the scheduler holds one and treats delivery failure as a
/// logged, non-fatal player command failure.
#[derive(Clone)]
pub struct PlayerHandle {
    tx: mpsc::UnboundedSender<PlayerCommand>,
}

impl PlayerHandle {
    /// Create a handle plus the command receiver a player implementation
    /// drains
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PlayerCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn play(&self, item: PlayItem) -> Result<()> {
        self.tx
            .send(PlayerCommand::Play(item))
            .map_err(|_| Error::Player("player command channel closed".into()))
    }

    pub fn prefetch_next(&self, item: PlayItem) -> Result<()> {
        self.tx
            .send(PlayerCommand::PrefetchNext(item))
            .map_err(|_| Error::Player("player command channel closed".into()))
    }

    pub fn stop(&self) -> Result<()> {
        self.tx
            .send(PlayerCommand::Stop)
            .map_err(|_| Error::Player("player command channel closed".into()))
    }
}

/// Duration-driven headless player
///
/// Emits a time tick once per second while an item is showing and `Finished`
/// when the resolved duration elapses. Items with duration 0 tick forever and
/// only end on `Stop` (video end-of-stream belongs to a real renderer).
pub struct TimedPlayer {
    commands: mpsc::UnboundedReceiver<PlayerCommand>,
    events: mpsc::UnboundedSender<PlayerEvent>,
    current: Option<PlayItem>,
    staged: Option<PlayItem>,
    elapsed: i64,
}

impl TimedPlayer {
    pub fn new(
        commands: mpsc::UnboundedReceiver<PlayerCommand>,
        events: mpsc::UnboundedSender<PlayerEvent>,
    ) -> Self {
        Self {
            commands,
            events,
            current: None,
            staged: None,
            elapsed: 0,
        }
    }

    /// Run the player loop until the command channel closes
    pub async fn run(mut self) {
        let mut ticker = interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(cmd) => self.handle_command(cmd),
                        None => {
                            debug!("Player command channel closed, stopping");
                            break;
                        }
                    }
                }
                _ = ticker.tick() => {
                    self.on_tick();
                }
            }
        }
    }

    fn handle_command(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::Play(item) => {
                let same_surface = self
                    .current
                    .as_ref()
                    .map(|cur| cur.path == item.path && cur.kind == item.kind)
                    .unwrap_or(false);
                if same_surface {
                    // Item is already on screen; restart the clock but skip
                    // the disruptive surface swap.
                    info!(path = %item.path, "Already showing, reusing surface");
                } else {
                    info!(
                        kind = item.kind.as_str(),
                        path = %item.path,
                        duration = item.duration,
                        "Playing item"
                    );
                }
                self.elapsed = 0;
                self.current = Some(item);
            }
            PlayerCommand::PrefetchNext(item) => {
                debug!(path = %item.path, "Staged next item");
                self.staged = Some(item);
            }
            PlayerCommand::Stop => {
                if self.current.take().is_some() {
                    info!("Playback stopped");
                }
                self.elapsed = 0;
            }
        }
    }

    fn on_tick(&mut self) {
        let Some(current) = self.current.as_ref() else {
            return;
        };

        self.elapsed += 1;
        let total = current.duration;
        if self
            .events
            .send(PlayerEvent::TimeTick {
                elapsed: self.elapsed,
                total,
            })
            .is_err()
        {
            warn!("Player event channel closed");
            return;
        }

        if total > 0 && self.elapsed >= total {
            self.current = None;
            self.staged = None;
            self.elapsed = 0;
            let _ = self.events.send(PlayerEvent::Finished);
        }
    }
}
