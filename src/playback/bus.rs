//! Command bus
//!
//! Thread-safe multi-producer, single-consumer FIFO bridging the HTTP surface
//! (and any other producer context) to the scheduler loop. Strict FIFO, no
//! priorities, at-most-once delivery: once `try_receive` returns a command it
//! is gone, and a consumer crash mid-handling loses it. That is acceptable
//! because every command is an idempotent, re-issuable user action.

use serde::Deserialize;
use tokio::sync::mpsc;

/// Commands consumed by the scheduler tick
#[derive(Debug, Clone, Deserialize)]
pub enum PlaybackCommand {
    /// One-off override: play this entry now, bypassing window and selection
    ForcePlay { schedule_id: i64 },
    /// Pause autonomous scheduling and stop whatever is showing
    StopAll,
    /// Resume autonomous scheduling immediately
    StartAll,
    /// Opaque pass-through to the output-routing collaborator
    OutputSet {
        mode: String,
        targets: Vec<i64>,
        scale_mode: Option<String>,
    },
    /// Opaque pass-through to the output-routing collaborator
    OutputTestColor { color: String, targets: Vec<i64> },
}

/// Output-routing payloads the scheduler forwards downstream without
/// interpreting them
#[derive(Debug, Clone)]
pub enum OutputCommand {
    Set {
        mode: String,
        targets: Vec<i64>,
        scale_mode: Option<String>,
    },
    TestColor {
        color: String,
        targets: Vec<i64>,
    },
}

/// Producer side of the command bus. Cloneable across contexts.
#[derive(Clone)]
pub struct CommandBus {
    tx: mpsc::UnboundedSender<PlaybackCommand>,
}

/// Consumer side, owned by the scheduler loop
pub struct CommandReceiver {
    rx: mpsc::UnboundedReceiver<PlaybackCommand>,
}

/// Create a connected bus/receiver pair
pub fn command_bus() -> (CommandBus, CommandReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CommandBus { tx }, CommandReceiver { rx })
}

impl CommandBus {
    /// Enqueue a command. Never blocks; a send after the consumer is gone is
    /// silently dropped (the daemon is shutting down).
    pub fn send(&self, command: PlaybackCommand) {
        let _ = self.tx.send(command);
    }
}

impl CommandReceiver {
    /// Return the oldest pending command, or None. Non-blocking.
    pub fn try_receive(&mut self) -> Option<PlaybackCommand> {
        self.rx.try_recv().ok()
    }
}
