//! Runtime state publisher
//!
//! One overwritable snapshot of "what's playing now" plus the scheduler
//! flags, owned by the process and shared with the HTTP surface. Every
//! scheduler transition overwrites the snapshot atomically; readers always
//! see the latest complete copy. A broadcast channel fans scheduler events
//! out to SSE listeners.

use crate::events::MarqueeEvent;
use crate::playback::player::{MediaKind, PlayItem};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};

/// Snapshot readable by the status API
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusSnapshot {
    pub schedule_id: Option<i64>,
    pub media_id: Option<i64>,
    pub media_name: Option<String>,
    pub media_kind: Option<MediaKind>,
    pub path: Option<String>,
    pub text_size: Option<i64>,
    pub text_color: Option<String>,
    pub bg_color: Option<String>,
    pub text_scroll_mode: Option<String>,
    pub elapsed: i64,
    pub total: i64,
    pub playing: bool,
    pub paused: bool,
    pub window_blocked: bool,
}

/// Shared state accessible by all components
pub struct SharedState {
    snapshot: RwLock<StatusSnapshot>,
    event_tx: broadcast::Sender<MarqueeEvent>,
}

impl SharedState {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            snapshot: RwLock::new(StatusSnapshot::default()),
            event_tx,
        }
    }

    /// Broadcast an event to all SSE listeners. No receivers is fine.
    pub fn broadcast(&self, event: MarqueeEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to the event stream for SSE
    pub fn subscribe(&self) -> broadcast::Receiver<MarqueeEvent> {
        self.event_tx.subscribe()
    }

    /// Latest complete snapshot
    pub async fn snapshot(&self) -> StatusSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Record a newly started play
    pub async fn set_play_start(&self, item: &PlayItem) {
        let mut snapshot = self.snapshot.write().await;
        snapshot.schedule_id = Some(item.schedule_id);
        snapshot.media_id = Some(item.media_id);
        snapshot.media_name = item.name.clone();
        snapshot.media_kind = Some(item.kind);
        snapshot.path = Some(item.path.clone());
        snapshot.text_size = item.style.text_size;
        snapshot.text_color = item.style.text_color.clone();
        snapshot.bg_color = item.style.bg_color.clone();
        snapshot.text_scroll_mode = item.style.scroll_mode.clone();
        snapshot.elapsed = 0;
        snapshot.total = item.duration;
    }

    /// Update elapsed/total from a player time tick
    pub async fn set_time(&self, elapsed: i64, total: i64) {
        let mut snapshot = self.snapshot.write().await;
        snapshot.elapsed = elapsed;
        snapshot.total = total;
    }

    /// Reset all media fields (finished, stopped, or window-blocked)
    pub async fn clear_media(&self) {
        let mut snapshot = self.snapshot.write().await;
        snapshot.schedule_id = None;
        snapshot.media_id = None;
        snapshot.media_name = None;
        snapshot.media_kind = None;
        snapshot.path = None;
        snapshot.text_size = None;
        snapshot.text_color = None;
        snapshot.bg_color = None;
        snapshot.text_scroll_mode = None;
        snapshot.elapsed = 0;
        snapshot.total = 0;
    }

    /// Publish the scheduler flags, broadcasting only on change
    pub async fn set_flags(&self, playing: bool, paused: bool, window_blocked: bool) {
        let changed = {
            let mut snapshot = self.snapshot.write().await;
            let changed = snapshot.playing != playing
                || snapshot.paused != paused
                || snapshot.window_blocked != window_blocked;
            snapshot.playing = playing;
            snapshot.paused = paused;
            snapshot.window_blocked = window_blocked;
            changed
        };

        if changed {
            self.broadcast(MarqueeEvent::SchedulerStateChanged {
                playing,
                paused,
                window_blocked,
                timestamp: chrono::Utc::now(),
            });
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::player::TextStyle;

    fn item() -> PlayItem {
        PlayItem {
            schedule_id: 5,
            media_id: 9,
            name: Some("promo".to_string()),
            path: "promo.mp4".to_string(),
            kind: MediaKind::Video,
            duration: 30,
            style: TextStyle::default(),
        }
    }

    #[tokio::test]
    async fn play_start_then_clear() {
        let state = SharedState::new();
        state.set_play_start(&item()).await;

        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.schedule_id, Some(5));
        assert_eq!(snapshot.total, 30);
        assert_eq!(snapshot.elapsed, 0);

        state.clear_media().await;
        let snapshot = state.snapshot().await;
        assert!(snapshot.schedule_id.is_none());
        assert_eq!(snapshot.total, 0);
    }

    #[tokio::test]
    async fn flags_broadcast_only_on_change() {
        let state = SharedState::new();
        let mut rx = state.subscribe();

        state.set_flags(true, false, false).await;
        state.set_flags(true, false, false).await;
        state.set_flags(false, false, false).await;

        assert!(matches!(
            rx.try_recv(),
            Ok(MarqueeEvent::SchedulerStateChanged { playing: true, .. })
        ));
        assert!(matches!(
            rx.try_recv(),
            Ok(MarqueeEvent::SchedulerStateChanged { playing: false, .. })
        ));
        assert!(rx.try_recv().is_err());
    }
}
