//! Playback scheduler
//!
//! The continuously running state machine that decides what plays now. Each
//! one-second tick drains at most one command from the bus, gates on the
//! allowed play window, and (when idle) runs selection over the active
//! schedule entries. Player completion signals arrive as events marshaled
//! onto this loop, so all state mutation happens on one logical task.
//!
//! The loop never stalls: every failure is logged and the tick falls open to
//! "no eligible items" rather than crashing.

use crate::db;
use crate::db::play_log::PlayLogRecord;
use crate::db::settings::PlayWindowConfig;
use crate::events::MarqueeEvent;
use crate::playback::bus::{CommandReceiver, OutputCommand, PlaybackCommand};
use crate::playback::player::{PlayItem, PlayerEvent, PlayerHandle};
use crate::playback::selection;
use crate::state::SharedState;
use chrono::{DateTime, Local, Utc};
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

/// The playback scheduling engine
pub struct Scheduler {
    db: Pool<Sqlite>,
    state: Arc<SharedState>,
    commands: CommandReceiver,
    player: PlayerHandle,
    player_events: mpsc::UnboundedReceiver<PlayerEvent>,
    output: mpsc::UnboundedSender<OutputCommand>,

    current_schedule_id: Option<i64>,
    /// Round-robin anchor: last id whose play reached `finished`
    last_played_id: Option<i64>,
    is_playing: bool,
    paused: bool,
    force_play_mode: bool,
    play_start_time: Option<DateTime<Local>>,
    current_media_id: Option<i64>,
    /// Prefetch candidate computed at selection time
    next_payload: Option<PlayItem>,
    /// Which current item the last prefetch was issued for (dedup guard)
    prefetched_for: Option<i64>,
    window_blocked: bool,
}

impl Scheduler {
    pub fn new(
        db: Pool<Sqlite>,
        state: Arc<SharedState>,
        commands: CommandReceiver,
        player: PlayerHandle,
        player_events: mpsc::UnboundedReceiver<PlayerEvent>,
        output: mpsc::UnboundedSender<OutputCommand>,
    ) -> Self {
        Self {
            db,
            state,
            commands,
            player,
            player_events,
            output,
            current_schedule_id: None,
            last_played_id: None,
            is_playing: false,
            paused: false,
            force_play_mode: false,
            play_start_time: None,
            current_media_id: None,
            next_payload: None,
            prefetched_for: None,
            window_blocked: false,
        }
    }

    /// Run the scheduler loop until shutdown is signaled
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Scheduler loop started");
        let mut ticker = interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                event = self.player_events.recv() => {
                    match event {
                        Some(event) => self.handle_player_event(event).await,
                        None => {
                            warn!("Player event channel closed, stopping scheduler");
                            break;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    break;
                }
            }
        }
        info!("Scheduler loop stopped");
    }

    /// One scheduling cycle: command, window gate, then selection if idle
    pub async fn tick(&mut self) {
        if let Some(command) = self.commands.try_receive() {
            match command {
                PlaybackCommand::ForcePlay { schedule_id } => {
                    self.handle_force_play(schedule_id).await;
                    return;
                }
                PlaybackCommand::StopAll => {
                    info!("Stop-all command received");
                    self.paused = true;
                    if self.is_playing {
                        if let Err(e) = self.player.stop() {
                            warn!("Stop command failed: {}", e);
                        }
                    }
                    self.publish_flags().await;
                    return;
                }
                PlaybackCommand::StartAll => {
                    info!("Start-all command received");
                    self.paused = false;
                    self.check_schedule().await;
                    self.publish_flags().await;
                    return;
                }
                // Output commands are opaque here; forward them downstream
                // and carry on with the tick.
                PlaybackCommand::OutputSet {
                    mode,
                    targets,
                    scale_mode,
                } => {
                    let _ = self.output.send(OutputCommand::Set {
                        mode,
                        targets,
                        scale_mode,
                    });
                }
                PlaybackCommand::OutputTestColor { color, targets } => {
                    let _ = self.output.send(OutputCommand::TestColor { color, targets });
                }
            }
        }

        let window = match db::settings::get_play_window(&self.db).await {
            Ok(window) => window,
            Err(e) => {
                warn!("Play window read failed, treating window as open: {}", e);
                PlayWindowConfig::default()
            }
        };
        if !selection::within_play_window(&window, Local::now().time()) {
            if self.is_playing {
                info!("Left the play window, stopping current item");
                if let Err(e) = self.player.stop() {
                    warn!("Stop command failed: {}", e);
                }
                self.is_playing = false;
                self.current_schedule_id = None;
                self.current_media_id = None;
                self.play_start_time = None;
                self.state.clear_media().await;
            }
            self.window_blocked = true;
            self.publish_flags().await;
            return;
        }
        self.window_blocked = false;
        self.publish_flags().await;

        if self.paused || self.is_playing {
            return;
        }
        self.check_schedule().await;
    }

    /// Player events marshaled onto the scheduler loop
    pub async fn handle_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::TimeTick { elapsed, total } => self.on_time_tick(elapsed, total).await,
            PlayerEvent::Finished => self.on_finished().await,
        }
    }

    async fn handle_force_play(&mut self, schedule_id: i64) {
        info!(schedule_id, "Force play requested");
        match db::schedules::get_enabled_with_media(&self.db, schedule_id).await {
            Ok(Some(schedule)) => {
                self.force_play_mode = true;
                let item = selection::play_item(&schedule);
                self.play_item(item).await;
            }
            Ok(None) => {
                warn!(schedule_id, "Force play target not found or disabled");
            }
            Err(e) => {
                warn!(schedule_id, "Force play lookup failed: {}", e);
            }
        }
    }

    /// Selection: pick the next item among the active entries and start it
    async fn check_schedule(&mut self) {
        let now_local = Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
        let now_utc = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

        let active = match db::schedules::list_active_enabled(&self.db, &now_local, &now_utc).await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Schedule read failed, treating tick as no eligible items: {}", e);
                Vec::new()
            }
        };

        let Some((next, follow)) = selection::pick_next(&active, self.last_played_id) else {
            self.current_schedule_id = None;
            self.is_playing = false;
            self.publish_flags().await;
            return;
        };

        self.next_payload = Some(selection::play_item(follow));
        let item = selection::play_item(next);
        self.play_item(item).await;
    }

    async fn play_item(&mut self, item: PlayItem) {
        debug!(
            schedule_id = item.schedule_id,
            kind = item.kind.as_str(),
            duration = item.duration,
            "Starting item"
        );
        self.current_schedule_id = Some(item.schedule_id);
        self.current_media_id = Some(item.media_id);
        self.play_start_time = Some(Local::now());

        if let Err(e) = self.player.play(item.clone()) {
            // The player is authoritative for its own completion signal;
            // advance optimistically either way.
            warn!("Play command failed: {}", e);
        }
        self.is_playing = true;
        self.state.set_play_start(&item).await;
        self.publish_flags().await;
        self.state.broadcast(MarqueeEvent::PlaybackStarted {
            schedule_id: item.schedule_id,
            media_id: item.media_id,
            kind: item.kind,
            forced: self.force_play_mode,
            timestamp: Utc::now(),
        });

        // Prefetch the follow item right away for a seamless transition
        if let Some(next) = self.next_payload.clone() {
            match self.player.prefetch_next(next) {
                Ok(()) => self.prefetched_for = self.current_schedule_id,
                Err(e) => warn!("Prefetch command failed: {}", e),
            }
        }
    }

    async fn on_time_tick(&mut self, elapsed: i64, total: i64) {
        if total > 0 && elapsed >= total {
            // Natural completion; the snapshot clears ahead of `finished`
            self.state.clear_media().await;
        } else {
            self.state.set_time(elapsed, total).await;
        }
        self.state.broadcast(MarqueeEvent::PlaybackProgress {
            elapsed,
            total,
            timestamp: Utc::now(),
        });

        // Late prefetch: covers plays that started without one (forced plays)
        if total <= 0 {
            return;
        }
        if (total - elapsed).max(0) > 1 {
            return;
        }
        let Some(next) = self.next_payload.clone() else {
            return;
        };
        if self.prefetched_for == self.current_schedule_id {
            return;
        }
        match self.player.prefetch_next(next) {
            Ok(()) => self.prefetched_for = self.current_schedule_id,
            Err(e) => warn!("Prefetch command failed: {}", e),
        }
    }

    async fn on_finished(&mut self) {
        if let (Some(start), Some(media_id)) = (self.play_start_time, self.current_media_id) {
            let end = Local::now();
            let record = PlayLogRecord {
                media_id,
                schedule_id: self.current_schedule_id,
                start_time: start,
                end_time: end,
                duration_seconds: (end - start).num_seconds(),
            };
            if let Err(e) = db::play_log::append(&self.db, &record).await {
                warn!("Play log write failed: {}", e);
            }
            self.state.broadcast(MarqueeEvent::PlaybackFinished {
                schedule_id: self.current_schedule_id,
                media_id: Some(media_id),
                duration_seconds: record.duration_seconds,
                timestamp: Utc::now(),
            });
        }
        self.play_start_time = None;
        self.current_media_id = None;
        self.is_playing = false;
        self.state.clear_media().await;
        self.publish_flags().await;

        // Forced plays advance the rotation anchor too; when the anchor is
        // outside the next eligible group, selection restarts at the front.
        self.force_play_mode = false;
        self.last_played_id = self.current_schedule_id;
        self.prefetched_for = None;

        // Chain straight into the next decision so zero-length or
        // already-elapsed items never wait out a full timer interval.
        self.tick().await;
    }

    async fn publish_flags(&self) {
        self.state
            .set_flags(self.is_playing, self.paused, self.window_blocked)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::initialize_database;
    use crate::playback::bus::{command_bus, CommandBus};
    use crate::playback::player::PlayerCommand;
    use sqlx::sqlite::SqlitePoolOptions;

    struct Harness {
        scheduler: Scheduler,
        bus: CommandBus,
        player_rx: mpsc::UnboundedReceiver<PlayerCommand>,
        output_rx: mpsc::UnboundedReceiver<OutputCommand>,
        db: Pool<Sqlite>,
        state: Arc<SharedState>,
    }

    async fn harness() -> Harness {
        let db = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&db).await.unwrap();

        let state = Arc::new(SharedState::new());
        let (bus, commands) = command_bus();
        let (player, player_rx) = PlayerHandle::new();
        let (_events_tx, events_rx) = mpsc::unbounded_channel();
        let (output_tx, output_rx) = mpsc::unbounded_channel();

        let scheduler = Scheduler::new(
            db.clone(),
            Arc::clone(&state),
            commands,
            player,
            events_rx,
            output_tx,
        );
        Harness {
            scheduler,
            bus,
            player_rx,
            output_rx,
            db,
            state,
        }
    }

    async fn insert_item(db: &Pool<Sqlite>, path: &str, priority: i64, order_index: i64) -> i64 {
        let media_id =
            sqlx::query("INSERT INTO media (name, path, type, duration) VALUES (?, ?, 'image', 10)")
                .bind(path)
                .bind(path)
                .execute(db)
                .await
                .unwrap()
                .last_insert_rowid();
        sqlx::query(
            r#"
            INSERT INTO schedules (media_id, start_time, end_time, priority, order_index, is_enabled)
            VALUES (?, '2000-01-01T00:00:00', '2099-01-01T00:00:00', ?, ?, 1)
            "#,
        )
        .bind(media_id)
        .bind(priority)
        .bind(order_index)
        .execute(db)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    #[tokio::test]
    async fn empty_schedule_ticks_to_idle() {
        let mut h = harness().await;
        h.scheduler.tick().await;

        assert!(!h.scheduler.is_playing);
        assert!(h.scheduler.current_schedule_id.is_none());
        assert!(h.player_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stop_all_pauses_and_stops_current() {
        let mut h = harness().await;
        insert_item(&h.db, "a.png", 1, 0).await;

        h.scheduler.tick().await;
        assert!(h.scheduler.is_playing);

        h.bus.send(PlaybackCommand::StopAll);
        h.scheduler.tick().await;
        assert!(h.scheduler.paused);

        let mut saw_stop = false;
        while let Ok(cmd) = h.player_rx.try_recv() {
            if matches!(cmd, PlayerCommand::Stop) {
                saw_stop = true;
            }
        }
        assert!(saw_stop);
        assert!(h.state.snapshot().await.paused);
    }

    #[tokio::test]
    async fn start_all_resumes_selection_immediately() {
        let mut h = harness().await;
        insert_item(&h.db, "a.png", 1, 0).await;

        h.bus.send(PlaybackCommand::StopAll);
        h.scheduler.tick().await;
        assert!(h.scheduler.paused);
        assert!(h.player_rx.try_recv().is_err());

        h.bus.send(PlaybackCommand::StartAll);
        h.scheduler.tick().await;
        assert!(!h.scheduler.paused);
        assert!(matches!(
            h.player_rx.try_recv(),
            Ok(PlayerCommand::Play(_))
        ));
    }

    #[tokio::test]
    async fn force_play_of_missing_id_is_a_noop() {
        let mut h = harness().await;
        h.bus.send(PlaybackCommand::ForcePlay { schedule_id: 404 });
        h.scheduler.tick().await;

        assert!(!h.scheduler.is_playing);
        assert!(!h.scheduler.force_play_mode);
        assert!(h.player_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn force_play_bypasses_selection_order() {
        let mut h = harness().await;
        insert_item(&h.db, "a.png", 9, 0).await;
        let low = insert_item(&h.db, "b.png", 1, 0).await;

        h.bus.send(PlaybackCommand::ForcePlay { schedule_id: low });
        h.scheduler.tick().await;

        assert!(h.scheduler.force_play_mode);
        match h.player_rx.try_recv() {
            Ok(PlayerCommand::Play(item)) => assert_eq!(item.schedule_id, low),
            other => panic!("expected Play, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn output_commands_forward_and_tick_continues() {
        let mut h = harness().await;
        insert_item(&h.db, "a.png", 1, 0).await;

        h.bus.send(PlaybackCommand::OutputSet {
            mode: "sync".to_string(),
            targets: vec![1, 2],
            scale_mode: None,
        });
        h.scheduler.tick().await;

        assert!(matches!(
            h.output_rx.try_recv(),
            Ok(OutputCommand::Set { .. })
        ));
        // Same tick still ran selection
        assert!(h.scheduler.is_playing);
    }
}
