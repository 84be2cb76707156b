//! Pure selection rules
//!
//! The decision logic the scheduler tick applies to the store's ordered
//! active list: play-window membership, effective-duration resolution, and
//! the priority-tied round-robin pick. All pure functions over plain data.

use crate::db::schedules::ActiveSchedule;
use crate::db::settings::PlayWindowConfig;
use crate::playback::player::{MediaKind, PlayItem, TextStyle};
use chrono::{NaiveTime, Timelike};

/// Hard fallback for image/text items whose media carries no usable duration
pub const FALLBACK_DURATION_SECS: i64 = 10;

/// Resolve the effective play duration in seconds.
///
/// Video: an explicit 0 means "play the full file" (unbounded, the player
/// reports completion); NULL falls back to the media's own duration; any
/// other explicit value overrides. Image/text: NULL or 0 fall back to the
/// media duration when positive, else the hard 10 s fallback.
pub fn resolve_duration(
    kind: MediaKind,
    play_duration: Option<i64>,
    default_duration: Option<i64>,
) -> i64 {
    match kind {
        MediaKind::Video => match play_duration {
            None => default_duration.unwrap_or(0),
            Some(0) => 0,
            Some(d) => d,
        },
        MediaKind::Image | MediaKind::Text => match play_duration {
            None | Some(0) => match default_duration {
                Some(d) if d > 0 => d,
                _ => FALLBACK_DURATION_SECS,
            },
            Some(d) => d,
        },
    }
}

fn parse_hhmm(value: &str) -> Option<u32> {
    let (h, m) = value.split_once(':')?;
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    Some(h * 60 + m)
}

/// Is this local time inside the allowed play window?
///
/// Disabled, missing, or unparseable bounds read as always-inside (fail
/// open). Equal bounds mean always-inside. A start after the end wraps past
/// midnight.
pub fn within_play_window(config: &PlayWindowConfig, now: NaiveTime) -> bool {
    if !config.enabled {
        return true;
    }
    let (Some(start), Some(end)) = (config.start.as_deref(), config.end.as_deref()) else {
        return true;
    };
    let (Some(start_minutes), Some(end_minutes)) = (parse_hhmm(start), parse_hhmm(end)) else {
        return true;
    };

    let now_minutes = now.hour() * 60 + now.minute();
    if start_minutes == end_minutes {
        return true;
    }
    if start_minutes < end_minutes {
        start_minutes <= now_minutes && now_minutes < end_minutes
    } else {
        now_minutes >= start_minutes || now_minutes < end_minutes
    }
}

/// Pick the next item and its follow (prefetch) item from the ordered active
/// list, anchored at the last played id.
///
/// Only the maximum-priority group participates; the list must already be in
/// selection order. The rotation is circular. When the anchor is absent
/// (first run, or the previously played item fell out of the eligible set)
/// selection restarts at index 0. Single-item groups follow themselves.
pub fn pick_next(
    ordered: &[ActiveSchedule],
    last_played_id: Option<i64>,
) -> Option<(&ActiveSchedule, &ActiveSchedule)> {
    let first = ordered.first()?;
    let group: Vec<&ActiveSchedule> = ordered
        .iter()
        .take_while(|s| s.priority == first.priority)
        .collect();

    let next_index = match last_played_id
        .and_then(|id| group.iter().position(|s| s.schedule_id == id))
    {
        Some(anchor) => (anchor + 1) % group.len(),
        None => 0,
    };
    let follow_index = (next_index + 1) % group.len();

    Some((group[next_index], group[follow_index]))
}

/// Build the player payload for a selected entry
pub fn play_item(schedule: &ActiveSchedule) -> PlayItem {
    PlayItem {
        schedule_id: schedule.schedule_id,
        media_id: schedule.media_id,
        name: schedule.media_name.clone(),
        path: schedule.path.clone(),
        kind: schedule.kind,
        duration: resolve_duration(schedule.kind, schedule.play_duration, schedule.default_duration),
        style: TextStyle {
            text_size: schedule.text_size,
            text_color: schedule.text_color.clone(),
            bg_color: schedule.bg_color.clone(),
            scroll_mode: schedule.text_scroll_mode.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(schedule_id: i64, priority: i64) -> ActiveSchedule {
        ActiveSchedule {
            schedule_id,
            media_id: schedule_id * 100,
            media_name: None,
            path: format!("media-{schedule_id}.png"),
            kind: MediaKind::Image,
            default_duration: Some(10),
            play_duration: None,
            priority,
            order_index: schedule_id,
            start_time: "2026-01-01T00:00:00".to_string(),
            end_time: "2027-01-01T00:00:00".to_string(),
            text_size: None,
            text_color: None,
            bg_color: None,
            text_scroll_mode: None,
        }
    }

    fn window(enabled: bool, start: &str, end: &str) -> PlayWindowConfig {
        PlayWindowConfig {
            enabled,
            start: Some(start.to_string()),
            end: Some(end.to_string()),
        }
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn video_duration_resolution() {
        assert_eq!(resolve_duration(MediaKind::Video, None, Some(30)), 30);
        assert_eq!(resolve_duration(MediaKind::Video, None, None), 0);
        assert_eq!(resolve_duration(MediaKind::Video, Some(0), Some(30)), 0);
        assert_eq!(resolve_duration(MediaKind::Video, Some(12), Some(30)), 12);
    }

    #[test]
    fn image_text_duration_resolution() {
        assert_eq!(resolve_duration(MediaKind::Text, None, Some(0)), 10);
        assert_eq!(resolve_duration(MediaKind::Text, None, None), 10);
        assert_eq!(resolve_duration(MediaKind::Image, Some(0), Some(25)), 25);
        assert_eq!(resolve_duration(MediaKind::Image, Some(7), Some(25)), 7);
        assert_eq!(resolve_duration(MediaKind::Text, None, Some(-3)), 10);
    }

    #[test]
    fn window_disabled_is_always_inside() {
        assert!(within_play_window(&window(false, "08:00", "09:00"), at(3, 0)));
    }

    #[test]
    fn window_daytime_range() {
        let config = window(true, "08:00", "22:00");
        assert!(within_play_window(&config, at(8, 0)));
        assert!(within_play_window(&config, at(12, 30)));
        assert!(!within_play_window(&config, at(22, 0)));
        assert!(!within_play_window(&config, at(3, 0)));
    }

    #[test]
    fn window_wraps_past_midnight() {
        let config = window(true, "22:00", "06:00");
        assert!(within_play_window(&config, at(23, 15)));
        assert!(within_play_window(&config, at(2, 0)));
        assert!(!within_play_window(&config, at(12, 0)));
    }

    #[test]
    fn window_equal_bounds_and_bad_values_fail_open() {
        assert!(within_play_window(&window(true, "09:00", "09:00"), at(3, 0)));
        assert!(within_play_window(&window(true, "whenever", "09:00"), at(3, 0)));
        let missing = PlayWindowConfig {
            enabled: true,
            start: None,
            end: None,
        };
        assert!(within_play_window(&missing, at(3, 0)));
    }

    #[test]
    fn round_robin_visits_group_in_order() {
        let list = vec![entry(1, 5), entry(2, 5), entry(3, 5)];

        let mut anchor = None;
        let mut visited = Vec::new();
        for _ in 0..6 {
            let (next, _) = pick_next(&list, anchor).unwrap();
            visited.push(next.schedule_id);
            anchor = Some(next.schedule_id);
        }
        assert_eq!(visited, vec![1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn lower_priority_entries_never_selected() {
        let list = vec![entry(1, 9), entry(2, 9), entry(3, 1)];

        let (next, follow) = pick_next(&list, Some(2)).unwrap();
        assert_eq!(next.schedule_id, 1);
        assert_eq!(follow.schedule_id, 2);
    }

    #[test]
    fn missing_anchor_restarts_at_front() {
        let list = vec![entry(1, 5), entry(2, 5)];

        let (next, follow) = pick_next(&list, Some(99)).unwrap();
        assert_eq!(next.schedule_id, 1);
        assert_eq!(follow.schedule_id, 2);
    }

    #[test]
    fn single_item_group_follows_itself() {
        let list = vec![entry(4, 5)];

        let (next, follow) = pick_next(&list, None).unwrap();
        assert_eq!(next.schedule_id, 4);
        assert_eq!(follow.schedule_id, 4);

        let (next, _) = pick_next(&list, Some(4)).unwrap();
        assert_eq!(next.schedule_id, 4);
    }

    #[test]
    fn empty_list_yields_nothing() {
        assert!(pick_next(&[], Some(1)).is_none());
    }
}
