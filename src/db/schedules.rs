//! Schedule entry queries
//!
//! The scheduler's read contract: enabled entries whose time bounds contain
//! "now", joined with their media metadata, in deterministic selection order.

use crate::error::{Error, Result};
use crate::playback::player::MediaKind;
use serde::Serialize;
use sqlx::{Pool, Row, Sqlite};

/// A schedule entry joined with its media row, as consumed by selection
#[derive(Debug, Clone)]
pub struct ActiveSchedule {
    pub schedule_id: i64,
    pub media_id: i64,
    pub media_name: Option<String>,
    pub path: String,
    pub kind: MediaKind,
    /// Media-level duration in seconds (video full length, image/text fallback)
    pub default_duration: Option<i64>,
    /// Entry-level duration override in seconds
    pub play_duration: Option<i64>,
    pub priority: i64,
    pub order_index: i64,
    pub start_time: String,
    pub end_time: String,
    pub text_size: Option<i64>,
    pub text_color: Option<String>,
    pub bg_color: Option<String>,
    pub text_scroll_mode: Option<String>,
}

const SELECT_WITH_MEDIA: &str = r#"
    SELECT s.id, s.media_id, s.start_time, s.end_time, s.play_duration,
           COALESCE(s.priority, 0) AS priority,
           COALESCE(s.order_index, 0) AS order_index,
           s.text_size, s.text_color, s.bg_color, s.text_scroll_mode,
           m.name AS media_name, m.path,
           m.type AS media_type, m.duration AS default_duration
    FROM schedules s
    JOIN media m ON s.media_id = m.id
"#;

fn row_to_schedule(row: &sqlx::sqlite::SqliteRow) -> ActiveSchedule {
    let media_type: String = row.get("media_type");
    ActiveSchedule {
        schedule_id: row.get("id"),
        media_id: row.get("media_id"),
        media_name: row.get("media_name"),
        path: row.get("path"),
        kind: MediaKind::from_db(&media_type),
        default_duration: row.get("default_duration"),
        play_duration: row.get("play_duration"),
        priority: row.get("priority"),
        order_index: row.get("order_index"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        text_size: row.get("text_size"),
        text_color: row.get("text_color"),
        bg_color: row.get("bg_color"),
        text_scroll_mode: row.get("text_scroll_mode"),
    }
}

/// List enabled entries active at this instant, in selection order
/// (priority DESC, order_index ASC, start_time ASC).
///
/// An entry is active when its `[start_time, end_time]` bounds contain the
/// instant under *either* the local or the UTC representation. Stored bounds
/// may have been entered in either form; the OR is a deliberate tolerance,
/// preserved from the observed behavior.
pub async fn list_active_enabled(
    db: &Pool<Sqlite>,
    now_local: &str,
    now_utc: &str,
) -> Result<Vec<ActiveSchedule>> {
    let sql = format!(
        r#"{SELECT_WITH_MEDIA}
        WHERE COALESCE(s.is_enabled, 1) = 1
          AND (
            (s.start_time <= ? AND s.end_time >= ?)
            OR
            (s.start_time <= ? AND s.end_time >= ?)
          )
        ORDER BY priority DESC, order_index ASC, s.start_time ASC
        "#
    );

    let rows = sqlx::query(&sql)
        .bind(now_local)
        .bind(now_local)
        .bind(now_utc)
        .bind(now_utc)
        .fetch_all(db)
        .await?;

    Ok(rows.iter().map(row_to_schedule).collect())
}

/// Look up one enabled entry for a force-play override
pub async fn get_enabled_with_media(
    db: &Pool<Sqlite>,
    schedule_id: i64,
) -> Result<Option<ActiveSchedule>> {
    let sql = format!("{SELECT_WITH_MEDIA} WHERE s.id = ? AND COALESCE(s.is_enabled, 1) = 1");

    let row = sqlx::query(&sql).bind(schedule_id).fetch_optional(db).await?;
    Ok(row.as_ref().map(row_to_schedule))
}

/// Schedule listing returned by the HTTP surface
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleInfo {
    pub id: i64,
    pub media_id: i64,
    pub media_name: Option<String>,
    pub path: String,
    pub kind: MediaKind,
    pub start_time: String,
    pub end_time: String,
    pub play_duration: Option<i64>,
    pub priority: i64,
    pub order_index: i64,
    pub is_enabled: bool,
}

/// List every schedule entry with its media row
pub async fn list_all(db: &Pool<Sqlite>) -> Result<Vec<ScheduleInfo>> {
    let rows = sqlx::query(
        r#"
        SELECT s.id, s.media_id, s.start_time, s.end_time, s.play_duration,
               COALESCE(s.priority, 0) AS priority,
               COALESCE(s.order_index, 0) AS order_index,
               COALESCE(s.is_enabled, 1) AS is_enabled,
               m.name AS media_name, m.path, m.type AS media_type
        FROM schedules s
        JOIN media m ON s.media_id = m.id
        ORDER BY priority DESC, order_index ASC, s.start_time ASC
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(rows
        .iter()
        .map(|row| {
            let media_type: String = row.get("media_type");
            ScheduleInfo {
                id: row.get("id"),
                media_id: row.get("media_id"),
                media_name: row.get("media_name"),
                path: row.get("path"),
                kind: MediaKind::from_db(&media_type),
                start_time: row.get("start_time"),
                end_time: row.get("end_time"),
                play_duration: row.get("play_duration"),
                priority: row.get("priority"),
                order_index: row.get("order_index"),
                is_enabled: row.get::<i64, _>("is_enabled") != 0,
            }
        })
        .collect())
}

/// Enable or disable an entry
pub async fn set_enabled(db: &Pool<Sqlite>, schedule_id: i64, enabled: bool) -> Result<()> {
    let result = sqlx::query("UPDATE schedules SET is_enabled = ? WHERE id = ?")
        .bind(enabled as i64)
        .bind(schedule_id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::ScheduleNotFound(schedule_id));
    }
    Ok(())
}

/// Move an entry within its priority group (tie-break ordering)
pub async fn set_order_index(db: &Pool<Sqlite>, schedule_id: i64, order_index: i64) -> Result<()> {
    let result = sqlx::query("UPDATE schedules SET order_index = ? WHERE id = ?")
        .bind(order_index)
        .bind(schedule_id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::ScheduleNotFound(schedule_id));
    }
    Ok(())
}
