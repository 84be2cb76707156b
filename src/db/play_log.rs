//! Play-log writes
//!
//! Append-only record of completed plays: exactly one row per observed
//! `finished` event that had a recorded start time. A write failure is the
//! caller's problem to log and swallow, never to propagate into scheduling.

use crate::error::Result;
use chrono::{DateTime, Local};
use sqlx::{Pool, Sqlite};

/// One completed play
#[derive(Debug, Clone)]
pub struct PlayLogRecord {
    pub media_id: i64,
    pub schedule_id: Option<i64>,
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
    pub duration_seconds: i64,
}

/// Append one record
pub async fn append(db: &Pool<Sqlite>, record: &PlayLogRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO play_logs (media_id, schedule_id, start_time, end_time, duration_seconds)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.media_id)
    .bind(record.schedule_id)
    .bind(record.start_time.format("%Y-%m-%dT%H:%M:%S").to_string())
    .bind(record.end_time.format("%Y-%m-%dT%H:%M:%S").to_string())
    .bind(record.duration_seconds)
    .execute(db)
    .await?;

    Ok(())
}
