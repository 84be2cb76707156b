//! Play-window configuration access
//!
//! A single process-wide record on screen_config row 1. When disabled the
//! window predicate is always true.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Row, Sqlite};

/// Daily local time range outside which no autonomous playback occurs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayWindowConfig {
    pub enabled: bool,
    /// "HH:MM" local time
    pub start: Option<String>,
    /// "HH:MM" local time
    pub end: Option<String>,
}

/// Read the play-window record. A missing row reads as disabled.
pub async fn get_play_window(db: &Pool<Sqlite>) -> Result<PlayWindowConfig> {
    let row = sqlx::query(
        r#"
        SELECT schedule_window_enabled, schedule_window_start, schedule_window_end
        FROM screen_config
        WHERE id = 1
        "#,
    )
    .fetch_optional(db)
    .await?;

    let Some(row) = row else {
        return Ok(PlayWindowConfig::default());
    };

    Ok(PlayWindowConfig {
        enabled: row.get::<i64, _>("schedule_window_enabled") != 0,
        start: row.get("schedule_window_start"),
        end: row.get("schedule_window_end"),
    })
}

/// Write the play-window record
pub async fn set_play_window(db: &Pool<Sqlite>, config: &PlayWindowConfig) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO screen_config (id, schedule_window_enabled, schedule_window_start, schedule_window_end)
        VALUES (1, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            schedule_window_enabled = excluded.schedule_window_enabled,
            schedule_window_start = excluded.schedule_window_start,
            schedule_window_end = excluded.schedule_window_end
        "#,
    )
    .bind(config.enabled as i64)
    .bind(&config.start)
    .bind(&config.end)
    .execute(db)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::initialize_database;
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn roundtrip_play_window() {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();

        // Seeded row reads as disabled
        let config = get_play_window(&pool).await.unwrap();
        assert!(!config.enabled);
        assert!(config.start.is_none());

        let updated = PlayWindowConfig {
            enabled: true,
            start: Some("08:00".to_string()),
            end: Some("22:00".to_string()),
        };
        set_play_window(&pool, &updated).await.unwrap();

        let config = get_play_window(&pool).await.unwrap();
        assert!(config.enabled);
        assert_eq!(config.start.as_deref(), Some("08:00"));
        assert_eq!(config.end.as_deref(), Some("22:00"));
    }
}
