//! Database initialization
//!
//! Creates the schedule-store tables when missing and seeds the single
//! screen_config row. Idempotent; safe to run on every startup.

use crate::error::Result;
use sqlx::{Pool, Sqlite};
use tracing::info;

/// Initialize all required database structures
pub async fn initialize_database(pool: &Pool<Sqlite>) -> Result<()> {
    info!("Initializing database structures");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS media (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            path TEXT NOT NULL,
            type TEXT NOT NULL,
            duration INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schedules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            media_id INTEGER NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            play_duration INTEGER,
            priority INTEGER NOT NULL DEFAULT 0,
            order_index INTEGER DEFAULT 0,
            is_enabled INTEGER DEFAULT 1,
            text_size INTEGER,
            text_color TEXT,
            bg_color TEXT,
            text_scroll_mode TEXT DEFAULT 'static',
            FOREIGN KEY (media_id) REFERENCES media(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS screen_config (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            schedule_window_enabled INTEGER NOT NULL DEFAULT 0,
            schedule_window_start TEXT,
            schedule_window_end TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS play_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            media_id INTEGER,
            schedule_id INTEGER,
            start_time TEXT,
            end_time TEXT,
            duration_seconds INTEGER,
            FOREIGN KEY (media_id) REFERENCES media(id),
            FOREIGN KEY (schedule_id) REFERENCES schedules(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Single process-wide play-window record
    sqlx::query("INSERT OR IGNORE INTO screen_config (id) VALUES (1)")
        .execute(pool)
        .await?;

    info!("Database initialization complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();
        initialize_database(&pool).await.unwrap();

        // screen_config row seeded exactly once
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM screen_config")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
