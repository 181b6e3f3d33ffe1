use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs the versioned schema migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: completions, stage progress and credited exercises.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS completions (
                    module TEXT NOT NULL,
                    variant TEXT NOT NULL,
                    attempts_taken INTEGER NOT NULL CHECK (attempts_taken >= 0),
                    points_earned INTEGER NOT NULL CHECK (points_earned >= 0),
                    completed_at TEXT NOT NULL,
                    PRIMARY KEY (module, variant)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS stage_progress (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    ks1_percent REAL NOT NULL CHECK (ks1_percent BETWEEN 0 AND 100),
                    ks2_percent REAL NOT NULL CHECK (ks2_percent BETWEEN 0 AND 100),
                    total_score INTEGER NOT NULL CHECK (total_score >= 0)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS progress_credits (
                    module TEXT NOT NULL,
                    variant TEXT NOT NULL,
                    PRIMARY KEY (module, variant)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        log::info!("applied schema migration 1");
    }

    Ok(())
}
