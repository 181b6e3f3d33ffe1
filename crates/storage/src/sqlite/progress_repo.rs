use async_trait::async_trait;
use shapeville_core::progress::ProgressSnapshot;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, map_exercise_row, ser};
use crate::repository::{ProgressRecord, ProgressRepository, StorageError};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_progress(&self) -> Result<ProgressRecord, StorageError> {
        let row = sqlx::query(
            r"
            SELECT ks1_percent, ks2_percent, total_score
            FROM stage_progress
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let (ks1_percent, ks2_percent, total_score) = match row {
            Some(row) => {
                let total: i64 = row.try_get("total_score").map_err(ser)?;
                (
                    row.try_get::<f64, _>("ks1_percent").map_err(ser)?,
                    row.try_get::<f64, _>("ks2_percent").map_err(ser)?,
                    u64::try_from(total)
                        .map_err(|_| StorageError::Serialization(format!("invalid total_score: {total}")))?,
                )
            }
            None => (0.0, 0.0, 0),
        };

        let credit_rows = sqlx::query(
            r"
            SELECT module, variant
            FROM progress_credits
            ORDER BY module ASC, variant ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let counted = credit_rows
            .iter()
            .map(map_exercise_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ProgressRecord {
            snapshot: ProgressSnapshot {
                ks1_percent,
                ks2_percent,
                counted,
            },
            total_score,
        })
    }

    async fn save_progress(&self, progress: &ProgressRecord) -> Result<(), StorageError> {
        let total_score = i64::try_from(progress.total_score)
            .map_err(|_| StorageError::Serialization("total_score overflow".into()))?;

        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO stage_progress (id, ks1_percent, ks2_percent, total_score)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                ks1_percent = MAX(stage_progress.ks1_percent, excluded.ks1_percent),
                ks2_percent = MAX(stage_progress.ks2_percent, excluded.ks2_percent),
                total_score = MAX(stage_progress.total_score, excluded.total_score)
            ",
        )
        .bind(1_i64)
        .bind(progress.snapshot.ks1_percent)
        .bind(progress.snapshot.ks2_percent)
        .bind(total_score)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        for exercise in &progress.snapshot.counted {
            sqlx::query(
                r"
                INSERT INTO progress_credits (module, variant)
                VALUES (?1, ?2)
                ON CONFLICT(module, variant) DO NOTHING
                ",
            )
            .bind(exercise.module.as_str())
            .bind(exercise.variant.to_string())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
