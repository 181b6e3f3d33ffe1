use async_trait::async_trait;
use shapeville_core::model::{ExerciseId, ModuleId, VariantKey};
use shapeville_core::registry::CompletionRecord;

use super::SqliteRepository;
use super::mapping::{conn, map_completion_row};
use crate::repository::{CompletionRepository, StorageError};

#[async_trait]
impl CompletionRepository for SqliteRepository {
    async fn upsert_completion(
        &self,
        exercise: &ExerciseId,
        record: &CompletionRecord,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO completions (module, variant, attempts_taken, points_earned, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(module, variant) DO NOTHING
            ",
        )
        .bind(exercise.module.as_str())
        .bind(exercise.variant.to_string())
        .bind(i64::from(record.attempts_taken))
        .bind(i64::from(record.points_earned))
        .bind(record.completed_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn list_completions(
        &self,
        module: ModuleId,
    ) -> Result<Vec<(VariantKey, CompletionRecord)>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT variant, attempts_taken, points_earned, completed_at
            FROM completions
            WHERE module = ?1
            ORDER BY variant ASC
            ",
        )
        .bind(module.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_completion_row).collect()
    }

    async fn clear_module(&self, module: ModuleId) -> Result<u64, StorageError> {
        let res = sqlx::query("DELETE FROM completions WHERE module = ?1")
            .bind(module.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        log::debug!("cleared {} completions of {module}", res.rows_affected());
        Ok(res.rows_affected())
    }
}
