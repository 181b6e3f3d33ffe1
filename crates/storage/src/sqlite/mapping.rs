use shapeville_core::model::{ExerciseId, ModuleId, VariantKey};
use shapeville_core::registry::CompletionRecord;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn parse_module(s: &str) -> Result<ModuleId, StorageError> {
    s.parse().map_err(ser)
}

pub(crate) fn parse_variant(s: &str) -> Result<VariantKey, StorageError> {
    s.parse().map_err(ser)
}

pub(crate) fn map_exercise_row(row: &SqliteRow) -> Result<ExerciseId, StorageError> {
    let module = parse_module(&row.try_get::<String, _>("module").map_err(ser)?)?;
    let variant = parse_variant(&row.try_get::<String, _>("variant").map_err(ser)?)?;
    Ok(ExerciseId::new(module, variant))
}

pub(crate) fn map_completion_row(
    row: &SqliteRow,
) -> Result<(VariantKey, CompletionRecord), StorageError> {
    let variant = parse_variant(&row.try_get::<String, _>("variant").map_err(ser)?)?;
    let attempts_taken = u32_from_i64(
        "attempts_taken",
        row.try_get::<i64, _>("attempts_taken").map_err(ser)?,
    )?;
    let points_earned = u32_from_i64(
        "points_earned",
        row.try_get::<i64, _>("points_earned").map_err(ser)?,
    )?;
    let completed_at = row.try_get("completed_at").map_err(ser)?;

    Ok((
        variant,
        CompletionRecord {
            attempts_taken,
            points_earned,
            completed_at,
        },
    ))
}
