//! Shared error types for the services crate.

use thiserror::Error;

use shapeville_core::model::{ExerciseId, ModuleId};
use shapeville_core::progress::ProgressError;
use shapeville_core::scoring::ExerciseFamily;
use shapeville_core::session::SessionError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while running exercises.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExerciseError {
    #[error("exercise {0} is not part of the curriculum")]
    UnknownExercise(ExerciseId),
    #[error("module {0} is not part of the curriculum")]
    UnknownModule(ModuleId),
    #[error("{exercise} is scored as {expected:?}, not {found:?}")]
    FamilyMismatch {
        exercise: ExerciseId,
        expected: ExerciseFamily,
        found: ExerciseFamily,
    },
    #[error("progress book lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}
