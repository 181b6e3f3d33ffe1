use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shapeville_core::model::{ExerciseId, ModuleId, VariantKey};
use shapeville_core::progress::ProgressSnapshot;
use shapeville_core::registry::CompletionRecord;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of the learner's overall progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub snapshot: ProgressSnapshot,
    pub total_score: u64,
}

/// Completed variants, keyed by module.
#[async_trait]
pub trait CompletionRepository: Send + Sync {
    /// Store a first completion. An existing record for the same exercise is
    /// kept unchanged.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_completion(
        &self,
        exercise: &ExerciseId,
        record: &CompletionRecord,
    ) -> Result<(), StorageError>;

    /// All completions of one module, ordered by variant.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read or decode failures.
    async fn list_completions(
        &self,
        module: ModuleId,
    ) -> Result<Vec<(VariantKey, CompletionRecord)>, StorageError>;

    /// Remove every completion of one module. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    async fn clear_module(&self, module: ModuleId) -> Result<u64, StorageError>;
}

/// Stage percents, credited exercises and the running score.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load progress, or an empty record if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read or decode failures.
    async fn load_progress(&self) -> Result<ProgressRecord, StorageError>;

    /// Save progress. Credited exercises are only ever added, and stored
    /// percents and score never go down, so a stale save cannot undo a
    /// newer one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn save_progress(&self, progress: &ProgressRecord) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    completions: Arc<Mutex<BTreeMap<ExerciseId, CompletionRecord>>>,
    progress: Arc<Mutex<Option<ProgressRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompletionRepository for InMemoryRepository {
    async fn upsert_completion(
        &self,
        exercise: &ExerciseId,
        record: &CompletionRecord,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .completions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .entry(exercise.clone())
            .or_insert_with(|| record.clone());
        Ok(())
    }

    async fn list_completions(
        &self,
        module: ModuleId,
    ) -> Result<Vec<(VariantKey, CompletionRecord)>, StorageError> {
        let guard = self
            .completions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|(id, _)| id.module == module)
            .map(|(id, record)| (id.variant.clone(), record.clone()))
            .collect())
    }

    async fn clear_module(&self, module: ModuleId) -> Result<u64, StorageError> {
        let mut guard = self
            .completions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let before = guard.len();
        guard.retain(|id, _| id.module != module);
        Ok(u64::try_from(before - guard.len()).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load_progress(&self) -> Result<ProgressRecord, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone().unwrap_or_default())
    }

    async fn save_progress(&self, progress: &ProgressRecord) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut next = progress.clone();
        if let Some(previous) = guard.as_ref() {
            next.snapshot.ks1_percent = next.snapshot.ks1_percent.max(previous.snapshot.ks1_percent);
            next.snapshot.ks2_percent = next.snapshot.ks2_percent.max(previous.snapshot.ks2_percent);
            next.total_score = next.total_score.max(previous.total_score);
            for id in &previous.snapshot.counted {
                if !next.snapshot.counted.contains(id) {
                    next.snapshot.counted.push(id.clone());
                }
            }
            next.snapshot.counted.sort();
        }
        *guard = Some(next);
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub completions: Arc<dyn CompletionRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let completions: Arc<dyn CompletionRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self {
            completions,
            progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapeville_core::time::fixed_now;

    fn record(points: u32) -> CompletionRecord {
        CompletionRecord {
            attempts_taken: 1,
            points_earned: points,
            completed_at: fixed_now(),
        }
    }

    fn sector(n: u32) -> ExerciseId {
        ExerciseId::new(ModuleId::Sectors, VariantKey::numbered(n))
    }

    #[tokio::test]
    async fn first_completion_wins() {
        let repo = InMemoryRepository::new();
        repo.upsert_completion(&sector(1), &record(6)).await.unwrap();
        repo.upsert_completion(&sector(1), &record(2)).await.unwrap();

        let rows = repo.list_completions(ModuleId::Sectors).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1.points_earned, 6);
    }

    #[tokio::test]
    async fn clear_module_is_scoped() {
        let repo = InMemoryRepository::new();
        repo.upsert_completion(&sector(1), &record(6)).await.unwrap();
        let angle = ExerciseId::new(ModuleId::Angles, VariantKey::named("right angle").unwrap());
        repo.upsert_completion(&angle, &record(3)).await.unwrap();

        assert_eq!(repo.clear_module(ModuleId::Sectors).await.unwrap(), 1);
        assert!(repo.list_completions(ModuleId::Sectors).await.unwrap().is_empty());
        assert_eq!(repo.list_completions(ModuleId::Angles).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn saved_credits_are_never_dropped() {
        let repo = InMemoryRepository::new();
        assert_eq!(repo.load_progress().await.unwrap(), ProgressRecord::default());

        let first = ProgressRecord {
            snapshot: ProgressSnapshot {
                ks1_percent: 0.0,
                ks2_percent: 3.125,
                counted: vec![sector(1)],
            },
            total_score: 6,
        };
        repo.save_progress(&first).await.unwrap();

        let stale = ProgressRecord {
            snapshot: ProgressSnapshot {
                ks1_percent: 0.0,
                ks2_percent: 3.125,
                counted: vec![sector(2)],
            },
            total_score: 6,
        };
        repo.save_progress(&stale).await.unwrap();

        let loaded = repo.load_progress().await.unwrap();
        assert_eq!(loaded.snapshot.counted, vec![sector(1), sector(2)]);
    }

    #[tokio::test]
    async fn older_save_does_not_lower_progress() {
        let repo = InMemoryRepository::new();
        let newer = ProgressRecord {
            snapshot: ProgressSnapshot {
                ks1_percent: 10.0,
                ks2_percent: 6.25,
                counted: vec![sector(1), sector(2)],
            },
            total_score: 12,
        };
        repo.save_progress(&newer).await.unwrap();

        let older = ProgressRecord {
            snapshot: ProgressSnapshot {
                ks1_percent: 10.0,
                ks2_percent: 3.125,
                counted: vec![sector(1)],
            },
            total_score: 6,
        };
        repo.save_progress(&older).await.unwrap();

        assert_eq!(repo.load_progress().await.unwrap(), newer);
    }
}
