use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use shapeville_core::curriculum::{Curriculum, ModuleSpec};
use shapeville_core::model::{ExerciseId, KeyStage, ModuleId, VariantKey};
use shapeville_core::progress::ProgressTracker;
use shapeville_core::registry::{CompletionRecord, CompletionRegistry, MarkResult};
use shapeville_core::session::SessionState;
use storage::repository::ProgressRecord;

use super::progress::{ModuleProgress, ProgressView};
use crate::error::ExerciseError;

/// What finishing one session changed in the book.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOutcome {
    pub exercise: ExerciseId,
    pub state: SessionState,
    /// `None` when the variant stays open.
    pub mark: Option<MarkResult>,
    /// Points added to the total score.
    pub points: u32,
    pub progress_credited: bool,
    pub stage_percent: f64,
    pub module_complete: bool,
}

impl CompletionOutcome {
    #[must_use]
    pub fn is_first_completion(&self) -> bool {
        self.mark
            .as_ref()
            .is_some_and(MarkResult::is_first_completion)
    }
}

#[derive(Debug)]
struct BookState {
    registries: BTreeMap<ModuleId, CompletionRegistry>,
    tracker: ProgressTracker,
    total_score: u64,
}

/// Shared registries, tracker and score.
///
/// All mutation goes through one coarse mutex; the guard is never held
/// across an `.await`.
#[derive(Clone, Debug)]
pub struct ProgressBook {
    curriculum: Arc<Curriculum>,
    state: Arc<Mutex<BookState>>,
}

impl ProgressBook {
    #[must_use]
    pub fn new(curriculum: Arc<Curriculum>) -> Self {
        Self::restore(curriculum, Vec::new(), ProgressTracker::new(), 0)
    }

    /// Rebuild a book from persisted registries and progress.
    #[must_use]
    pub fn restore(
        curriculum: Arc<Curriculum>,
        registries: impl IntoIterator<Item = CompletionRegistry>,
        tracker: ProgressTracker,
        total_score: u64,
    ) -> Self {
        let mut by_module: BTreeMap<ModuleId, CompletionRegistry> = curriculum
            .modules()
            .map(|m| (m.id(), CompletionRegistry::new(m.id())))
            .collect();
        for registry in registries {
            by_module.insert(registry.module(), registry);
        }

        Self {
            curriculum,
            state: Arc::new(Mutex::new(BookState {
                registries: by_module,
                tracker,
                total_score,
            })),
        }
    }

    #[must_use]
    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    /// # Errors
    ///
    /// Returns `ExerciseError::UnknownModule` if the module is not in the catalog.
    pub fn module_spec(&self, module: ModuleId) -> Result<&ModuleSpec, ExerciseError> {
        self.curriculum
            .module(module)
            .ok_or(ExerciseError::UnknownModule(module))
    }

    /// # Errors
    ///
    /// Returns `ExerciseError::UnknownExercise` if the variant is not in the catalog.
    pub fn ensure_known(&self, exercise: &ExerciseId) -> Result<&ModuleSpec, ExerciseError> {
        let spec = self.module_spec(exercise.module)?;
        if !spec.has_variant(&exercise.variant) {
            return Err(ExerciseError::UnknownExercise(exercise.clone()));
        }
        Ok(spec)
    }

    /// Apply a finished session to the registry, tracker and score.
    ///
    /// A solved session always completes its variant. A failed one does so
    /// only for modules that credit failures. Repeated calls for an already
    /// completed variant add no points and no progress.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError` for unknown exercises or a poisoned lock.
    pub fn record_outcome(
        &self,
        exercise: &ExerciseId,
        state: SessionState,
        attempts_taken: u32,
        points_earned: u32,
        at: DateTime<Utc>,
    ) -> Result<CompletionOutcome, ExerciseError> {
        let spec = self.ensure_known(exercise)?;
        let counts = match state {
            SessionState::CorrectlySolved => true,
            SessionState::ExhaustedAttempts | SessionState::TimedOut => spec.credit_on_failure(),
            SessionState::Active => false,
        };

        let mut guard = self.lock()?;
        let BookState {
            registries,
            tracker,
            total_score,
        } = &mut *guard;
        let registry = registries
            .entry(exercise.module)
            .or_insert_with(|| CompletionRegistry::new(exercise.module));

        if !counts {
            return Ok(CompletionOutcome {
                exercise: exercise.clone(),
                state,
                mark: None,
                points: 0,
                progress_credited: false,
                stage_percent: tracker.current_percent(spec.stage()),
                module_complete: registry.all_completed(spec.variants()),
            });
        }

        let progress_credited = tracker.credit(exercise, spec.stage(), spec.variant_weight())?;
        let mark = registry.mark_completed(
            exercise.variant.clone(),
            attempts_taken,
            points_earned,
            at,
        );
        let points = if mark.is_first_completion() {
            mark.record.points_earned
        } else {
            0
        };
        *total_score = total_score.saturating_add(u64::from(points));

        Ok(CompletionOutcome {
            exercise: exercise.clone(),
            state,
            mark: Some(mark),
            points,
            progress_credited,
            stage_percent: tracker.current_percent(spec.stage()),
            module_complete: registry.all_completed(spec.variants()),
        })
    }

    /// "Play again": forget every completion of one module.
    ///
    /// Stage progress is kept.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::Poisoned` if the lock is poisoned.
    pub fn reset_module(&self, module: ModuleId) -> Result<usize, ExerciseError> {
        self.module_spec(module)?;
        let mut guard = self.lock()?;
        let registry = guard
            .registries
            .entry(module)
            .or_insert_with(|| CompletionRegistry::new(module));
        let cleared = registry.completed_count();
        registry.reset_all();
        Ok(cleared)
    }

    /// Open variants of a module in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError` for unknown modules or a poisoned lock.
    pub fn uncompleted(&self, module: ModuleId) -> Result<Vec<VariantKey>, ExerciseError> {
        let spec = self.module_spec(module)?;
        let guard = self.lock()?;
        Ok(match guard.registries.get(&module) {
            Some(registry) => registry.uncompleted(spec.variants()),
            None => spec.variants().to_vec(),
        })
    }

    /// # Errors
    ///
    /// Returns `ExerciseError::Poisoned` if the lock is poisoned.
    pub fn is_completed(&self, exercise: &ExerciseId) -> Result<bool, ExerciseError> {
        let guard = self.lock()?;
        Ok(guard
            .registries
            .get(&exercise.module)
            .is_some_and(|r| r.is_completed(&exercise.variant)))
    }

    /// # Errors
    ///
    /// Returns `ExerciseError::Poisoned` if the lock is poisoned.
    pub fn completion_records(
        &self,
        module: ModuleId,
    ) -> Result<Vec<(VariantKey, CompletionRecord)>, ExerciseError> {
        let guard = self.lock()?;
        Ok(guard
            .registries
            .get(&module)
            .map(|r| {
                r.records()
                    .map(|(key, record)| (key.clone(), record.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns `ExerciseError::Poisoned` if the lock is poisoned.
    pub fn percent(&self, stage: KeyStage) -> Result<f64, ExerciseError> {
        Ok(self.lock()?.tracker.current_percent(stage))
    }

    /// # Errors
    ///
    /// Returns `ExerciseError::Poisoned` if the lock is poisoned.
    pub fn total_score(&self) -> Result<u64, ExerciseError> {
        Ok(self.lock()?.total_score)
    }

    /// Persistable copy of the tracker and score.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::Poisoned` if the lock is poisoned.
    pub fn progress_record(&self) -> Result<ProgressRecord, ExerciseError> {
        let guard = self.lock()?;
        Ok(ProgressRecord {
            snapshot: guard.tracker.snapshot(),
            total_score: guard.total_score,
        })
    }

    /// # Errors
    ///
    /// Returns `ExerciseError::Poisoned` if the lock is poisoned.
    pub fn view(&self) -> Result<ProgressView, ExerciseError> {
        let guard = self.lock()?;
        let modules = self
            .curriculum
            .modules()
            .map(|spec| {
                let registry = guard.registries.get(&spec.id());
                let completed = registry.map_or(0, |r| {
                    spec.variants()
                        .iter()
                        .filter(|key| r.is_completed(key))
                        .count()
                });
                ModuleProgress {
                    module: spec.id(),
                    title: spec.title().to_string(),
                    stage: spec.stage(),
                    completed,
                    total: spec.variants().len(),
                    points: registry.map_or(0, CompletionRegistry::total_points),
                    is_complete: registry.is_some_and(|r| r.all_completed(spec.variants())),
                }
            })
            .collect();

        Ok(ProgressView {
            ks1_percent: guard.tracker.current_percent(KeyStage::Ks1),
            ks2_percent: guard.tracker.current_percent(KeyStage::Ks2),
            total_score: guard.total_score,
            modules,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, BookState>, ExerciseError> {
        self.state.lock().map_err(|_| ExerciseError::Poisoned)
    }
}
