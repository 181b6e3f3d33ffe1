use std::sync::Arc;

use shapeville_core::model::{ExerciseId, ModuleId, Problem, SessionLimits};
use shapeville_core::session::{SubmitOutcome, TickOutcome};
use shapeville_core::settings::ExerciseSettings;
use storage::repository::{CompletionRepository, ProgressRepository};
use tokio::sync::Mutex as AsyncMutex;

use super::book::{CompletionOutcome, ProgressBook};
use super::plan::{RoundPlan, RoundPlanner};
use super::progress::ProgressView;
use super::service::ExerciseRun;
use crate::Clock;
use crate::error::ExerciseError;
use crate::listener::ScoreListener;

/// Result of one submission.
#[derive(Debug)]
pub struct SubmitResult {
    pub outcome: SubmitOutcome,
    /// Set when this submission finished the run.
    pub completion: Option<CompletionOutcome>,
    /// Set when the completion is in the book but could not be saved.
    /// [`ExerciseLoopService::sync`] retries.
    pub persist_error: Option<ExerciseError>,
}

/// Result of one tick.
#[derive(Debug)]
pub struct TickResult {
    pub tick: TickOutcome,
    /// Set when this tick timed the run out.
    pub completion: Option<CompletionOutcome>,
    pub persist_error: Option<ExerciseError>,
}

#[derive(Debug, Default)]
struct Recorded {
    completion: Option<CompletionOutcome>,
    persist_error: Option<ExerciseError>,
}

/// Orchestrates runs, scoring, progress credit and persistence.
#[derive(Clone)]
pub struct ExerciseLoopService {
    clock: Clock,
    settings: ExerciseSettings,
    book: ProgressBook,
    completions: Arc<dyn CompletionRepository>,
    progress: Arc<dyn ProgressRepository>,
    listeners: Vec<Arc<dyn ScoreListener>>,
    shuffle: bool,
    // Held from taking a progress snapshot until it is saved, so an older
    // snapshot never lands after a newer one.
    save_gate: Arc<AsyncMutex<()>>,
}

impl ExerciseLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: ExerciseSettings,
        book: ProgressBook,
        completions: Arc<dyn CompletionRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            settings,
            book,
            completions,
            progress,
            listeners: Vec::new(),
            shuffle: true,
            save_gate: Arc::new(AsyncMutex::new(())),
        }
    }

    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn ScoreListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Enable or disable shuffling when planning rounds.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    #[must_use]
    pub fn book(&self) -> &ProgressBook {
        &self.book
    }

    #[must_use]
    pub fn settings(&self) -> ExerciseSettings {
        self.settings
    }

    /// Session limits for problems of `module` under the current settings.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::UnknownModule` if the module is not in the catalog.
    pub fn limits_for(&self, module: ModuleId) -> Result<SessionLimits, ExerciseError> {
        Ok(self.settings.limits_for(self.book.module_spec(module)?))
    }

    /// Start a run for a generated problem.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::UnknownExercise` if the problem's variant is not
    /// in the catalog and `ExerciseError::FamilyMismatch` if it would be
    /// scored on another table than its module's.
    pub fn start(&self, problem: Problem) -> Result<ExerciseRun, ExerciseError> {
        let spec = self.book.ensure_known(&problem.exercise)?;
        if problem.family != spec.family() {
            return Err(ExerciseError::FamilyMismatch {
                exercise: problem.exercise,
                expected: spec.family(),
                found: problem.family,
            });
        }
        let run = ExerciseRun::new(problem, self.clock.now());
        log::debug!("run {} started for {}", run.id(), run.exercise());
        Ok(run)
    }

    /// Submit an answer and record the outcome if the run finished.
    ///
    /// A failed save does not hide the verdict: it is reported through
    /// [`SubmitResult::persist_error`] while the book keeps the outcome.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::Session` if the run was already finished, or a
    /// book error if the outcome could not be applied.
    pub async fn submit(
        &self,
        run: &mut ExerciseRun,
        raw: &str,
    ) -> Result<SubmitResult, ExerciseError> {
        let outcome = run.submit(raw)?;
        log::debug!(
            "run {} verdict {:?}, {} attempt(s) left",
            run.id(),
            outcome.verdict,
            outcome.attempts_remaining
        );
        let recorded = self.record(run).await?;
        Ok(SubmitResult {
            outcome,
            completion: recorded.completion,
            persist_error: recorded.persist_error,
        })
    }

    /// Advance the run's countdown by one second.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError` if a timeout could not be applied to the book.
    pub async fn tick(&self, run: &mut ExerciseRun) -> Result<TickResult, ExerciseError> {
        let tick = run.tick();
        let recorded = self.record(run).await?;
        Ok(TickResult {
            tick,
            completion: recorded.completion,
            persist_error: recorded.persist_error,
        })
    }

    /// Apply a finished run to the book exactly once, then save it.
    async fn record(&self, run: &mut ExerciseRun) -> Result<Recorded, ExerciseError> {
        if !run.is_finished() || run.is_recorded() {
            return Ok(Recorded::default());
        }

        let session = run.session();
        let completion = self.book.record_outcome(
            run.exercise(),
            session.state(),
            session.attempts_used(),
            session.points_awarded(),
            self.clock.now(),
        )?;
        run.mark_recorded();

        log::info!(
            "{} finished as {:?}: +{} point(s), progress credited: {}",
            completion.exercise,
            completion.state,
            completion.points,
            completion.progress_credited
        );
        if completion.module_complete {
            log::info!("module {} fully completed", completion.exercise.module);
        }

        if completion.points > 0 {
            for listener in &self.listeners {
                listener.on_score_delta(&completion.exercise, completion.points);
            }
        }

        let persist_error = self.persist(&completion).await.err();
        Ok(Recorded {
            completion: Some(completion),
            persist_error,
        })
    }

    /// Write every completion and the current progress to storage.
    ///
    /// Safe to repeat: completions keep their first record and credited
    /// exercises are only ever added.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::Storage` if persistence fails.
    pub async fn sync(&self) -> Result<(), ExerciseError> {
        let _gate = self.save_gate.lock().await;
        for module in self.book.curriculum().modules() {
            let module = module.id();
            for (key, record) in self.book.completion_records(module)? {
                let exercise = ExerciseId::new(module, key);
                self.completions
                    .upsert_completion(&exercise, &record)
                    .await?;
            }
        }
        let record = self.book.progress_record()?;
        self.progress.save_progress(&record).await?;
        log::debug!("progress synced, total score {}", record.total_score);
        Ok(())
    }

    /// "Play again": clear a module's completions in memory and in storage.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError` for unknown modules or storage failures.
    pub async fn reset_module(&self, module: ModuleId) -> Result<usize, ExerciseError> {
        let _gate = self.save_gate.lock().await;
        let cleared = self.book.reset_module(module)?;
        self.completions.clear_module(module).await?;
        log::info!("module {module} reset, {cleared} completion(s) cleared");
        Ok(cleared)
    }

    /// Pick the next round of `module`, resetting it first if too few
    /// variants are left open.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError` for unknown modules or storage failures.
    pub async fn plan_round(&self, module: ModuleId) -> Result<RoundPlan, ExerciseError> {
        let spec = self.book.module_spec(module)?;
        let open = self.book.uncompleted(module)?;
        let plan = RoundPlanner::new(self.settings.round_size())
            .with_shuffle(self.shuffle)
            .plan(spec, open);
        if plan.reset_required {
            self.reset_module(module).await?;
        }
        log::debug!("planned {} variant(s) of {module}", plan.len());
        Ok(plan)
    }

    /// # Errors
    ///
    /// Returns `ExerciseError::Poisoned` if the book lock is poisoned.
    pub fn view(&self) -> Result<ProgressView, ExerciseError> {
        self.book.view()
    }

    async fn persist(&self, completion: &CompletionOutcome) -> Result<(), ExerciseError> {
        let Some(mark) = completion.mark.as_ref() else {
            return Ok(());
        };

        let _gate = self.save_gate.lock().await;
        let stored = async {
            // A reset may have cleared the variant since it was recorded.
            if self.book.is_completed(&completion.exercise)? {
                self.completions
                    .upsert_completion(&completion.exercise, &mark.record)
                    .await?;
            }
            let record = self.book.progress_record()?;
            self.progress.save_progress(&record).await?;
            Ok::<(), ExerciseError>(())
        }
        .await;

        if let Err(err) = &stored {
            log::warn!(
                "persisting {} failed: {err}; progress stays in memory until the next sync",
                completion.exercise
            );
        }
        stored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapeville_core::curriculum::Curriculum;
    use shapeville_core::model::{AnswerKey, KeyStage, VariantKey};
    use shapeville_core::session::{SessionState, Verdict};
    use shapeville_core::time::fixed_clock;
    use storage::repository::Storage;

    fn service() -> ExerciseLoopService {
        let storage = Storage::in_memory();
        ExerciseLoopService::new(
            fixed_clock(),
            ExerciseSettings::default(),
            ProgressBook::new(Arc::new(Curriculum::standard())),
            storage.completions,
            storage.progress,
        )
        .with_shuffle(false)
    }

    fn sector_problem(svc: &ExerciseLoopService, n: u32, answer: f64) -> Problem {
        Problem::new(
            ExerciseId::new(ModuleId::Sectors, VariantKey::numbered(n)),
            "sector area?",
            AnswerKey::numeric(answer, 0.01).unwrap(),
            shapeville_core::scoring::ExerciseFamily::HighValue,
            svc.limits_for(ModuleId::Sectors).unwrap(),
        )
    }

    #[tokio::test]
    async fn invalid_input_is_not_recorded() {
        let svc = service();
        let mut run = svc.start(sector_problem(&svc, 1, 12.56)).unwrap();
        let result = svc.submit(&mut run, "abc").await.unwrap();
        assert!(matches!(result.outcome.verdict, Verdict::Invalid(_)));
        assert!(result.completion.is_none());
        assert_eq!(run.session().attempts_used(), 0);
    }

    #[tokio::test]
    async fn finish_happens_once() {
        let svc = service();
        let mut run = svc.start(sector_problem(&svc, 2, 12.56)).unwrap();
        let result = svc.submit(&mut run, "12.56").await.unwrap();
        let completion = result.completion.unwrap();
        assert_eq!(completion.points, 6);
        assert_eq!(completion.stage_percent, 3.1);

        let after = svc.tick(&mut run).await.unwrap();
        assert!(after.completion.is_none());
        assert!(after.persist_error.is_none());
        assert!(svc.submit(&mut run, "12.56").await.is_err());
        assert_eq!(svc.book().total_score().unwrap(), 6);
    }

    #[tokio::test]
    async fn problems_must_use_their_module_family() {
        let svc = service();
        let mut problem = sector_problem(&svc, 1, 12.56);
        problem.family = shapeville_core::scoring::ExerciseFamily::Standard;
        assert!(matches!(
            svc.start(problem),
            Err(ExerciseError::FamilyMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_problems_are_rejected() {
        let svc = service();
        let problem = sector_problem(&svc, 99, 1.0);
        assert!(matches!(
            svc.start(problem),
            Err(ExerciseError::UnknownExercise(_))
        ));
    }

    #[tokio::test]
    async fn plan_round_resets_exhausted_modules() {
        let svc = service();
        for key in ["area", "circumference"] {
            let problem = Problem::new(
                ExerciseId::new(ModuleId::Circle, VariantKey::named(key).unwrap()),
                "circle?",
                AnswerKey::numeric(31.4, 0.01).unwrap(),
                shapeville_core::scoring::ExerciseFamily::Standard,
                svc.limits_for(ModuleId::Circle).unwrap(),
            );
            let mut run = svc.start(problem).unwrap();
            svc.submit(&mut run, "31.4").await.unwrap();
        }
        assert!(svc.view().unwrap().module(ModuleId::Circle).unwrap().is_complete);

        let plan = svc.plan_round(ModuleId::Circle).await.unwrap();
        assert!(plan.reset_required);
        assert_eq!(plan.len(), 2);
        assert_eq!(svc.book().uncompleted(ModuleId::Circle).unwrap().len(), 2);
        assert_eq!(svc.book().percent(KeyStage::Ks2).unwrap(), 25.0);
    }

    #[tokio::test]
    async fn timeout_is_recorded_on_tick() {
        let settings = shapeville_core::settings::ExerciseSettingsDraft {
            time_budget_secs: Some(2),
            ..Default::default()
        }
        .validate()
        .unwrap();
        let storage = Storage::in_memory();
        let svc = ExerciseLoopService::new(
            fixed_clock(),
            settings,
            ProgressBook::new(Arc::new(Curriculum::standard())),
            storage.completions,
            storage.progress,
        );
        let mut run = svc.start(sector_problem(&svc, 3, 5.0)).unwrap();
        assert!(svc.tick(&mut run).await.unwrap().completion.is_none());
        let expired = svc.tick(&mut run).await.unwrap();
        assert!(expired.tick.expired);
        let completion = expired.completion.unwrap();
        assert_eq!(completion.state, SessionState::TimedOut);
        assert_eq!(completion.points, 0);
        assert!(completion.progress_credited);
    }
}
