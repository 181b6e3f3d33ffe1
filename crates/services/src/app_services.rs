use std::sync::Arc;

use shapeville_core::curriculum::Curriculum;
use shapeville_core::model::KeyStage;
use shapeville_core::progress::ProgressTracker;
use shapeville_core::registry::CompletionRegistry;
use shapeville_core::settings::ExerciseSettings;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::exercises::{ExerciseLoopService, ProgressBook};
use crate::listener::{ScoreBoard, ScoreListener};

/// Assembles app-facing services from persisted state.
#[derive(Clone)]
pub struct AppServices {
    curriculum: Arc<Curriculum>,
    exercises: Arc<ExerciseLoopService>,
    score_board: Arc<ScoreBoard>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or restoring
    /// progress fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: ExerciseSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(storage, clock, settings).await
    }

    /// Build services on top of in-memory storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if restoring progress fails.
    pub async fn new_in_memory(
        clock: Clock,
        settings: ExerciseSettings,
    ) -> Result<Self, AppServicesError> {
        Self::from_storage(Storage::in_memory(), clock, settings).await
    }

    /// Restore registries, tracker and score from `storage`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` for read failures or out-of-range stored
    /// progress.
    pub async fn from_storage(
        storage: Storage,
        clock: Clock,
        settings: ExerciseSettings,
    ) -> Result<Self, AppServicesError> {
        let curriculum = Arc::new(Curriculum::standard());

        let mut registries = Vec::new();
        for module in curriculum.modules() {
            let rows = storage.completions.list_completions(module.id()).await?;
            registries.push(CompletionRegistry::from_persisted(module.id(), rows));
        }

        let progress = storage.progress.load_progress().await?;
        let tracker = ProgressTracker::from_snapshot(progress.snapshot)?;
        log::info!(
            "restored progress: KS1 {:.1}%, KS2 {:.1}%, score {}",
            tracker.current_percent(KeyStage::Ks1),
            tracker.current_percent(KeyStage::Ks2),
            progress.total_score
        );

        let book = ProgressBook::restore(
            Arc::clone(&curriculum),
            registries,
            tracker,
            progress.total_score,
        );
        let score_board = Arc::new(ScoreBoard::new(progress.total_score));
        let listener: Arc<dyn ScoreListener> = score_board.clone();
        let exercises = Arc::new(
            ExerciseLoopService::new(
                clock,
                settings,
                book,
                Arc::clone(&storage.completions),
                Arc::clone(&storage.progress),
            )
            .with_listener(listener),
        );

        Ok(Self {
            curriculum,
            exercises,
            score_board,
        })
    }

    #[must_use]
    pub fn curriculum(&self) -> Arc<Curriculum> {
        Arc::clone(&self.curriculum)
    }

    #[must_use]
    pub fn exercises(&self) -> Arc<ExerciseLoopService> {
        Arc::clone(&self.exercises)
    }

    #[must_use]
    pub fn score_board(&self) -> Arc<ScoreBoard> {
        Arc::clone(&self.score_board)
    }
}
