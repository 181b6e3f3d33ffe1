#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod exercises;
pub mod listener;

pub use shapeville_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, ExerciseError};
pub use exercises::{
    CompletionOutcome, ExerciseLoopService, ExerciseRun, ModuleProgress, ProgressBook,
    ProgressView, RoundPlan, RoundPlanner, RunId, SubmitResult, TickResult,
};
pub use listener::{ScoreBoard, ScoreListener};
