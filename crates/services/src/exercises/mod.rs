mod book;
mod plan;
mod progress;
mod service;
mod workflow;

// Public API of the exercise subsystem.
pub use crate::error::ExerciseError;
pub use book::{CompletionOutcome, ProgressBook};
pub use plan::{RoundPlan, RoundPlanner};
pub use progress::{ModuleProgress, ProgressView};
pub use service::{ExerciseRun, RunId};
pub use workflow::{ExerciseLoopService, SubmitResult, TickResult};
