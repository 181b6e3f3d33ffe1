mod answer;
mod ids;
mod problem;
mod stage;

pub use answer::{AnswerKey, AnswerKeyError, InvalidAnswer, numeric_matches};
pub use ids::{ExerciseId, ModuleId, VariantKey, VariantKeyError};
pub use problem::{LimitsError, Problem, SessionLimits};
pub use stage::KeyStage;
