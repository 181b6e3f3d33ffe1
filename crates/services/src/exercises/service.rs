use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

use shapeville_core::model::{ExerciseId, Problem};
use shapeville_core::session::{
    ExerciseSession, SessionError, SessionState, SubmitOutcome, TickOutcome,
};

//
// ─── RUN ID ────────────────────────────────────────────────────────────────────
//

/// Identifies one attempt at a question, for logs and the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

impl RunId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── RUN ───────────────────────────────────────────────────────────────────────
//

/// A live session owned by exactly one caller.
///
/// Submissions and ticks go through `ExerciseLoopService`, which records the
/// outcome once the session reaches a terminal state. Dropping or
/// abandoning an unfinished run awards nothing.
#[derive(Debug)]
pub struct ExerciseRun {
    id: RunId,
    session: ExerciseSession,
    started_at: DateTime<Utc>,
    recorded: bool,
}

impl ExerciseRun {
    pub(crate) fn new(problem: Problem, started_at: DateTime<Utc>) -> Self {
        Self {
            id: RunId::new(),
            session: ExerciseSession::start(problem),
            started_at,
            recorded: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> RunId {
        self.id
    }

    #[must_use]
    pub fn session(&self) -> &ExerciseSession {
        &self.session
    }

    #[must_use]
    pub fn exercise(&self) -> &ExerciseId {
        self.session.exercise()
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.session.problem().prompt
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.session.is_complete()
    }

    /// True once the outcome has been applied to the progress book.
    #[must_use]
    pub fn is_recorded(&self) -> bool {
        self.recorded
    }

    /// Leave the question without finishing it.
    pub fn abandon(self) {
        if !self.session.is_complete() {
            log::warn!(
                "run {} for {} abandoned after {} attempt(s)",
                self.id,
                self.session.exercise(),
                self.session.attempts_used()
            );
        }
    }

    pub(crate) fn submit(&mut self, raw: &str) -> Result<SubmitOutcome, SessionError> {
        self.session.submit(raw)
    }

    pub(crate) fn tick(&mut self) -> TickOutcome {
        self.session.tick()
    }

    pub(crate) fn mark_recorded(&mut self) {
        self.recorded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapeville_core::model::{AnswerKey, ModuleId, SessionLimits, VariantKey};
    use shapeville_core::scoring::ExerciseFamily;
    use shapeville_core::time::fixed_now;

    fn run() -> ExerciseRun {
        let problem = Problem::new(
            ExerciseId::new(ModuleId::Angles, VariantKey::named("right angle").unwrap()),
            "Which angle is exactly 90 degrees?",
            AnswerKey::label("right angle").unwrap(),
            ExerciseFamily::Standard,
            SessionLimits::untimed(),
        );
        ExerciseRun::new(problem, fixed_now())
    }

    #[test]
    fn runs_get_distinct_ids() {
        assert_ne!(run().id(), run().id());
    }

    #[test]
    fn new_run_is_active_and_unrecorded() {
        let mut run = run();
        assert_eq!(run.state(), SessionState::Active);
        assert!(!run.is_recorded());
        run.submit("Right Angle").unwrap();
        assert!(run.is_finished());
        assert!(!run.is_recorded());
    }
}
