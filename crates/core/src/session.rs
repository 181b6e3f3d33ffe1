use thiserror::Error;

use crate::model::{AnswerKey, ExerciseId, InvalidAnswer, Problem, SessionLimits};
use crate::scoring::ExerciseFamily;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session for {exercise} already finished ({state:?})")]
    Finished {
        exercise: ExerciseId,
        state: SessionState,
    },
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle of a single question.
///
/// `Active` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Active,
    CorrectlySolved,
    ExhaustedAttempts,
    TimedOut,
}

impl SessionState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionState::Active)
    }
}

/// Result of checking one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
    /// Not a syntactically valid answer; no attempt was consumed.
    Invalid(InvalidAnswer),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub verdict: Verdict,
    pub attempts_remaining: u32,
    pub state: SessionState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// `None` for untimed sessions.
    pub seconds_left: Option<u32>,
    pub expired: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Attempt and time lifecycle of one question instance.
///
/// The session never schedules anything itself; the host calls [`tick`]
/// once per second and [`submit`] on each input commit.
///
/// [`tick`]: ExerciseSession::tick
/// [`submit`]: ExerciseSession::submit
///
/// # Examples
///
/// ```
/// # use shapeville_core::model::{AnswerKey, ExerciseId, ModuleId, Problem, SessionLimits, VariantKey};
/// # use shapeville_core::scoring::ExerciseFamily;
/// # use shapeville_core::session::{ExerciseSession, SessionState, Verdict};
/// let problem = Problem::new(
///     ExerciseId::new(ModuleId::Area, VariantKey::named("rectangle")?),
///     "Area of a 5 x 10 rectangle?",
///     AnswerKey::numeric(50.0, 0.01)?,
///     ExerciseFamily::Standard,
///     SessionLimits::new(3, Some(180))?,
/// );
/// let mut session = ExerciseSession::start(problem);
/// let out = session.submit("50")?;
/// assert_eq!(out.verdict, Verdict::Correct);
/// assert_eq!(session.state(), SessionState::CorrectlySolved);
/// assert_eq!(session.points_awarded(), 3);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseSession {
    problem: Problem,
    attempts_used: u32,
    remaining_secs: Option<u32>,
    state: SessionState,
}

impl ExerciseSession {
    /// Begin a fresh session for `problem`.
    #[must_use]
    pub fn start(problem: Problem) -> Self {
        let remaining_secs = problem.limits.time_budget_secs();
        Self {
            problem,
            attempts_used: 0,
            remaining_secs,
            state: SessionState::Active,
        }
    }

    #[must_use]
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    #[must_use]
    pub fn exercise(&self) -> &ExerciseId {
        &self.problem.exercise
    }

    #[must_use]
    pub fn family(&self) -> ExerciseFamily {
        self.problem.family
    }

    #[must_use]
    pub fn answer_key(&self) -> &AnswerKey {
        &self.problem.answer
    }

    #[must_use]
    pub fn limits(&self) -> SessionLimits {
        self.problem.limits
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    #[must_use]
    pub fn attempts_remaining(&self) -> u32 {
        self.problem
            .limits
            .max_attempts()
            .saturating_sub(self.attempts_used)
    }

    #[must_use]
    pub fn remaining_secs(&self) -> Option<u32> {
        self.remaining_secs
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state.is_terminal()
    }

    /// Points the session earned; zero until it is correctly solved.
    #[must_use]
    pub fn points_awarded(&self) -> u32 {
        self.problem
            .family
            .policy()
            .award(self.state, self.attempts_used)
    }

    /// Check a raw answer.
    ///
    /// Invalid input is reported through [`Verdict::Invalid`] and never counts
    /// as an attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` if the session already reached a
    /// terminal state; nothing is changed in that case.
    pub fn submit(&mut self, raw: &str) -> Result<SubmitOutcome, SessionError> {
        self.ensure_active()?;

        let correct = match self.problem.answer.check(raw) {
            Ok(correct) => correct,
            Err(reason) => {
                return Ok(self.outcome(Verdict::Invalid(reason)));
            }
        };

        self.attempts_used += 1;
        let verdict = if correct {
            self.state = SessionState::CorrectlySolved;
            Verdict::Correct
        } else {
            if self.attempts_used >= self.problem.limits.max_attempts() {
                self.state = SessionState::ExhaustedAttempts;
            }
            Verdict::Incorrect
        };

        Ok(self.outcome(verdict))
    }

    /// Advance the countdown by one second.
    ///
    /// A no-op once the session is terminal or when it has no timer.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state == SessionState::Active {
            if let Some(secs) = self.remaining_secs.as_mut() {
                *secs = secs.saturating_sub(1);
                if *secs == 0 {
                    self.state = SessionState::TimedOut;
                }
            }
        }

        TickOutcome {
            seconds_left: self.remaining_secs,
            expired: self.state == SessionState::TimedOut,
        }
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.state.is_terminal() {
            return Err(SessionError::Finished {
                exercise: self.problem.exercise.clone(),
                state: self.state,
            });
        }
        Ok(())
    }

    fn outcome(&self, verdict: Verdict) -> SubmitOutcome {
        SubmitOutcome {
            verdict,
            attempts_remaining: self.attempts_remaining(),
            state: self.state,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
