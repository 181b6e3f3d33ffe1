use thiserror::Error;

use crate::model::{AnswerKey, ExerciseId};
use crate::scoring::ExerciseFamily;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LimitsError {
    #[error("max attempts must be > 0")]
    ZeroAttempts,

    #[error("time budget must be > 0 seconds when set")]
    ZeroTimeBudget,
}

/// Attempt and time budget for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    max_attempts: u32,
    time_budget_secs: Option<u32>,
}

impl SessionLimits {
    /// # Errors
    ///
    /// Returns `LimitsError` if `max_attempts` is zero or the budget is `Some(0)`.
    pub fn new(max_attempts: u32, time_budget_secs: Option<u32>) -> Result<Self, LimitsError> {
        if max_attempts == 0 {
            return Err(LimitsError::ZeroAttempts);
        }
        if time_budget_secs == Some(0) {
            return Err(LimitsError::ZeroTimeBudget);
        }
        Ok(Self {
            max_attempts,
            time_budget_secs,
        })
    }

    /// Three attempts, no timer.
    #[must_use]
    pub fn untimed() -> Self {
        Self {
            max_attempts: 3,
            time_budget_secs: None,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn time_budget_secs(&self) -> Option<u32> {
        self.time_budget_secs
    }
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self::untimed()
    }
}

/// A generated question handed over by the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    pub exercise: ExerciseId,
    pub prompt: String,
    pub answer: AnswerKey,
    pub family: ExerciseFamily,
    pub limits: SessionLimits,
}

impl Problem {
    #[must_use]
    pub fn new(
        exercise: ExerciseId,
        prompt: impl Into<String>,
        answer: AnswerKey,
        family: ExerciseFamily,
        limits: SessionLimits,
    ) -> Self {
        Self {
            exercise,
            prompt: prompt.into(),
            answer,
            family,
            limits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_reject_zero_values() {
        assert_eq!(SessionLimits::new(0, None), Err(LimitsError::ZeroAttempts));
        assert_eq!(
            SessionLimits::new(3, Some(0)),
            Err(LimitsError::ZeroTimeBudget)
        );
        let limits = SessionLimits::new(3, Some(180)).unwrap();
        assert_eq!(limits.max_attempts(), 3);
        assert_eq!(limits.time_budget_secs(), Some(180));
    }
}
