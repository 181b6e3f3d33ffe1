use serde::{Deserialize, Serialize};

use crate::session::SessionState;

/// Scoring family of an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseFamily {
    /// Simple tasks: 3 / 2 / 1 points, nothing after the third attempt.
    Standard,
    /// Harder tasks (solids, circles, sectors, compound shapes): 6 / 4 / 2,
    /// with 2 points for any later successful attempt.
    HighValue,
}

impl ExerciseFamily {
    #[must_use]
    pub fn policy(self) -> ScoringPolicy {
        match self {
            ExerciseFamily::Standard => ScoringPolicy::STANDARD,
            ExerciseFamily::HighValue => ScoringPolicy::HIGH_VALUE,
        }
    }
}

/// Points awarded by attempt index.
///
/// Points never increase with the attempt index. Only a correct answer
/// scores; timeouts and exhausted attempts always score zero.
///
/// # Examples
///
/// ```
/// # use shapeville_core::scoring::{ExerciseFamily, points_for};
/// assert_eq!(points_for(1, ExerciseFamily::Standard), 3);
/// assert_eq!(points_for(4, ExerciseFamily::HighValue), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringPolicy {
    first: u32,
    second: u32,
    third: u32,
    later: u32,
}

impl ScoringPolicy {
    pub const STANDARD: Self = Self {
        first: 3,
        second: 2,
        third: 1,
        later: 0,
    };

    pub const HIGH_VALUE: Self = Self {
        first: 6,
        second: 4,
        third: 2,
        later: 2,
    };

    /// Points for a correct answer given on attempt number `attempts_used`
    /// (1-based). Zero attempts means nothing was answered.
    #[must_use]
    pub fn points_for(&self, attempts_used: u32) -> u32 {
        match attempts_used {
            0 => 0,
            1 => self.first,
            2 => self.second,
            3 => self.third,
            _ => self.later,
        }
    }

    /// Points for a session that ended in `state` after `attempts_used` attempts.
    #[must_use]
    pub fn award(&self, state: SessionState, attempts_used: u32) -> u32 {
        match state {
            SessionState::CorrectlySolved => self.points_for(attempts_used),
            SessionState::Active | SessionState::ExhaustedAttempts | SessionState::TimedOut => 0,
        }
    }
}

/// Shorthand for `family.policy().points_for(attempts_used)`.
#[must_use]
pub fn points_for(attempts_used: u32, family: ExerciseFamily) -> u32 {
    family.policy().points_for(attempts_used)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table() {
        assert_eq!(points_for(1, ExerciseFamily::Standard), 3);
        assert_eq!(points_for(2, ExerciseFamily::Standard), 2);
        assert_eq!(points_for(3, ExerciseFamily::Standard), 1);
        assert_eq!(points_for(4, ExerciseFamily::Standard), 0);
        assert_eq!(points_for(10, ExerciseFamily::Standard), 0);
    }

    #[test]
    fn high_value_table_keeps_rewarding_persistence() {
        assert_eq!(points_for(1, ExerciseFamily::HighValue), 6);
        assert_eq!(points_for(2, ExerciseFamily::HighValue), 4);
        assert_eq!(points_for(3, ExerciseFamily::HighValue), 2);
        assert_eq!(points_for(5, ExerciseFamily::HighValue), 2);
    }

    #[test]
    fn points_never_increase_with_attempts() {
        for family in [ExerciseFamily::Standard, ExerciseFamily::HighValue] {
            for n in 1..12 {
                assert!(points_for(n, family) >= points_for(n + 1, family));
            }
        }
    }

    #[test]
    fn unsolved_states_score_zero() {
        let policy = ExerciseFamily::HighValue.policy();
        assert_eq!(policy.award(SessionState::TimedOut, 1), 0);
        assert_eq!(policy.award(SessionState::ExhaustedAttempts, 3), 0);
        assert_eq!(policy.award(SessionState::Active, 1), 0);
        assert_eq!(policy.award(SessionState::CorrectlySolved, 2), 4);
    }
}
