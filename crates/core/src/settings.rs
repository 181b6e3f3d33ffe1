use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::curriculum::ModuleSpec;
use crate::model::SessionLimits;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const MAX_ATTEMPTS_CEILING: u32 = 10;
pub const DEFAULT_ROUND_SIZE: usize = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("max attempts must be between 1 and {MAX_ATTEMPTS_CEILING}, got {0}")]
    InvalidMaxAttempts(u32),

    #[error("time budget override must be > 0 seconds")]
    InvalidTimeBudget,

    #[error("round size must be > 0")]
    InvalidRoundSize,
}

/// Validated exercise settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseSettings {
    max_attempts: u32,
    timers_enabled: bool,
    time_budget_secs: Option<u32>,
    round_size: usize,
}

/// Unvalidated settings as read from the environment or flags.
#[derive(Debug, Clone, Default)]
pub struct ExerciseSettingsDraft {
    pub max_attempts: Option<u32>,
    pub timers_enabled: Option<bool>,
    pub time_budget_secs: Option<u32>,
    pub round_size: Option<usize>,
}

impl ExerciseSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the draft, filling unset values with defaults.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if any value is out of range.
    pub fn validate(self) -> Result<ExerciseSettings, SettingsError> {
        let max_attempts = self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
        if !(1..=MAX_ATTEMPTS_CEILING).contains(&max_attempts) {
            return Err(SettingsError::InvalidMaxAttempts(max_attempts));
        }
        if self.time_budget_secs == Some(0) {
            return Err(SettingsError::InvalidTimeBudget);
        }
        let round_size = self.round_size.unwrap_or(DEFAULT_ROUND_SIZE);
        if round_size == 0 {
            return Err(SettingsError::InvalidRoundSize);
        }

        Ok(ExerciseSettings {
            max_attempts,
            timers_enabled: self.timers_enabled.unwrap_or(true),
            time_budget_secs: self.time_budget_secs,
            round_size,
        })
    }
}

impl ExerciseSettings {
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn timers_enabled(&self) -> bool {
        self.timers_enabled
    }

    #[must_use]
    pub fn time_budget_secs(&self) -> Option<u32> {
        self.time_budget_secs
    }

    #[must_use]
    pub fn round_size(&self) -> usize {
        self.round_size
    }

    /// Session limits for a module under these settings.
    ///
    /// The override only applies to modules that are timed in the catalog;
    /// identification tasks stay untimed.
    #[must_use]
    pub fn limits_for(&self, module: &ModuleSpec) -> SessionLimits {
        let budget = if self.timers_enabled {
            module
                .time_budget_secs()
                .map(|base| self.time_budget_secs.unwrap_or(base))
        } else {
            None
        };
        // Both values were validated above.
        SessionLimits::new(self.max_attempts, budget).unwrap_or_default()
    }
}

impl Default for ExerciseSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timers_enabled: true,
            time_budget_secs: None,
            round_size: DEFAULT_ROUND_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::Curriculum;
    use crate::model::ModuleId;

    #[test]
    fn empty_draft_gives_defaults() {
        let settings = ExerciseSettingsDraft::new().validate().unwrap();
        assert_eq!(settings, ExerciseSettings::default());
    }

    #[test]
    fn draft_rejects_out_of_range_values() {
        let draft = ExerciseSettingsDraft {
            max_attempts: Some(0),
            ..ExerciseSettingsDraft::default()
        };
        assert_eq!(draft.validate(), Err(SettingsError::InvalidMaxAttempts(0)));

        let draft = ExerciseSettingsDraft {
            time_budget_secs: Some(0),
            ..ExerciseSettingsDraft::default()
        };
        assert_eq!(draft.validate(), Err(SettingsError::InvalidTimeBudget));

        let draft = ExerciseSettingsDraft {
            round_size: Some(0),
            ..ExerciseSettingsDraft::default()
        };
        assert_eq!(draft.validate(), Err(SettingsError::InvalidRoundSize));
    }

    #[test]
    fn limits_follow_catalog_and_overrides() {
        let curriculum = Curriculum::standard();
        let circle = curriculum.module(ModuleId::Circle).unwrap();
        let shapes = curriculum.module(ModuleId::Shapes2D).unwrap();

        let defaults = ExerciseSettings::default();
        assert_eq!(defaults.limits_for(circle).time_budget_secs(), Some(180));
        assert_eq!(defaults.limits_for(shapes).time_budget_secs(), None);

        let fast = ExerciseSettingsDraft {
            max_attempts: Some(5),
            time_budget_secs: Some(30),
            ..ExerciseSettingsDraft::default()
        }
        .validate()
        .unwrap();
        assert_eq!(fast.limits_for(circle).time_budget_secs(), Some(30));
        assert_eq!(fast.limits_for(circle).max_attempts(), 5);
        assert_eq!(fast.limits_for(shapes).time_budget_secs(), None);

        let untimed = ExerciseSettingsDraft {
            timers_enabled: Some(false),
            ..ExerciseSettingsDraft::default()
        }
        .validate()
        .unwrap();
        assert_eq!(untimed.limits_for(circle).time_budget_secs(), None);
    }
}
