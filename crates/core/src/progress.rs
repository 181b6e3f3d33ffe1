use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ExerciseId, KeyStage};

/// Stored percentages are rounded to six decimals so repeated fractional
/// increments (e.g. 25 / 6) do not drift.
const PRECISION: f64 = 1_000_000.0;

pub const PROGRESS_MAX: f64 = 100.0;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("task weight must be finite and within [0, 1], got {0}")]
    InvalidWeight(f64),

    #[error("stored percent must be finite and within [0, 100], got {0}")]
    InvalidPercent(f64),
}

/// Key-stage completion percentages.
///
/// Crediting is idempotent per exercise: [`credit`] remembers every id it
/// has counted, so a repeated or retried notification never adds twice.
///
/// [`credit`]: ProgressTracker::credit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressTracker {
    ks1: f64,
    ks2: f64,
    counted: BTreeSet<ExerciseId>,
}

/// Serializable view of a tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub ks1_percent: f64,
    pub ks2_percent: f64,
    pub counted: Vec<ExerciseId>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns `ProgressError::InvalidPercent` if a stored percent is out of range.
    pub fn from_snapshot(snapshot: ProgressSnapshot) -> Result<Self, ProgressError> {
        for value in [snapshot.ks1_percent, snapshot.ks2_percent] {
            if !value.is_finite() || !(0.0..=PROGRESS_MAX).contains(&value) {
                return Err(ProgressError::InvalidPercent(value));
            }
        }
        Ok(Self {
            ks1: snapshot.ks1_percent,
            ks2: snapshot.ks2_percent,
            counted: snapshot.counted.into_iter().collect(),
        })
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            ks1_percent: self.ks1,
            ks2_percent: self.ks2,
            counted: self.counted.iter().cloned().collect(),
        }
    }

    /// Add `stage.slice_percent() * weight` to the stage, clamped to 100.
    ///
    /// Returns the new stored percent.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidWeight` if `weight` is not in `[0, 1]`.
    pub fn add_task_completion(&mut self, stage: KeyStage, weight: f64) -> Result<f64, ProgressError> {
        if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
            return Err(ProgressError::InvalidWeight(weight));
        }

        let increment = round_fixed(stage.slice_percent() * weight);
        let slot = self.slot_mut(stage);
        *slot = round_fixed(*slot + increment).min(PROGRESS_MAX);
        Ok(*slot)
    }

    /// Credit `exercise` once.
    ///
    /// Returns `Ok(false)` without changing anything if it was counted before.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidWeight` if `weight` is not in `[0, 1]`.
    pub fn credit(
        &mut self,
        exercise: &ExerciseId,
        stage: KeyStage,
        weight: f64,
    ) -> Result<bool, ProgressError> {
        if self.counted.contains(exercise) {
            return Ok(false);
        }
        self.add_task_completion(stage, weight)?;
        self.counted.insert(exercise.clone());
        Ok(true)
    }

    #[must_use]
    pub fn is_counted(&self, exercise: &ExerciseId) -> bool {
        self.counted.contains(exercise)
    }

    /// Percent rounded to one decimal for display.
    #[must_use]
    pub fn current_percent(&self, stage: KeyStage) -> f64 {
        (self.raw_percent(stage) * 10.0).round() / 10.0
    }

    /// Stored percent with full precision.
    #[must_use]
    pub fn raw_percent(&self, stage: KeyStage) -> f64 {
        match stage {
            KeyStage::Ks1 => self.ks1,
            KeyStage::Ks2 => self.ks2,
        }
    }

    fn slot_mut(&mut self, stage: KeyStage) -> &mut f64 {
        match stage {
            KeyStage::Ks1 => &mut self.ks1,
            KeyStage::Ks2 => &mut self.ks2,
        }
    }
}

fn round_fixed(value: f64) -> f64 {
    (value * PRECISION).round() / PRECISION
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModuleId, VariantKey};

    fn sector(n: u32) -> ExerciseId {
        ExerciseId::new(ModuleId::Sectors, VariantKey::numbered(n))
    }

    #[test]
    fn increments_follow_stage_slices() {
        let mut tracker = ProgressTracker::new();
        tracker.add_task_completion(KeyStage::Ks1, 1.0 / 5.0).unwrap();
        assert_eq!(tracker.current_percent(KeyStage::Ks1), 10.0);

        tracker.add_task_completion(KeyStage::Ks2, 1.0 / 8.0).unwrap();
        assert_eq!(tracker.raw_percent(KeyStage::Ks2), 3.125);
        assert_eq!(tracker.current_percent(KeyStage::Ks2), 3.1);
    }

    #[test]
    fn sixths_add_up_without_drift() {
        let mut tracker = ProgressTracker::new();
        for _ in 0..6 {
            tracker.add_task_completion(KeyStage::Ks2, 1.0 / 6.0).unwrap();
        }
        assert_eq!(tracker.current_percent(KeyStage::Ks2), 25.0);
    }

    #[test]
    fn never_exceeds_one_hundred() {
        let mut tracker = ProgressTracker::new();
        for _ in 0..50 {
            tracker.add_task_completion(KeyStage::Ks1, 1.0).unwrap();
        }
        assert_eq!(tracker.raw_percent(KeyStage::Ks1), 100.0);
        assert_eq!(tracker.current_percent(KeyStage::Ks1), 100.0);
    }

    #[test]
    fn credit_counts_each_exercise_once() {
        let mut tracker = ProgressTracker::new();
        assert!(tracker.credit(&sector(1), KeyStage::Ks2, 0.125).unwrap());
        assert!(!tracker.credit(&sector(1), KeyStage::Ks2, 0.125).unwrap());
        assert!(tracker.credit(&sector(2), KeyStage::Ks2, 0.125).unwrap());
        assert_eq!(tracker.raw_percent(KeyStage::Ks2), 6.25);
    }

    #[test]
    fn rejects_bad_weights() {
        let mut tracker = ProgressTracker::new();
        assert!(matches!(
            tracker.add_task_completion(KeyStage::Ks1, -0.1),
            Err(ProgressError::InvalidWeight(_))
        ));
        assert!(tracker.credit(&sector(1), KeyStage::Ks2, f64::NAN).is_err());
        assert!(!tracker.is_counted(&sector(1)));
    }

    #[test]
    fn snapshot_round_trip_preserves_counted_ids() {
        let mut tracker = ProgressTracker::new();
        tracker.credit(&sector(4), KeyStage::Ks2, 0.125).unwrap();
        let restored = ProgressTracker::from_snapshot(tracker.snapshot()).unwrap();
        assert_eq!(restored, tracker);

        let bad = ProgressSnapshot {
            ks1_percent: 120.0,
            ..ProgressSnapshot::default()
        };
        assert!(ProgressTracker::from_snapshot(bad).is_err());
    }
}
