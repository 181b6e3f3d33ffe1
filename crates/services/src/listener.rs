use std::sync::atomic::{AtomicU64, Ordering};

use shapeville_core::model::ExerciseId;

/// Receives points as soon as a session is scored.
pub trait ScoreListener: Send + Sync {
    fn on_score_delta(&self, exercise: &ExerciseId, points: u32);
}

/// Running total shown by the shell.
#[derive(Debug, Default)]
pub struct ScoreBoard {
    total: AtomicU64,
}

impl ScoreBoard {
    #[must_use]
    pub fn new(initial: u64) -> Self {
        Self {
            total: AtomicU64::new(initial),
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

impl ScoreListener for ScoreBoard {
    fn on_score_delta(&self, exercise: &ExerciseId, points: u32) {
        let points = u64::from(points);
        let total = self.total.fetch_add(points, Ordering::Relaxed) + points;
        log::debug!("score +{points} for {exercise}, total {total}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapeville_core::model::{ModuleId, VariantKey};

    #[test]
    fn board_accumulates_deltas() {
        let board = ScoreBoard::new(5);
        let id = ExerciseId::new(ModuleId::Sectors, VariantKey::numbered(2));
        board.on_score_delta(&id, 6);
        board.on_score_delta(&id, 2);
        assert_eq!(board.total(), 13);
    }
}
