use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ExerciseId, ModuleId, VariantKey};

/// What was stored when a variant was first completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub attempts_taken: u32,
    pub points_earned: u32,
    pub completed_at: DateTime<Utc>,
}

/// Result of [`CompletionRegistry::mark_completed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkResult {
    /// `true` if the key was already completed; nothing was changed.
    pub already_completed_before: bool,
    /// The stored record (the original one on repeated calls).
    pub record: CompletionRecord,
}

impl MarkResult {
    /// True only on the transition from not completed to completed.
    #[must_use]
    pub fn is_first_completion(&self) -> bool {
        !self.already_completed_before
    }
}

/// Completed variants of a single module.
///
/// A key's completion is monotonic; only [`reset_all`] clears it, and that
/// only for this module.
///
/// [`reset_all`]: CompletionRegistry::reset_all
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRegistry {
    module: ModuleId,
    entries: BTreeMap<VariantKey, CompletionRecord>,
}

impl CompletionRegistry {
    #[must_use]
    pub fn new(module: ModuleId) -> Self {
        Self {
            module,
            entries: BTreeMap::new(),
        }
    }

    /// Rebuild a registry from stored records.
    #[must_use]
    pub fn from_persisted(
        module: ModuleId,
        records: impl IntoIterator<Item = (VariantKey, CompletionRecord)>,
    ) -> Self {
        Self {
            module,
            entries: records.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn module(&self) -> ModuleId {
        self.module
    }

    #[must_use]
    pub fn is_completed(&self, key: &VariantKey) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn record(&self, key: &VariantKey) -> Option<&CompletionRecord> {
        self.entries.get(key)
    }

    /// Record a completion. Repeated calls for the same key keep the first
    /// record and report `already_completed_before = true`.
    pub fn mark_completed(
        &mut self,
        key: VariantKey,
        attempts_taken: u32,
        points_earned: u32,
        completed_at: DateTime<Utc>,
    ) -> MarkResult {
        if let Some(existing) = self.entries.get(&key) {
            return MarkResult {
                already_completed_before: true,
                record: existing.clone(),
            };
        }

        let record = CompletionRecord {
            attempts_taken,
            points_earned,
            completed_at,
        };
        self.entries.insert(key, record.clone());
        MarkResult {
            already_completed_before: false,
            record,
        }
    }

    /// True when every key in `keys` is completed.
    #[must_use]
    pub fn all_completed<'a>(&self, keys: impl IntoIterator<Item = &'a VariantKey>) -> bool {
        keys.into_iter().all(|key| self.is_completed(key))
    }

    /// Keys from `keys` that are still open, in the given order.
    #[must_use]
    pub fn uncompleted<'a>(&self, keys: impl IntoIterator<Item = &'a VariantKey>) -> Vec<VariantKey> {
        keys.into_iter()
            .filter(|key| !self.is_completed(key))
            .cloned()
            .collect()
    }

    /// Clear every completion of this module ("play again").
    pub fn reset_all(&mut self) {
        self.entries.clear();
    }

    pub fn completed_keys(&self) -> impl Iterator<Item = &VariantKey> {
        self.entries.keys()
    }

    pub fn records(&self) -> impl Iterator<Item = (&VariantKey, &CompletionRecord)> {
        self.entries.iter()
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn total_points(&self) -> u32 {
        self.entries
            .values()
            .fold(0_u32, |acc, r| acc.saturating_add(r.points_earned))
    }

    #[must_use]
    pub fn exercise_id(&self, key: VariantKey) -> ExerciseId {
        ExerciseId::new(self.module, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn key(name: &str) -> VariantKey {
        VariantKey::named(name).unwrap()
    }

    #[test]
    fn mark_is_idempotent() {
        let mut registry = CompletionRegistry::new(ModuleId::Shapes2D);
        let first = registry.mark_completed(key("kite"), 2, 2, fixed_now());
        assert!(first.is_first_completion());

        let second = registry.mark_completed(key("kite"), 1, 3, fixed_now());
        assert!(second.already_completed_before);
        assert_eq!(second.record.points_earned, 2);
        assert_eq!(second.record.attempts_taken, 2);
        assert_eq!(registry.completed_count(), 1);
        assert_eq!(registry.total_points(), 2);
    }

    #[test]
    fn all_completed_and_uncompleted() {
        let keys = vec![key("acute angle"), key("right angle"), key("reflex angle")];
        let mut registry = CompletionRegistry::new(ModuleId::Angles);
        assert!(!registry.all_completed(&keys));

        registry.mark_completed(keys[1].clone(), 1, 3, fixed_now());
        assert_eq!(
            registry.uncompleted(&keys),
            vec![key("acute angle"), key("reflex angle")]
        );

        registry.mark_completed(keys[0].clone(), 3, 0, fixed_now());
        registry.mark_completed(keys[2].clone(), 1, 3, fixed_now());
        assert!(registry.all_completed(&keys));
        assert!(registry.all_completed(std::iter::empty()));
    }

    #[test]
    fn reset_clears_only_this_registry() {
        let mut shapes = CompletionRegistry::new(ModuleId::Shapes2D);
        let mut solids = CompletionRegistry::new(ModuleId::Shapes3D);
        shapes.mark_completed(key("square"), 1, 3, fixed_now());
        solids.mark_completed(key("cube"), 1, 6, fixed_now());

        shapes.reset_all();
        assert!(!shapes.is_completed(&key("square")));
        assert_eq!(shapes.total_points(), 0);
        assert!(solids.is_completed(&key("cube")));
    }
}
