use rand::rng;
use rand::seq::SliceRandom;

use shapeville_core::curriculum::ModuleSpec;
use shapeville_core::model::VariantKey;
use shapeville_core::settings::DEFAULT_ROUND_SIZE;

/// Variants chosen for one round of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundPlan {
    pub variants: Vec<VariantKey>,
    /// The module must be reset before playing this round.
    pub reset_required: bool,
}

impl RoundPlan {
    #[must_use]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

/// Picks a round of open variants, starting the module over once too few remain.
#[derive(Debug, Clone, Copy)]
pub struct RoundPlanner {
    round_size: usize,
    shuffle: bool,
}

impl Default for RoundPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_ROUND_SIZE)
    }
}

impl RoundPlanner {
    #[must_use]
    pub fn new(round_size: usize) -> Self {
        Self {
            round_size: round_size.max(1),
            shuffle: true,
        }
    }

    /// Enable or disable shuffling before selection.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Build a plan from the module's catalog and its open variants.
    ///
    /// Rounds never ask for more variants than the module has.
    #[must_use]
    pub fn plan(&self, module: &ModuleSpec, uncompleted: Vec<VariantKey>) -> RoundPlan {
        let take = self.round_size.min(module.variants().len());
        let reset_required = uncompleted.len() < take;

        let mut candidates = if reset_required {
            module.variants().to_vec()
        } else {
            uncompleted
        };

        if self.shuffle {
            let mut rng = rng();
            candidates.as_mut_slice().shuffle(&mut rng);
        }
        candidates.truncate(take);

        RoundPlan {
            variants: candidates,
            reset_required,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapeville_core::curriculum::Curriculum;
    use shapeville_core::model::ModuleId;

    fn module(id: ModuleId) -> ModuleSpec {
        Curriculum::standard().module(id).unwrap().clone()
    }

    #[test]
    fn picks_round_size_from_open_variants() {
        let shapes = module(ModuleId::Shapes2D);
        let open = shapes.variants()[3..].to_vec();

        let plan = RoundPlanner::new(4).plan(&shapes, open.clone());
        assert_eq!(plan.len(), 4);
        assert!(!plan.reset_required);
        assert!(plan.variants.iter().all(|v| open.contains(v)));
    }

    #[test]
    fn too_few_open_variants_restart_the_module() {
        let shapes = module(ModuleId::Shapes2D);
        let open = shapes.variants()[..3].to_vec();

        let plan = RoundPlanner::new(4).with_shuffle(false).plan(&shapes, open);
        assert!(plan.reset_required);
        assert_eq!(plan.variants, shapes.variants()[..4].to_vec());
    }

    #[test]
    fn round_never_exceeds_module_size() {
        let circle = module(ModuleId::Circle);
        let plan = RoundPlanner::new(4).plan(&circle, circle.variants().to_vec());
        assert_eq!(plan.len(), 2);
        assert!(!plan.reset_required);

        let done = RoundPlanner::new(4).plan(&circle, Vec::new());
        assert!(done.reset_required);
        assert_eq!(done.len(), 2);
    }

    #[test]
    fn unshuffled_plans_keep_catalog_order() {
        let sectors = module(ModuleId::Sectors);
        let plan = RoundPlanner::new(3)
            .with_shuffle(false)
            .plan(&sectors, sectors.variants().to_vec());
        assert_eq!(
            plan.variants,
            vec![
                VariantKey::numbered(1),
                VariantKey::numbered(2),
                VariantKey::numbered(3)
            ]
        );
    }
}
