//! Static catalog of exercise modules.
//!
//! Each module owns a share of its key stage's progress slice and a fixed set
//! of variants. A variant's progress weight is `stage_share / variant count`.

use crate::model::{ExerciseId, KeyStage, ModuleId, VariantKey};
use crate::scoring::ExerciseFamily;

const SHAPES_2D: [&str; 11] = [
    "circle",
    "rectangle",
    "triangle",
    "oval",
    "octagon",
    "square",
    "heptagon",
    "rhombus",
    "pentagon",
    "hexagon",
    "kite",
];

const SHAPES_3D: [&str; 8] = [
    "cube",
    "cuboid",
    "cylinder",
    "sphere",
    "triangular prism",
    "square-based pyramid",
    "cone",
    "tetrahedron",
];

const ANGLE_TYPES: [&str; 5] = [
    "acute angle",
    "right angle",
    "obtuse angle",
    "straight angle",
    "reflex angle",
];

const AREA_SHAPES: [&str; 4] = ["rectangle", "parallelogram", "triangle", "trapezium"];

const CIRCLE_MEASURES: [&str; 2] = ["area", "circumference"];

/// How submitted answers are checked for a module.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnswerMode {
    /// Name typed or chosen by the learner.
    Label,
    /// Number within an absolute tolerance.
    Numeric { tolerance: f64 },
}

/// Everything the core needs to know about one module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleSpec {
    id: ModuleId,
    title: &'static str,
    family: ExerciseFamily,
    variants: Vec<VariantKey>,
    stage_share: f64,
    credit_on_failure: bool,
    time_budget_secs: Option<u32>,
    answer_mode: AnswerMode,
}

impl ModuleSpec {
    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &'static str {
        self.title
    }

    #[must_use]
    pub fn stage(&self) -> KeyStage {
        self.id.stage()
    }

    #[must_use]
    pub fn family(&self) -> ExerciseFamily {
        self.family
    }

    #[must_use]
    pub fn variants(&self) -> &[VariantKey] {
        &self.variants
    }

    #[must_use]
    pub fn has_variant(&self, key: &VariantKey) -> bool {
        self.variants.contains(key)
    }

    /// Fraction of the stage slice this module is worth in total.
    #[must_use]
    pub fn stage_share(&self) -> f64 {
        self.stage_share
    }

    /// Progress weight of a single variant.
    #[must_use]
    pub fn variant_weight(&self) -> f64 {
        if self.variants.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let count = self.variants.len() as f64;
        self.stage_share / count
    }

    /// Whether a failed or timed-out variant still counts as completed.
    #[must_use]
    pub fn credit_on_failure(&self) -> bool {
        self.credit_on_failure
    }

    #[must_use]
    pub fn time_budget_secs(&self) -> Option<u32> {
        self.time_budget_secs
    }

    #[must_use]
    pub fn answer_mode(&self) -> AnswerMode {
        self.answer_mode
    }

    #[must_use]
    pub fn exercise(&self, key: VariantKey) -> ExerciseId {
        ExerciseId::new(self.id, key)
    }
}

/// The full module catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Curriculum {
    modules: Vec<ModuleSpec>,
}

impl Curriculum {
    /// The Shapeville curriculum: three KS1 and four KS2 modules.
    #[must_use]
    pub fn standard() -> Self {
        // The two shape modules share the KS1 slice per shape identified,
        // not as one lump per finished round, so a partial round still
        // shows progress and a replayed shape never counts twice.
        let modules = vec![
            ModuleSpec {
                id: ModuleId::Shapes2D,
                title: "Identification of Shapes (2D)",
                family: ExerciseFamily::Standard,
                variants: named(&SHAPES_2D),
                stage_share: 0.5,
                credit_on_failure: false,
                time_budget_secs: None,
                answer_mode: AnswerMode::Label,
            },
            ModuleSpec {
                id: ModuleId::Shapes3D,
                title: "Identification of Shapes (3D)",
                family: ExerciseFamily::HighValue,
                variants: named(&SHAPES_3D),
                stage_share: 0.5,
                credit_on_failure: false,
                time_budget_secs: None,
                answer_mode: AnswerMode::Label,
            },
            ModuleSpec {
                id: ModuleId::Angles,
                title: "Identification of Angle Types",
                family: ExerciseFamily::Standard,
                variants: named(&ANGLE_TYPES),
                stage_share: 1.0,
                credit_on_failure: true,
                time_budget_secs: None,
                answer_mode: AnswerMode::Label,
            },
            ModuleSpec {
                id: ModuleId::Area,
                title: "Area Calculation of Shapes",
                family: ExerciseFamily::Standard,
                variants: named(&AREA_SHAPES),
                stage_share: 1.0,
                credit_on_failure: true,
                time_budget_secs: Some(180),
                answer_mode: AnswerMode::Numeric { tolerance: 0.1 },
            },
            ModuleSpec {
                id: ModuleId::Circle,
                title: "Area and Circumference Calculation of Circle",
                family: ExerciseFamily::Standard,
                variants: named(&CIRCLE_MEASURES),
                stage_share: 1.0,
                credit_on_failure: true,
                time_budget_secs: Some(180),
                answer_mode: AnswerMode::Numeric { tolerance: 0.01 },
            },
            ModuleSpec {
                id: ModuleId::Compound,
                title: "Compound Shape Area Calculation",
                family: ExerciseFamily::HighValue,
                variants: (1..=9).map(VariantKey::numbered).collect(),
                stage_share: 1.0,
                credit_on_failure: true,
                time_budget_secs: Some(300),
                answer_mode: AnswerMode::Numeric { tolerance: 0.01 },
            },
            ModuleSpec {
                id: ModuleId::Sectors,
                title: "Sector Area Calculation",
                family: ExerciseFamily::HighValue,
                variants: (1..=8).map(VariantKey::numbered).collect(),
                stage_share: 1.0,
                credit_on_failure: true,
                time_budget_secs: Some(300),
                answer_mode: AnswerMode::Numeric { tolerance: 0.01 },
            },
        ];
        Self { modules }
    }

    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&ModuleSpec> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleSpec> {
        self.modules.iter()
    }

    /// Modules contributing to `stage`, in catalog order.
    pub fn modules_for(&self, stage: KeyStage) -> impl Iterator<Item = &ModuleSpec> {
        self.modules.iter().filter(move |m| m.stage() == stage)
    }
}

impl Default for Curriculum {
    fn default() -> Self {
        Self::standard()
    }
}

fn named(names: &[&str]) -> Vec<VariantKey> {
    names
        .iter()
        .map(|name| VariantKey::Named((*name).to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_covers_every_module_once() {
        let curriculum = Curriculum::standard();
        for id in ModuleId::ALL {
            assert_eq!(curriculum.modules().filter(|m| m.id() == id).count(), 1);
        }
    }

    #[test]
    fn stage_shares_fill_each_stage() {
        let curriculum = Curriculum::standard();
        let ks1: f64 = curriculum
            .modules_for(KeyStage::Ks1)
            .map(|m| m.stage_share() * KeyStage::Ks1.slice_percent())
            .sum();
        let ks2: f64 = curriculum
            .modules_for(KeyStage::Ks2)
            .map(|m| m.stage_share() * KeyStage::Ks2.slice_percent())
            .sum();
        assert!((ks1 - 100.0).abs() < 1e-9);
        assert!((ks2 - 100.0).abs() < 1e-9);
    }

    #[test]
    fn variant_weights_match_task_counts() {
        let curriculum = Curriculum::standard();
        let angles = curriculum.module(ModuleId::Angles).unwrap();
        assert_eq!(angles.variant_weight(), 0.2);
        let sectors = curriculum.module(ModuleId::Sectors).unwrap();
        assert_eq!(sectors.variant_weight(), 0.125);
        assert!(sectors.has_variant(&VariantKey::numbered(8)));
        assert!(!sectors.has_variant(&VariantKey::numbered(9)));
    }

    #[test]
    fn catalog_names_are_already_normalized() {
        let curriculum = Curriculum::standard();
        for module in curriculum.modules() {
            for key in module.variants() {
                let reparsed: VariantKey = key.to_string().parse().unwrap();
                assert_eq!(&reparsed, key);
            }
        }
    }
}
