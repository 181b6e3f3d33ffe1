//! Built-in question generator for the terminal shell.

use std::fmt;

use rand::Rng;
use shapeville_core::curriculum::{AnswerMode, ModuleSpec};
use shapeville_core::model::{
    AnswerKey, AnswerKeyError, ExerciseId, ModuleId, Problem, SessionLimits, VariantKey,
};

/// Value of π used in every worked answer.
pub const PI: f64 = 3.14;

#[derive(Debug)]
pub enum GenerateError {
    UnknownVariant(ExerciseId),
    Answer(AnswerKeyError),
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::UnknownVariant(id) => write!(f, "no question available for {id}"),
            GenerateError::Answer(err) => write!(f, "invalid answer key: {err}"),
        }
    }
}

impl std::error::Error for GenerateError {}

impl From<AnswerKeyError> for GenerateError {
    fn from(err: AnswerKeyError) -> Self {
        GenerateError::Answer(err)
    }
}

/// Compound challenges: outline, area and unit.
const COMPOUND: [(&str, f64, &str); 9] = [
    ("a straight line 12 cm long", 0.0, "cm²"),
    (
        "an L-shape made of a 10 cm x 11 cm rectangle on top of a 20 cm x 10 cm rectangle",
        310.0,
        "cm²",
    ),
    (
        "an 18 cm x 3 cm strip on top of a 34 cm x 16 cm rectangle",
        598.0,
        "cm²",
    ),
    ("a 12 m square on top of a 24 m x 6 m rectangle", 288.0, "m²"),
    (
        "a triangle with base 4 m and height 3 m on top of a 4 m x 3 m rectangle",
        18.0,
        "m²",
    ),
    (
        "a 10 m x 15 m rectangle with a triangle of base 9.5 m and height 2 m attached",
        159.5,
        "m²",
    ),
    ("a zig-zag line made of four 5 cm segments", 0.0, "cm²"),
    ("a 36 m square on top of a 60 m x 36 m rectangle", 3456.0, "m²"),
    ("a 10 m x 3 m strip on top of an 18 m x 8 m rectangle", 174.0, "m²"),
];

/// Sectors: angle in degrees, radius and unit.
const SECTORS: [(u32, f64, &str); 8] = [
    (90, 8.0, "cm"),
    (130, 18.0, "ft"),
    (240, 19.0, "cm"),
    (110, 22.0, "ft"),
    (100, 3.5, "m"),
    (270, 8.0, "in"),
    (280, 12.0, "yd"),
    (250, 15.0, "mm"),
];

/// Build a question for one variant of `module`.
///
/// # Errors
///
/// Returns `GenerateError::UnknownVariant` if the module has no such variant.
pub fn generate(
    module: &ModuleSpec,
    key: &VariantKey,
    limits: SessionLimits,
    rng: &mut impl Rng,
) -> Result<Problem, GenerateError> {
    let exercise = module.exercise(key.clone());
    if !module.has_variant(key) {
        return Err(GenerateError::UnknownVariant(exercise));
    }

    let tolerance = match module.answer_mode() {
        AnswerMode::Numeric { tolerance } => tolerance,
        AnswerMode::Label => 0.01,
    };
    let numeric = |value: f64| AnswerKey::numeric(round2(value), tolerance);

    let (prompt, answer) = match (module.id(), key) {
        (ModuleId::Shapes2D, VariantKey::Named(name)) => (
            format!("Name this shape: {}.", describe_flat(name)),
            AnswerKey::label(name)?,
        ),
        (ModuleId::Shapes3D, VariantKey::Named(name)) => (
            format!("Name this solid: {}.", describe_solid(name)),
            AnswerKey::label(name)?,
        ),
        (ModuleId::Angles, VariantKey::Named(name)) => (
            format!("What type of angle measures {}°?", angle_for(name, rng)),
            AnswerKey::label(name)?,
        ),
        (ModuleId::Area, VariantKey::Named(shape)) => {
            let (prompt, area) = area_question(shape, rng);
            (prompt, numeric(area)?)
        }
        (ModuleId::Circle, VariantKey::Named(measure)) => {
            let (prompt, value) = circle_question(measure, rng);
            (prompt, numeric(value)?)
        }
        (ModuleId::Compound, VariantKey::Numbered(n)) => {
            let Some((outline, area, unit)) = entry(&COMPOUND, *n) else {
                return Err(GenerateError::UnknownVariant(exercise));
            };
            (
                format!("Challenge {n}: find the area of {outline} (in {unit})."),
                numeric(area)?,
            )
        }
        (ModuleId::Sectors, VariantKey::Numbered(n)) => {
            let Some((degrees, radius, unit)) = entry(&SECTORS, *n) else {
                return Err(GenerateError::UnknownVariant(exercise));
            };
            let area = f64::from(degrees) * PI * radius * radius / 360.0;
            (
                format!(
                    "Find the area of a sector with angle {degrees}° and radius {radius:.1} {unit} (in {unit}², π = 3.14)."
                ),
                numeric(area)?,
            )
        }
        _ => return Err(GenerateError::UnknownVariant(exercise)),
    };

    Ok(Problem::new(exercise, prompt, answer, module.family(), limits))
}

fn entry<T: Copy>(table: &[T], number: u32) -> Option<T> {
    let index = usize::try_from(number).ok()?.checked_sub(1)?;
    table.get(index).copied()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn area_question(shape: &str, rng: &mut impl Rng) -> (String, f64) {
    let a: u32 = rng.random_range(5..=20);
    let b: u32 = rng.random_range(5..=20);
    let (a_f, b_f) = (f64::from(a), f64::from(b));
    match shape {
        "rectangle" => (
            format!("Find the area of a rectangle {a} cm long and {b} cm wide (in cm²)."),
            a_f * b_f,
        ),
        "parallelogram" => (
            format!("Find the area of a parallelogram with base {a} m and height {b} m (in m²)."),
            a_f * b_f,
        ),
        "triangle" => (
            format!("Find the area of a triangle with base {a} cm and height {b} cm (in cm²)."),
            0.5 * a_f * b_f,
        ),
        _ => {
            let top = rng.random_range(2..a);
            (
                format!(
                    "Find the area of a trapezium with parallel sides {a} m and {top} m and height {b} m (in m²)."
                ),
                0.5 * (a_f + f64::from(top)) * b_f,
            )
        }
    }
}

fn circle_question(measure: &str, rng: &mut impl Rng) -> (String, f64) {
    let use_radius = rng.random_bool(0.5);
    let given: u32 = rng.random_range(1..=20);
    let radius = if use_radius {
        f64::from(given)
    } else {
        f64::from(given) / 2.0
    };
    let given_text = if use_radius {
        format!("radius {given} cm")
    } else {
        format!("diameter {given} cm")
    };

    if measure == "area" {
        (
            format!("Find the area of a circle with {given_text} (in cm², π = 3.14)."),
            PI * radius * radius,
        )
    } else {
        (
            format!("Find the circumference of a circle with {given_text} (in cm, π = 3.14)."),
            2.0 * PI * radius,
        )
    }
}

fn angle_for(name: &str, rng: &mut impl Rng) -> u32 {
    match name {
        "acute angle" => rng.random_range(1..90),
        "right angle" => 90,
        "obtuse angle" => rng.random_range(91..180),
        "straight angle" => 180,
        _ => rng.random_range(181..360),
    }
}

fn describe_flat(name: &str) -> &'static str {
    match name {
        "circle" => "perfectly round with no corners",
        "rectangle" => "four right angles with two long and two short sides",
        "triangle" => "three straight sides",
        "oval" => "a stretched round shape with no corners",
        "octagon" => "eight straight sides",
        "square" => "four equal sides and four right angles",
        "heptagon" => "seven straight sides",
        "rhombus" => "four equal sides but no right angles",
        "pentagon" => "five straight sides",
        "hexagon" => "six straight sides",
        "kite" => "four sides in two pairs of equal neighbouring sides",
        _ => "a flat shape",
    }
}

fn describe_solid(name: &str) -> &'static str {
    match name {
        "cube" => "six equal square faces",
        "cuboid" => "six rectangular faces",
        "cylinder" => "two circular faces joined by one curved surface",
        "sphere" => "one curved surface, perfectly round",
        "triangular prism" => "two triangular ends and three rectangular faces",
        "square-based pyramid" => "a square base and four triangles meeting at a point",
        "cone" => "a circular base and a curved surface meeting at a point",
        "tetrahedron" => "four triangular faces",
        _ => "a solid shape",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use shapeville_core::curriculum::Curriculum;

    #[test]
    fn every_catalog_variant_has_a_question() {
        let curriculum = Curriculum::standard();
        let mut rng = StdRng::seed_from_u64(7);
        for module in curriculum.modules() {
            for key in module.variants() {
                let problem =
                    generate(module, key, SessionLimits::untimed(), &mut rng).unwrap();
                assert_eq!(problem.family, module.family());
                assert!(!problem.prompt.is_empty());
            }
        }
    }

    #[test]
    fn sector_answers_use_pi_3_14() {
        let curriculum = Curriculum::standard();
        let sectors = curriculum.module(ModuleId::Sectors).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let problem = generate(
            sectors,
            &VariantKey::numbered(1),
            SessionLimits::untimed(),
            &mut rng,
        )
        .unwrap();
        // 90/360 * 3.14 * 8 * 8
        assert_eq!(problem.answer.check("50.24"), Ok(true));
        assert_eq!(problem.answer.check("50.27"), Ok(false));
    }

    #[test]
    fn one_dimensional_challenges_have_zero_area() {
        let curriculum = Curriculum::standard();
        let compound = curriculum.module(ModuleId::Compound).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let problem = generate(
            compound,
            &VariantKey::numbered(7),
            SessionLimits::untimed(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(problem.answer.check("0"), Ok(true));
        assert_eq!(problem.answer.check("0.001"), Ok(false));
    }

    #[test]
    fn unknown_variants_are_rejected() {
        let curriculum = Curriculum::standard();
        let sectors = curriculum.module(ModuleId::Sectors).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        assert!(matches!(
            generate(sectors, &VariantKey::numbered(12), SessionLimits::untimed(), &mut rng),
            Err(GenerateError::UnknownVariant(_))
        ));
    }

    #[test]
    fn angle_prompts_match_their_type() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            assert!((1..90).contains(&angle_for("acute angle", &mut rng)));
            assert!((91..180).contains(&angle_for("obtuse angle", &mut rng)));
            assert!((181..360).contains(&angle_for("reflex angle", &mut rng)));
        }
    }
}
