use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::KeyStage;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum VariantKeyError {
    #[error("variant key cannot be empty")]
    Empty,

    #[error("unknown module: {0}")]
    UnknownModule(String),
}

//
// ─── MODULE ID ─────────────────────────────────────────────────────────────────
//

/// One exercise module of the curriculum.
///
/// Each module owns its own completion key space; resetting a module never
/// touches another module's completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleId {
    /// Naming flat shapes.
    #[serde(rename = "shapes_2d")]
    Shapes2D,
    /// Naming solids.
    #[serde(rename = "shapes_3d")]
    Shapes3D,
    /// Classifying angles.
    Angles,
    /// Area of rectangles, parallelograms, triangles and trapezia.
    Area,
    /// Circle area and circumference.
    Circle,
    /// Area of compound shapes.
    Compound,
    /// Sector area.
    Sectors,
}

impl ModuleId {
    pub const ALL: [ModuleId; 7] = [
        ModuleId::Shapes2D,
        ModuleId::Shapes3D,
        ModuleId::Angles,
        ModuleId::Area,
        ModuleId::Circle,
        ModuleId::Compound,
        ModuleId::Sectors,
    ];

    /// Stable identifier used in storage and on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleId::Shapes2D => "shapes_2d",
            ModuleId::Shapes3D => "shapes_3d",
            ModuleId::Angles => "angles",
            ModuleId::Area => "area",
            ModuleId::Circle => "circle",
            ModuleId::Compound => "compound",
            ModuleId::Sectors => "sectors",
        }
    }

    /// The key stage this module contributes progress to.
    #[must_use]
    pub fn stage(self) -> KeyStage {
        match self {
            ModuleId::Shapes2D | ModuleId::Shapes3D | ModuleId::Angles => KeyStage::Ks1,
            ModuleId::Area | ModuleId::Circle | ModuleId::Compound | ModuleId::Sectors => {
                KeyStage::Ks2
            }
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleId {
    type Err = VariantKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        ModuleId::ALL
            .into_iter()
            .find(|module| module.as_str() == wanted)
            .ok_or_else(|| VariantKeyError::UnknownModule(s.to_string()))
    }
}

//
// ─── VARIANT KEY ───────────────────────────────────────────────────────────────
//

/// Identifies one exercise variant inside a module: a shape name, an angle
/// type, or a challenge number.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariantKey {
    Numbered(u32),
    Named(String),
}

impl VariantKey {
    /// Create a named key, normalized to trimmed lower case.
    ///
    /// # Errors
    ///
    /// Returns `VariantKeyError::Empty` if the name is blank.
    pub fn named(value: impl AsRef<str>) -> Result<Self, VariantKeyError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(VariantKeyError::Empty);
        }
        Ok(Self::Named(trimmed.to_lowercase()))
    }

    #[must_use]
    pub fn numbered(value: u32) -> Self {
        Self::Numbered(value)
    }
}

impl fmt::Debug for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantKey::Numbered(n) => write!(f, "VariantKey(#{n})"),
            VariantKey::Named(name) => write!(f, "VariantKey({name:?})"),
        }
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantKey::Numbered(n) => write!(f, "{n}"),
            VariantKey::Named(name) => f.write_str(name),
        }
    }
}

impl FromStr for VariantKey {
    type Err = VariantKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u32>() {
            Ok(n) => Ok(Self::Numbered(n)),
            Err(_) => Self::named(s),
        }
    }
}

//
// ─── EXERCISE ID ───────────────────────────────────────────────────────────────
//

/// A variant qualified by its module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExerciseId {
    pub module: ModuleId,
    pub variant: VariantKey,
}

impl ExerciseId {
    #[must_use]
    pub fn new(module: ModuleId, variant: VariantKey) -> Self {
        Self { module, variant }
    }

    #[must_use]
    pub fn stage(&self) -> KeyStage {
        self.module.stage()
    }
}

impl fmt::Display for ExerciseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.module, self.variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_key_parses_numbers_and_names() {
        assert_eq!("7".parse::<VariantKey>().unwrap(), VariantKey::Numbered(7));
        assert_eq!(
            " Right Angle ".parse::<VariantKey>().unwrap(),
            VariantKey::Named("right angle".into())
        );
        assert_eq!("   ".parse::<VariantKey>().unwrap_err(), VariantKeyError::Empty);
    }

    #[test]
    fn module_id_round_trips_through_text() {
        for module in ModuleId::ALL {
            assert_eq!(module.as_str().parse::<ModuleId>().unwrap(), module);
        }
        assert_eq!("Shapes-2D".parse::<ModuleId>().unwrap(), ModuleId::Shapes2D);
        assert!(matches!(
            "volume".parse::<ModuleId>(),
            Err(VariantKeyError::UnknownModule(_))
        ));
    }

    #[test]
    fn exercise_id_display_is_module_slash_variant() {
        let id = ExerciseId::new(ModuleId::Sectors, VariantKey::numbered(3));
        assert_eq!(id.to_string(), "sectors/3");
        assert_eq!(id.stage(), KeyStage::Ks2);
    }
}
