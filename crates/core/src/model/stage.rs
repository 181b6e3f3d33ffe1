use serde::{Deserialize, Serialize};
use std::fmt;

/// A curriculum tier whose completion is tracked as a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStage {
    /// Grades 1-2.
    Ks1,
    /// Grades 3-4.
    Ks2,
}

impl KeyStage {
    /// Percent of the stage one full module slice is worth.
    #[must_use]
    pub fn slice_percent(self) -> f64 {
        match self {
            KeyStage::Ks1 => 50.0,
            KeyStage::Ks2 => 25.0,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            KeyStage::Ks1 => "ks1",
            KeyStage::Ks2 => "ks2",
        }
    }
}

impl fmt::Display for KeyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyStage::Ks1 => f.write_str("Key Stage 1"),
            KeyStage::Ks2 => f.write_str("Key Stage 2"),
        }
    }
}
