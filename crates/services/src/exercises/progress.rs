use serde::Serialize;
use shapeville_core::model::{KeyStage, ModuleId};

/// Completion of one module, useful for UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleProgress {
    pub module: ModuleId,
    pub title: String,
    pub stage: KeyStage,
    pub completed: usize,
    pub total: usize,
    pub points: u32,
    pub is_complete: bool,
}

/// Aggregated view of the learner's progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressView {
    pub ks1_percent: f64,
    pub ks2_percent: f64,
    pub total_score: u64,
    pub modules: Vec<ModuleProgress>,
}

impl ProgressView {
    /// Display percent for a stage (one decimal).
    #[must_use]
    pub fn percent(&self, stage: KeyStage) -> f64 {
        match stage {
            KeyStage::Ks1 => self.ks1_percent,
            KeyStage::Ks2 => self.ks2_percent,
        }
    }

    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&ModuleProgress> {
        self.modules.iter().find(|m| m.module == id)
    }
}
