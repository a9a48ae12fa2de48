//! Wizard stages.

use serde::{Deserialize, Serialize};

/// Ordered wizard stages. Declaration order is the progression order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    InputUrl,
    ReviewProduct,
    GenerateModel,
    GenerateVideos,
    FinalEditor,
}

impl Stage {
    /// All stages in order.
    pub const ALL: [Stage; 5] = [
        Stage::InputUrl,
        Stage::ReviewProduct,
        Stage::GenerateModel,
        Stage::GenerateVideos,
        Stage::FinalEditor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::InputUrl => "input_url",
            Stage::ReviewProduct => "review_product",
            Stage::GenerateModel => "generate_model",
            Stage::GenerateVideos => "generate_videos",
            Stage::FinalEditor => "final_editor",
        }
    }

    /// 1-based position shown in the step indicator.
    pub fn number(&self) -> u8 {
        *self as u8 + 1
    }

    pub fn next(&self) -> Option<Stage> {
        Self::ALL.get(*self as usize + 1).copied()
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
