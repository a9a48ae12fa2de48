//! Pipeline error types.

use clab_genai::GenAiError;
use clab_models::{ModelError, Stage};
use thiserror::Error;

use crate::session::Action;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required input for the action is missing.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// The same action is already in flight.
    #[error("{0} is already running")]
    Busy(Action),

    #[error("Stage {target} is not reachable yet (furthest reached: {watermark})")]
    Unreachable { target: Stage, watermark: Stage },

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Project store error: {0}")]
    Store(String),

    #[error("Music fetch failed: {0}")]
    MusicFetch(String),

    #[error(transparent)]
    GenAi(#[from] GenAiError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn invalid_setting(msg: impl Into<String>) -> Self {
        Self::InvalidSetting(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn music_fetch(msg: impl Into<String>) -> Self {
        Self::MusicFetch(msg.into())
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Precondition(_) => "precondition",
            PipelineError::Busy(_) => "busy",
            PipelineError::Unreachable { .. } => "unreachable",
            PipelineError::InvalidSetting(_) => "invalid_setting",
            PipelineError::Store(_) => "store",
            PipelineError::MusicFetch(_) => "music_fetch",
            PipelineError::GenAi(e) => e.kind(),
            PipelineError::Model(_) => "model",
            PipelineError::Io(_) => "io",
            PipelineError::Json(_) => "json",
        }
    }
}
