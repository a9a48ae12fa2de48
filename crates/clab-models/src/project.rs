//! Saved project snapshots.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audio::AudioAsset;
use crate::media::GeneratedModel;
use crate::music::BackgroundMusicSelection;
use crate::options::{Gender, Language};
use crate::product::ProductData;
use crate::stage::Stage;
use crate::video::VideoAsset;

/// Unique project identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    /// Generate a new random project ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the current script text came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScriptOrigin {
    /// No script yet
    #[default]
    Empty,
    /// Written by the script generator
    Generated,
    /// Rewritten by the generator from an earlier script
    Modified,
    /// Typed or changed by the user
    Edited,
}

/// Snapshot of a wizard session for external save/load.
///
/// Background music bytes are never part of the snapshot; a reloaded catalog
/// selection is materialized again on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedProject {
    pub id: ProjectId,
    pub last_modified: DateTime<Utc>,
    pub stage: Stage,
    pub max_reached_stage: Stage,
    pub url: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub gender: Gender,
    pub product_data: Option<ProductData>,
    pub generated_model: Option<GeneratedModel>,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub script_origin: ScriptOrigin,
    pub audio: Option<AudioAsset>,
    pub video: Option<VideoAsset>,
    pub music: Option<BackgroundMusicSelection>,
}
