//! The wizard session aggregate.
//!
//! A session exclusively owns every artifact of one project. Stage actions
//! never hold a borrow across a remote call: they snapshot inputs in
//! [`crate::stages::StageRunner::begin`] and merge results back in
//! [`crate::stages::StageRunner::apply`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::Utc;
use clab_models::{
    AudioAsset, BackgroundMusicSelection, Gender, GeneratedModel, Language, ProductData,
    ProjectId, SavedProject, ScriptOrigin, ScriptStyle, Stage, VideoAsset, VideoStatus,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PipelineError, PipelineResult};
use crate::wizard::WizardStateMachine;

/// A stage action that calls the generative service.
///
/// Actions writing the same session field share a busy flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Analyze,
    GenerateModel,
    GenerateScript,
    ModifyScript,
    GenerateAudio,
    GenerateVideo,
}

/// Session field written by an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Product,
    Model,
    Script,
    Audio,
    Video,
}

impl Slot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Product => "product",
            Slot::Model => "model",
            Slot::Script => "script",
            Slot::Audio => "audio",
            Slot::Video => "video",
        }
    }
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Analyze => "analyze",
            Action::GenerateModel => "generate_model",
            Action::GenerateScript => "generate_script",
            Action::ModifyScript => "modify_script",
            Action::GenerateAudio => "generate_audio",
            Action::GenerateVideo => "generate_video",
        }
    }

    pub fn slot(&self) -> Slot {
        match self {
            Action::Analyze => Slot::Product,
            Action::GenerateModel => Slot::Model,
            Action::GenerateScript | Action::ModifyScript => Slot::Script,
            Action::GenerateAudio => Slot::Audio,
            Action::GenerateVideo => Slot::Video,
        }
    }

    /// Slots whose content the action's result is derived from, its own
    /// slot included.
    pub fn depends_on(&self) -> &'static [Slot] {
        match self {
            Action::Analyze => &[Slot::Product],
            Action::GenerateModel => &[Slot::Model, Slot::Product],
            Action::GenerateScript | Action::ModifyScript => &[Slot::Script, Slot::Product],
            Action::GenerateAudio => &[Slot::Audio, Slot::Script],
            Action::GenerateVideo => &[Slot::Video, Slot::Model, Slot::Product],
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last failure, shown until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageNotice {
    pub action: Action,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct WizardSession {
    pub id: ProjectId,
    epoch: u64,
    wizard: WizardStateMachine,
    pub url: String,
    pub language: Language,
    pub gender: Gender,
    pub script_style: ScriptStyle,
    pub product: Option<ProductData>,
    pub model: Option<GeneratedModel>,
    pub script: String,
    pub script_origin: ScriptOrigin,
    pub audio: Option<AudioAsset>,
    pub video: Option<VideoAsset>,
    pub music: Option<BackgroundMusicSelection>,
    busy: HashSet<Slot>,
    revisions: HashMap<Slot, u64>,
    video_error: Option<String>,
    notice: Option<StageNotice>,
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardSession {
    /// Start a new project.
    pub fn new() -> Self {
        Self {
            id: ProjectId::new(),
            epoch: 0,
            wizard: WizardStateMachine::new(),
            url: String::new(),
            language: Language::default(),
            gender: Gender::default(),
            script_style: ScriptStyle::default(),
            product: None,
            model: None,
            script: String::new(),
            script_origin: ScriptOrigin::Empty,
            audio: None,
            video: None,
            music: None,
            busy: HashSet::new(),
            revisions: HashMap::new(),
            video_error: None,
            notice: None,
        }
    }

    /// Session generation; bumped whenever the session is replaced.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn stage(&self) -> Stage {
        self.wizard.current()
    }

    pub fn max_reached(&self) -> Stage {
        self.wizard.max_reached()
    }

    pub fn wizard(&self) -> &WizardStateMachine {
        &self.wizard
    }

    pub(crate) fn wizard_mut(&mut self) -> &mut WizardStateMachine {
        &mut self.wizard
    }

    /// Move to an already reached stage. No stage action runs.
    pub fn navigate(&mut self, target: Stage) -> PipelineResult<()> {
        self.wizard.navigate(target)
    }

    /// Explicit "continue" from product review.
    pub fn proceed_to_model(&mut self) -> PipelineResult<()> {
        if self.product.is_none() {
            return Err(PipelineError::precondition("analyze a product first"));
        }
        self.wizard.advance_to(Stage::GenerateModel);
        Ok(())
    }

    /// Explicit "continue" into the final editor.
    pub fn proceed_to_editor(&mut self) -> PipelineResult<()> {
        if !self.video.as_ref().is_some_and(VideoAsset::is_completed) {
            return Err(PipelineError::precondition("generate the video first"));
        }
        if self.audio.is_none() {
            return Err(PipelineError::precondition("generate the voiceover first"));
        }
        self.wizard.advance_to(Stage::FinalEditor);
        Ok(())
    }

    pub fn is_busy(&self, slot: Slot) -> bool {
        self.busy.contains(&slot)
    }

    pub fn any_busy(&self) -> bool {
        !self.busy.is_empty()
    }

    /// Mark `action`'s slot busy; fails if it already is.
    pub(crate) fn mark_busy(&mut self, action: Action) -> PipelineResult<()> {
        if !self.busy.insert(action.slot()) {
            return Err(PipelineError::Busy(action));
        }
        Ok(())
    }

    pub(crate) fn clear_busy(&mut self, action: Action) {
        self.busy.remove(&action.slot());
    }

    /// Number of times `slot` has been written in this session.
    pub fn revision(&self, slot: Slot) -> u64 {
        self.revisions.get(&slot).copied().unwrap_or(0)
    }

    pub(crate) fn touch(&mut self, slot: Slot) {
        *self.revisions.entry(slot).or_insert(0) += 1;
    }

    /// Video status as the editor shows it.
    ///
    /// A failed attempt leaves `video` unset; `Failed` comes from the
    /// recorded error until the next attempt starts.
    pub fn video_status(&self) -> VideoStatus {
        if self.is_busy(Slot::Video) {
            return VideoStatus::InProgress;
        }
        match (&self.video, &self.video_error) {
            (Some(video), _) => video.status,
            (None, Some(_)) => VideoStatus::Failed,
            (None, None) => VideoStatus::NotStarted,
        }
    }

    /// Message of the last failed video attempt.
    pub fn video_error(&self) -> Option<&str> {
        self.video_error.as_deref()
    }

    pub(crate) fn set_video_error(&mut self, error: Option<String>) {
        self.video_error = error;
    }

    pub fn notice(&self) -> Option<&StageNotice> {
        self.notice.as_ref()
    }

    pub(crate) fn set_notice(&mut self, action: Action, message: impl Into<String>) {
        self.notice = Some(StageNotice {
            action,
            message: message.into(),
        });
    }

    pub fn dismiss_error(&mut self) {
        self.notice = None;
    }

    /// Replace the script with user-typed text.
    ///
    /// A script generation still in flight will not overwrite it.
    pub fn edit_script(&mut self, text: impl Into<String>) {
        self.touch(Slot::Script);
        self.script = text.into();
        self.script_origin = if self.script.is_empty() {
            ScriptOrigin::Empty
        } else {
            ScriptOrigin::Edited
        };
    }

    /// Discard everything and start over. In-flight results become stale.
    pub fn reset(&mut self) {
        let epoch = self.epoch + 1;
        *self = Self::new();
        self.epoch = epoch;
        info!(session_id = %self.id, epoch, "Session reset");
    }

    /// Replace this session with a saved project. In-flight results become
    /// stale.
    pub fn load(&mut self, project: SavedProject) {
        let epoch = self.epoch + 1;
        *self = Self::from_saved(project);
        self.epoch = epoch;
        info!(session_id = %self.id, epoch, "Project loaded");
    }

    fn from_saved(project: SavedProject) -> Self {
        Self {
            id: project.id,
            epoch: 0,
            wizard: WizardStateMachine::restore(project.stage, project.max_reached_stage),
            url: project.url,
            language: project.language,
            gender: project.gender,
            script_style: ScriptStyle::default(),
            product: project.product_data,
            model: project.generated_model,
            script: project.script,
            script_origin: project.script_origin,
            audio: project.audio,
            video: project.video,
            music: project.music,
            busy: HashSet::new(),
            revisions: HashMap::new(),
            video_error: None,
            notice: None,
        }
    }

    /// Snapshot for persistence.
    pub fn to_saved(&self) -> SavedProject {
        SavedProject {
            id: self.id.clone(),
            last_modified: Utc::now(),
            stage: self.stage(),
            max_reached_stage: self.max_reached(),
            url: self.url.clone(),
            language: self.language,
            gender: self.gender,
            product_data: self.product.clone(),
            generated_model: self.model.clone(),
            script: self.script.clone(),
            script_origin: self.script_origin,
            audio: self.audio.clone(),
            video: self.video.clone(),
            music: self.music.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clab_models::InlineMedia;

    use super::*;

    #[test]
    fn test_busy_guard_per_slot() {
        let mut session = WizardSession::new();
        session.mark_busy(Action::GenerateScript).unwrap();
        assert!(matches!(
            session.mark_busy(Action::ModifyScript),
            Err(PipelineError::Busy(Action::ModifyScript))
        ));
        session.mark_busy(Action::GenerateVideo).unwrap();
        session.mark_busy(Action::GenerateAudio).unwrap();

        session.clear_busy(Action::ModifyScript);
        assert!(!session.is_busy(Slot::Script));
        assert!(session.is_busy(Slot::Video));
    }

    #[test]
    fn test_proceed_to_model_requires_product() {
        let mut session = WizardSession::new();
        assert!(session.proceed_to_model().is_err());
        assert_eq!(session.stage(), Stage::InputUrl);

        session.product = Some(ProductData::placeholder("u"));
        session.wizard_mut().advance_to(Stage::ReviewProduct);
        session.proceed_to_model().unwrap();
        assert_eq!(session.stage(), Stage::GenerateModel);
    }

    #[test]
    fn test_proceed_to_editor_requires_video_and_audio() {
        let mut session = WizardSession::new();
        session.wizard_mut().advance_to(Stage::GenerateVideos);
        session.audio = Some(AudioAsset::from_pcm(&[0; 4]));
        session.set_video_error(Some("boom".into()));
        assert!(session.proceed_to_editor().is_err());

        session.video = Some(VideoAsset::completed(InlineMedia::new("dmlk", "video/mp4"), "p"));
        session.audio = None;
        assert!(session.proceed_to_editor().is_err());

        session.audio = Some(AudioAsset::from_pcm(&[0; 4]));
        session.proceed_to_editor().unwrap();
        assert_eq!(session.stage(), Stage::FinalEditor);
        assert_eq!(session.max_reached(), Stage::FinalEditor);
    }

    #[test]
    fn test_reset_bumps_epoch_and_clears() {
        let mut session = WizardSession::new();
        session.script = "hello".into();
        session.mark_busy(Action::GenerateAudio).unwrap();
        let old_id = session.id.clone();

        session.reset();

        assert_eq!(session.epoch(), 1);
        assert!(session.script.is_empty());
        assert!(!session.any_busy());
        assert_ne!(session.id, old_id);
    }

    #[test]
    fn test_saved_round_trip_keeps_stages() {
        let mut session = WizardSession::new();
        session.url = "https://shop.example/mug".into();
        session.product = Some(ProductData::placeholder(&session.url));
        session.wizard_mut().advance_to(Stage::GenerateModel);
        session.navigate(Stage::ReviewProduct).unwrap();
        session.edit_script("Buy now");

        let saved = session.to_saved();
        let mut other = WizardSession::new();
        other.load(saved);

        assert_eq!(other.id, session.id);
        assert_eq!(other.stage(), Stage::ReviewProduct);
        assert_eq!(other.max_reached(), Stage::GenerateModel);
        assert_eq!(other.script_origin, ScriptOrigin::Edited);
        assert_eq!(other.epoch(), 1);
    }

    #[test]
    fn test_video_status_reflects_busy() {
        let mut session = WizardSession::new();
        assert_eq!(session.video_status(), VideoStatus::NotStarted);
        session.mark_busy(Action::GenerateVideo).unwrap();
        assert_eq!(session.video_status(), VideoStatus::InProgress);
    }

    #[test]
    fn test_video_status_failed_without_asset() {
        let mut session = WizardSession::new();
        session.set_video_error(Some("Image rejected".into()));
        assert!(session.video.is_none());
        assert_eq!(session.video_status(), VideoStatus::Failed);
        assert_eq!(session.video_error(), Some("Image rejected"));

        session.mark_busy(Action::GenerateVideo).unwrap();
        assert_eq!(session.video_status(), VideoStatus::InProgress);
    }

    #[test]
    fn test_edit_script_bumps_revision() {
        let mut session = WizardSession::new();
        assert_eq!(session.revision(Slot::Script), 0);
        session.edit_script("Mine");
        assert_eq!(session.revision(Slot::Script), 1);
        assert_eq!(session.revision(Slot::Product), 0);
    }
}
