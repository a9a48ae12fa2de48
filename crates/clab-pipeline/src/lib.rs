//! The ContentLabs link-to-video pipeline.
//!
//! A [`WizardSession`] owns every artifact of one project. The
//! [`StageRunner`] executes stage actions against a
//! [`clab_genai::GenerationClient`], the [`WizardStateMachine`] gates which
//! stage is reachable, and the [`AssetComposer`] hands the finished assets
//! to a render backend. [`WizardController`] ties them together behind an
//! async mutex.

pub mod composer;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod playback;
pub mod render;
pub mod session;
pub mod stages;
pub mod store;
pub mod wizard;

#[cfg(test)]
mod testing;

pub use composer::{
    AssetComposer, HttpMusicFetcher, MixSettings, MusicFetcher, MusicLibrary, RenderBackend,
    RenderBundle, RenderReceipt,
};
pub use config::PipelineConfig;
pub use controller::WizardController;
pub use error::{PipelineError, PipelineResult};
pub use logging::StageLogger;
pub use playback::{PcmPlayback, Playback, PlaybackSlot};
pub use render::{DirectoryRenderer, RenderManifest};
pub use session::{Action, Slot, StageNotice, WizardSession};
pub use stages::{ApplyOutcome, StageOutput, StageRequest, StageRunner, Ticket};
pub use store::{InMemoryProjectStore, ProjectStore};
pub use wizard::WizardStateMachine;
