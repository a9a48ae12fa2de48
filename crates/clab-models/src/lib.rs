//! Shared data models for the ContentLabs generation pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Product analysis results
//! - Generated model images, voiceover audio and video clips
//! - Background music selections and the stock catalog
//! - Wizard stages and saved project snapshots

pub mod audio;
pub mod error;
pub mod media;
pub mod music;
pub mod options;
pub mod product;
pub mod project;
pub mod stage;
pub mod video;

// Re-export common types
pub use audio::{AudioAsset, PCM_BYTES_PER_SAMPLE, PCM_SAMPLE_RATE};
pub use error::{ModelError, ModelResult};
pub use media::{GeneratedModel, InlineMedia};
pub use music::{BackgroundMusicSelection, MusicSource, MusicTrack, STOCK_MUSIC};
pub use options::{Gender, Language, ScriptEdit, ScriptStyle, DEFAULT_VOICE};
pub use product::{parse_product_url, ProductData, NOT_FOUND, NO_DESCRIPTION, NO_VISUAL_FEATURES};
pub use project::{ProjectId, SavedProject, ScriptOrigin};
pub use stage::Stage;
pub use video::{VideoAsset, VideoStatus};
