//! Render backend writing the bundle to a directory.
//!
//! The mux itself is done by an external tool; this backend lays out the
//! inputs with a manifest describing how to mix them.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::composer::{MixSettings, RenderBackend, RenderBundle, RenderReceipt};
use crate::error::PipelineResult;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderManifest {
    pub project_id: String,
    pub video_file: String,
    pub video_mime_type: String,
    pub voice_file: String,
    pub voice_sample_rate: u32,
    pub voice_channels: u16,
    pub voice_bits_per_sample: u16,
    pub music_file: String,
    pub music_name: String,
    pub mix: MixSettings,
    pub created_at: DateTime<Utc>,
}

fn video_extension(mime_type: &str) -> &'static str {
    match mime_type {
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        _ => "mp4",
    }
}

/// Writes each bundle to `<root>/<project id>/`.
#[derive(Debug, Clone)]
pub struct DirectoryRenderer {
    root: PathBuf,
}

impl DirectoryRenderer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl RenderBackend for DirectoryRenderer {
    async fn render(&self, bundle: RenderBundle) -> PipelineResult<RenderReceipt> {
        let dir = self.root.join(bundle.project_id.as_str());
        fs::create_dir_all(&dir).await?;

        let video_file = format!("video.{}", video_extension(&bundle.video_mime_type));
        fs::write(dir.join(&video_file), &bundle.video).await?;
        fs::write(dir.join("voiceover.pcm"), &bundle.voice_pcm).await?;
        fs::write(dir.join("music.bin"), &bundle.music).await?;

        let manifest = RenderManifest {
            project_id: bundle.project_id.to_string(),
            video_file,
            video_mime_type: bundle.video_mime_type,
            voice_file: "voiceover.pcm".to_string(),
            voice_sample_rate: bundle.voice_sample_rate,
            voice_channels: 1,
            voice_bits_per_sample: 16,
            music_file: "music.bin".to_string(),
            music_name: bundle.music_name,
            mix: bundle.mix,
            created_at: Utc::now(),
        };
        fs::write(dir.join(MANIFEST_FILE), serde_json::to_vec_pretty(&manifest)?).await?;

        info!(dir = %dir.display(), "Render bundle written");
        Ok(RenderReceipt {
            location: dir.display().to_string(),
        })
    }
}
