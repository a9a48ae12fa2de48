//! Final asset composition.
//!
//! Once a completed video, a voiceover and background music exist, the
//! composer gathers their bytes into a [`RenderBundle`] and hands it to a
//! [`RenderBackend`]. Catalog music is fetched at most once per selection
//! identity and cached for the lifetime of the [`MusicLibrary`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clab_models::{
    BackgroundMusicSelection, InlineMedia, MusicSource, MusicTrack, ProjectId, PCM_SAMPLE_RATE,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{PipelineError, PipelineResult};
use crate::session::WizardSession;

/// Default background music volume.
pub const DEFAULT_MUSIC_VOLUME: f32 = 0.3;

/// Fetches remote music bytes.
#[async_trait]
pub trait MusicFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> PipelineResult<Vec<u8>>;
}

/// Fetches music over HTTP.
pub struct HttpMusicFetcher {
    http: Client,
}

impl HttpMusicFetcher {
    pub fn new(timeout: Duration) -> PipelineResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::music_fetch(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl MusicFetcher for HttpMusicFetcher {
    async fn fetch(&self, url: &str) -> PipelineResult<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::music_fetch(e.to_string()))?;
        if !response.status().is_success() {
            return Err(PipelineError::music_fetch(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::music_fetch(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Materializes music selections, caching bytes by selection identity.
pub struct MusicLibrary {
    fetcher: Arc<dyn MusicFetcher>,
    cache: Mutex<HashMap<String, Vec<u8>>>,
}

impl MusicLibrary {
    pub fn new(fetcher: Arc<dyn MusicFetcher>) -> Self {
        Self {
            fetcher,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Ensure `selection` carries its bytes.
    ///
    /// Uploads restored from a saved project are decoded from their preview
    /// data URL.
    pub async fn materialize(&self, selection: &mut BackgroundMusicSelection) -> PipelineResult<()> {
        if selection.is_materialized() {
            return Ok(());
        }

        let track_id = match &selection.source {
            MusicSource::Catalog { track_id } => track_id.clone(),
            MusicSource::Upload { file_name } => {
                debug!(file_name = %file_name, "Decoding uploaded music from preview");
                let bytes = InlineMedia::from_data_url(&selection.preview_url)?.decode()?;
                selection.bytes = Some(bytes);
                return Ok(());
            }
        };

        let identity = selection.identity();
        // Held across the fetch so concurrent selections of one track fetch once.
        let mut cache = self.cache.lock().await;
        if let Some(bytes) = cache.get(&identity) {
            debug!(identity = %identity, "Music cache hit");
            selection.bytes = Some(bytes.clone());
            return Ok(());
        }

        let track = MusicTrack::find(&track_id)?;
        info!(track = track.id, url = track.url, "Fetching catalog music");
        let bytes = self.fetcher.fetch(track.url).await?;
        cache.insert(identity, bytes.clone());
        selection.bytes = Some(bytes);
        Ok(())
    }
}

/// Background music mix parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMixSettings")]
pub struct MixSettings {
    volume: f32,
    start_offset_secs: f64,
}

/// Unchecked wire form of [`MixSettings`].
#[derive(Deserialize)]
struct RawMixSettings {
    volume: f32,
    start_offset_secs: f64,
}

impl TryFrom<RawMixSettings> for MixSettings {
    type Error = PipelineError;

    fn try_from(raw: RawMixSettings) -> PipelineResult<Self> {
        Self::new(raw.volume, raw.start_offset_secs)
    }
}

impl Default for MixSettings {
    fn default() -> Self {
        Self {
            volume: DEFAULT_MUSIC_VOLUME,
            start_offset_secs: 0.0,
        }
    }
}

impl MixSettings {
    /// Volume is clamped to [0, 1]; the offset must be finite and >= 0.
    pub fn new(volume: f32, start_offset_secs: f64) -> PipelineResult<Self> {
        if !volume.is_finite() {
            return Err(PipelineError::invalid_setting("music volume must be a number"));
        }
        if !start_offset_secs.is_finite() || start_offset_secs < 0.0 {
            return Err(PipelineError::invalid_setting(format!(
                "music start offset must be >= 0, got {}",
                start_offset_secs
            )));
        }
        Ok(Self {
            volume: volume.clamp(0.0, 1.0),
            start_offset_secs,
        })
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn start_offset_secs(&self) -> f64 {
        self.start_offset_secs
    }
}

/// Everything a render backend needs to produce the final clip.
#[derive(Debug, Clone)]
pub struct RenderBundle {
    pub project_id: ProjectId,
    pub video: Vec<u8>,
    pub video_mime_type: String,
    /// Raw 16-bit LE mono PCM
    pub voice_pcm: Vec<u8>,
    pub voice_sample_rate: u32,
    pub music: Vec<u8>,
    pub music_name: String,
    pub mix: MixSettings,
}

/// Where a backend put the rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderReceipt {
    pub location: String,
}

/// External renderer that muxes the bundle.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    async fn render(&self, bundle: RenderBundle) -> PipelineResult<RenderReceipt>;
}

/// Gates and assembles render bundles.
pub struct AssetComposer {
    library: MusicLibrary,
    backend: Arc<dyn RenderBackend>,
}

impl AssetComposer {
    pub fn new(library: MusicLibrary, backend: Arc<dyn RenderBackend>) -> Self {
        Self { library, backend }
    }

    pub fn library(&self) -> &MusicLibrary {
        &self.library
    }

    /// Whether the session has every input for composition. Music bytes are
    /// fetched on demand so only the selection is checked here.
    pub fn is_ready(session: &WizardSession) -> bool {
        session.video.as_ref().is_some_and(|v| v.is_completed())
            && session.audio.is_some()
            && session.music.is_some()
    }

    /// Build the bundle from a session snapshot.
    pub async fn bundle(
        &self,
        session: &WizardSession,
        mix: MixSettings,
    ) -> PipelineResult<RenderBundle> {
        let video = session
            .video
            .as_ref()
            .filter(|v| v.is_completed())
            .and_then(|v| v.media.as_ref())
            .ok_or_else(|| PipelineError::precondition("a completed video is required"))?;
        let audio = session
            .audio
            .as_ref()
            .ok_or_else(|| PipelineError::precondition("a voiceover is required"))?;
        let mut music = session
            .music
            .clone()
            .ok_or_else(|| PipelineError::precondition("background music is required"))?;

        self.library.materialize(&mut music).await?;
        let music_bytes = music
            .bytes
            .take()
            .ok_or_else(|| PipelineError::precondition("background music has no data"))?;

        Ok(RenderBundle {
            project_id: session.id.clone(),
            video: video.decode()?,
            video_mime_type: video.mime_type.clone(),
            voice_pcm: audio.pcm_bytes()?,
            voice_sample_rate: PCM_SAMPLE_RATE,
            music: music_bytes,
            music_name: music.display_name,
            mix,
        })
    }

    /// Bundle and render.
    pub async fn compose(
        &self,
        session: &WizardSession,
        mix: MixSettings,
    ) -> PipelineResult<RenderReceipt> {
        let bundle = self.bundle(session, mix).await?;
        info!(
            project_id = %bundle.project_id,
            video_bytes = bundle.video.len(),
            voice_bytes = bundle.voice_pcm.len(),
            music_bytes = bundle.music.len(),
            volume = mix.volume(),
            "Composing final asset"
        );
        self.backend.render(bundle).await
    }
}
