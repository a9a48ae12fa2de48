//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use clab_genai::GenAiConfig;
use clab_models::DEFAULT_VOICE;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub genai: GenAiConfig,
    /// Prebuilt voice for the voiceover
    pub voice: String,
    /// Timeout for downloading catalog music
    pub music_fetch_timeout: Duration,
    /// Where rendered bundles are written
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            genai: GenAiConfig::default(),
            voice: DEFAULT_VOICE.to_string(),
            music_fetch_timeout: Duration::from_secs(60),
            output_dir: PathBuf::from("./clab-output"),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            genai: GenAiConfig::from_env(),
            voice: std::env::var("CLAB_VOICE").unwrap_or_else(|_| DEFAULT_VOICE.to_string()),
            music_fetch_timeout: Duration::from_secs(
                std::env::var("CLAB_MUSIC_FETCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            output_dir: std::env::var("CLAB_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./clab-output")),
        }
    }
}
