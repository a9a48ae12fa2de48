//! Voiceover audio.
//!
//! The speech service returns raw PCM with no container header. Sample rate,
//! channel count and bit depth are a fixed contract with that service and
//! are never read from the payload.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Sample rate of synthesized speech (Hz).
pub const PCM_SAMPLE_RATE: u32 = 24_000;

/// Bytes per sample (16-bit signed, mono).
pub const PCM_BYTES_PER_SAMPLE: usize = 2;

/// Synthesized voiceover: base64 PCM plus its playable duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAsset {
    /// Base64-encoded 16-bit little-endian mono PCM at 24 kHz
    pub pcm_base64: String,
    /// Duration in seconds, derived from the payload length
    pub duration_secs: f64,
}

impl AudioAsset {
    /// Build an asset from the service payload, computing its duration.
    pub fn from_base64(pcm_base64: impl Into<String>) -> ModelResult<Self> {
        let pcm_base64 = pcm_base64.into();
        let bytes = STANDARD.decode(pcm_base64.as_bytes())?;
        Ok(Self {
            duration_secs: pcm_duration_secs(bytes.len()),
            pcm_base64,
        })
    }

    /// Build an asset from raw PCM bytes.
    pub fn from_pcm(bytes: &[u8]) -> Self {
        Self {
            pcm_base64: STANDARD.encode(bytes),
            duration_secs: pcm_duration_secs(bytes.len()),
        }
    }

    /// Raw PCM bytes.
    pub fn pcm_bytes(&self) -> ModelResult<Vec<u8>> {
        Ok(STANDARD.decode(self.pcm_base64.as_bytes())?)
    }

    /// Number of 16-bit samples in the payload.
    pub fn sample_count(&self) -> ModelResult<usize> {
        Ok(self.pcm_bytes()?.len() / PCM_BYTES_PER_SAMPLE)
    }

    /// Decode to normalized f32 samples in [-1.0, 1.0).
    pub fn decode_samples(&self) -> ModelResult<Vec<f32>> {
        let bytes = self.pcm_bytes()?;
        if bytes.len() % PCM_BYTES_PER_SAMPLE != 0 {
            return Err(ModelError::invalid_pcm(format!(
                "odd byte length {} for 16-bit samples",
                bytes.len()
            )));
        }
        Ok(bytes
            .chunks_exact(PCM_BYTES_PER_SAMPLE)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
            .collect())
    }
}

/// Duration of a PCM payload of `byte_len` bytes.
pub fn pcm_duration_secs(byte_len: usize) -> f64 {
    let samples = byte_len / PCM_BYTES_PER_SAMPLE;
    samples as f64 / PCM_SAMPLE_RATE as f64
}
