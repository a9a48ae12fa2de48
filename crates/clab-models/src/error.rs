//! Model error types.

use thiserror::Error;

/// Result type for model construction.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building model values from raw payloads.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Invalid PCM payload: {0}")]
    InvalidPcm(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unknown music track: {0}")]
    UnknownTrack(String),

    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),
}

impl ModelError {
    pub fn invalid_pcm(msg: impl Into<String>) -> Self {
        Self::InvalidPcm(msg.into())
    }

    pub fn unknown_track(id: impl Into<String>) -> Self {
        Self::UnknownTrack(id.into())
    }

    pub fn invalid_data_url(msg: impl Into<String>) -> Self {
        Self::InvalidDataUrl(msg.into())
    }
}
