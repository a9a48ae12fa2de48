//! Inline media payloads and the generated model image.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Base64-encoded bytes plus their media type, as returned by the
/// generative service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineMedia {
    /// Base64 (standard alphabet) encoded payload
    pub data: String,
    pub mime_type: String,
}

impl InlineMedia {
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Encode raw bytes.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self::new(STANDARD.encode(bytes), mime_type)
    }

    /// Self-contained `data:` URL for display or playback.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Parse a base64 `data:` URL as produced by [`InlineMedia::data_url`].
    pub fn from_data_url(url: &str) -> ModelResult<Self> {
        let (header, data) = url
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(','))
            .ok_or_else(|| ModelError::invalid_data_url("expected data:<type>;base64,<payload>"))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| ModelError::invalid_data_url("payload is not base64"))?;
        Ok(Self::new(data, mime_type))
    }

    /// Decode the payload.
    pub fn decode(&self) -> ModelResult<Vec<u8>> {
        Ok(STANDARD.decode(self.data.as_bytes())?)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// AI model image showing the product.
///
/// The displayable reference is derived from the stored bytes and media type
/// on every call, so it can never disagree with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedModel {
    pub image: InlineMedia,
    /// Exact prompt text the image was generated from
    pub prompt_used: String,
}

impl GeneratedModel {
    pub fn new(image: InlineMedia, prompt_used: impl Into<String>) -> Self {
        Self {
            image,
            prompt_used: prompt_used.into(),
        }
    }

    /// Displayable image reference.
    pub fn image_url(&self) -> String {
        self.image.data_url()
    }

    pub fn raw_base64(&self) -> &str {
        &self.image.data
    }

    pub fn mime_type(&self) -> &str {
        &self.image.mime_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url_tracks_bytes_and_type() {
        let model = GeneratedModel::new(InlineMedia::new("AAEC", "image/png"), "prompt");
        assert_eq!(model.image_url(), "data:image/png;base64,AAEC");

        let replaced = GeneratedModel::new(InlineMedia::new("BBBB", "image/jpeg"), "prompt");
        assert_eq!(replaced.image_url(), "data:image/jpeg;base64,BBBB");
    }

    #[test]
    fn test_inline_media_decode() {
        let media = InlineMedia::from_bytes(&[1, 2, 3], "application/octet-stream");
        assert_eq!(media.decode().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_data_url_parses_back() {
        let media = InlineMedia::from_bytes(&[9, 8, 7], "audio/mpeg");
        let parsed = InlineMedia::from_data_url(&media.data_url()).unwrap();
        assert_eq!(parsed, media);

        assert!(InlineMedia::from_data_url("https://cdn.example/a.mp3").is_err());
        assert!(InlineMedia::from_data_url("data:text/plain,hello").is_err());
    }

    #[test]
    fn test_inline_media_rejects_bad_base64() {
        let media = InlineMedia::new("***", "image/png");
        assert!(media.decode().is_err());
    }
}
