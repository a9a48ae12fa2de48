//! Background music catalog and selection.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::media::InlineMedia;

/// A stock track with a stable streaming URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MusicTrack {
    pub id: &'static str,
    pub title: &'static str,
    pub genre: &'static str,
    pub duration: &'static str,
    pub url: &'static str,
}

/// Fixed stock catalog.
pub const STOCK_MUSIC: [MusicTrack; 3] = [
    MusicTrack {
        id: "stock1",
        title: "Upbeat Corporate",
        genre: "Business",
        duration: "2:15",
        url: "https://assets.mixkit.co/music/preview/mixkit-tech-house-vibes-130.mp3",
    },
    MusicTrack {
        id: "stock2",
        title: "Chill Lo-Fi",
        genre: "Lifestyle",
        duration: "1:45",
        url: "https://assets.mixkit.co/music/preview/mixkit-driving-ambition-32.mp3",
    },
    MusicTrack {
        id: "stock3",
        title: "Cinematic Ambient",
        genre: "Luxury",
        duration: "3:00",
        url: "https://assets.mixkit.co/music/preview/mixkit-serene-view-443.mp3",
    },
];

impl MusicTrack {
    /// Look up a catalog track by id.
    pub fn find(id: &str) -> ModelResult<&'static MusicTrack> {
        STOCK_MUSIC
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| ModelError::unknown_track(id))
    }
}

/// Where a background track came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MusicSource {
    Catalog { track_id: String },
    Upload { file_name: String },
}

/// The background track picked for the final edit.
///
/// Previewing only needs `preview_url`. Composition needs `bytes`, which
/// uploads carry from the start and catalog tracks get once materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundMusicSelection {
    pub source: MusicSource,
    pub display_name: String,
    pub preview_url: String,
    #[serde(skip)]
    pub bytes: Option<Vec<u8>>,
}

impl BackgroundMusicSelection {
    /// Select a catalog track. Bytes are fetched later.
    pub fn catalog(track: &MusicTrack) -> Self {
        Self {
            source: MusicSource::Catalog {
                track_id: track.id.to_string(),
            },
            display_name: track.title.to_string(),
            preview_url: track.url.to_string(),
            bytes: None,
        }
    }

    /// Select a user upload. The preview is a self-contained data URL.
    pub fn upload(file_name: impl Into<String>, bytes: Vec<u8>, mime_type: &str) -> Self {
        let file_name = file_name.into();
        Self {
            preview_url: InlineMedia::from_bytes(&bytes, mime_type).data_url(),
            display_name: file_name.clone(),
            source: MusicSource::Upload { file_name },
            bytes: Some(bytes),
        }
    }

    /// Stable identity used to cache materialized bytes.
    pub fn identity(&self) -> String {
        match &self.source {
            MusicSource::Catalog { track_id } => format!("catalog:{}", track_id),
            MusicSource::Upload { file_name } => format!("upload:{}", file_name),
        }
    }

    pub fn is_materialized(&self) -> bool {
        self.bytes.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_catalog_track() {
        let track = MusicTrack::find("stock2").unwrap();
        assert_eq!(track.title, "Chill Lo-Fi");
        assert!(MusicTrack::find("stock9").is_err());
    }

    #[test]
    fn test_catalog_selection_needs_materialization() {
        let selection = BackgroundMusicSelection::catalog(&STOCK_MUSIC[0]);
        assert!(!selection.is_materialized());
        assert_eq!(selection.preview_url, STOCK_MUSIC[0].url);
        assert_eq!(selection.identity(), "catalog:stock1");
    }

    #[test]
    fn test_upload_selection_has_bytes() {
        let selection = BackgroundMusicSelection::upload("song.mp3", vec![1, 2, 3], "audio/mpeg");
        assert!(selection.is_materialized());
        assert!(selection.preview_url.starts_with("data:audio/mpeg;base64,"));
        assert_eq!(selection.identity(), "upload:song.mp3");
    }
}
