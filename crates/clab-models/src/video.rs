//! Generated video clip.

use serde::{Deserialize, Serialize};

use crate::media::InlineMedia;

/// Video generation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::NotStarted => "not_started",
            VideoStatus::InProgress => "in_progress",
            VideoStatus::Completed => "completed",
            VideoStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Completed | VideoStatus::Failed)
    }
}

impl std::fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The session's active video clip.
///
/// Only successful generations produce one; a failed attempt leaves the
/// session without a clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VideoAsset {
    pub status: VideoStatus,
    /// Encoded clip, present once completed
    pub media: Option<InlineMedia>,
    /// Prompt the clip was generated from
    pub prompt_used: Option<String>,
}

impl VideoAsset {
    pub fn completed(media: InlineMedia, prompt_used: impl Into<String>) -> Self {
        Self {
            status: VideoStatus::Completed,
            media: Some(media),
            prompt_used: Some(prompt_used.into()),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == VideoStatus::Completed && self.media.is_some()
    }

    /// Playable reference for a completed clip.
    pub fn playback_url(&self) -> Option<String> {
        self.media.as_ref().map(InlineMedia::data_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_status_terminal() {
        assert!(!VideoStatus::NotStarted.is_terminal());
        assert!(!VideoStatus::InProgress.is_terminal());
        assert!(VideoStatus::Completed.is_terminal());
        assert!(VideoStatus::Failed.is_terminal());
    }

    #[test]
    fn test_completed_video_has_playback_url() {
        let video = VideoAsset::completed(InlineMedia::new("AAAA", "video/mp4"), "prompt");
        assert!(video.is_completed());
        assert_eq!(video.playback_url().as_deref(), Some("data:video/mp4;base64,AAAA"));
        assert!(VideoAsset::default().playback_url().is_none());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&VideoStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
