//! Single-slot playback.
//!
//! Only one preview plays at a time: starting a new one stops whatever the
//! slot held before.

use clab_models::{AudioAsset, ModelResult, PCM_SAMPLE_RATE};

/// A playing preview that can be stopped.
pub trait Playback: Send {
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
}

/// Decoded voiceover preview.
#[derive(Debug, Clone)]
pub struct PcmPlayback {
    samples: Vec<f32>,
    playing: bool,
}

impl PcmPlayback {
    /// Decode `audio` into normalized samples ready to play.
    pub fn from_asset(audio: &AudioAsset) -> ModelResult<Self> {
        Ok(Self {
            samples: audio.decode_samples()?,
            playing: true,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / PCM_SAMPLE_RATE as f64
    }
}

impl Playback for PcmPlayback {
    fn stop(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Holds at most one active playback.
#[derive(Debug)]
pub struct PlaybackSlot<P: Playback> {
    current: Option<P>,
}

impl<P: Playback> Default for PlaybackSlot<P> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<P: Playback> PlaybackSlot<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the previous playback, then hold `playback`.
    ///
    /// Returns the stopped playback, if any.
    pub fn start(&mut self, playback: P) -> Option<P> {
        let previous = self.stop();
        self.current = Some(playback);
        previous
    }

    pub fn stop(&mut self) -> Option<P> {
        let mut previous = self.current.take()?;
        previous.stop();
        Some(previous)
    }

    pub fn current(&self) -> Option<&P> {
        self.current.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.current.as_ref().is_some_and(Playback::is_playing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_stops_previous() {
        let audio = AudioAsset::from_pcm(&[0, 0x40, 0, 0xC0]);
        let mut slot = PlaybackSlot::new();

        assert!(slot.start(PcmPlayback::from_asset(&audio).unwrap()).is_none());
        let stopped = slot.start(PcmPlayback::from_asset(&audio).unwrap()).unwrap();

        assert!(!stopped.is_playing());
        assert!(slot.is_playing());
    }

    #[test]
    fn test_pcm_preview_decodes_samples() {
        let audio = AudioAsset::from_pcm(&[0, 0x40, 0, 0xC0]);
        let playback = PcmPlayback::from_asset(&audio).unwrap();
        assert_eq!(playback.samples(), &[0.5, -0.5]);
        assert!((playback.duration_secs() - 2.0 / 24000.0).abs() < 1e-12);
    }

    #[test]
    fn test_stop_empties_slot() {
        let audio = AudioAsset::from_pcm(&[0, 0]);
        let mut slot = PlaybackSlot::new();
        slot.start(PcmPlayback::from_asset(&audio).unwrap());
        assert!(slot.stop().is_some());
        assert!(slot.current().is_none());
        assert!(!slot.is_playing());
    }
}
