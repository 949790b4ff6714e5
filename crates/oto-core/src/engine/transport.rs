//! Transport - playback position and play/stop state for one source

use thiserror::Error;

use super::AudioSource;
use crate::source::SharedSource;
use crate::types::{PlayState, StereoSample};

/// Errors reported by transport queries
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Relative position of an empty or unloaded track
    #[error("track has zero length")]
    ZeroLength,
}

/// Reads a sample source at its native rate
///
/// Position only moves while playing (by the frames actually read) or on an
/// explicit seek. At end-of-stream the transport keeps playing silence and
/// holds its last position rather than stopping or rewinding.
pub struct Transport {
    source: Option<SharedSource>,
    position: u64,
    length: u64,
    native_rate: u32,
    state: PlayState,
    gain: f32,
}

impl Transport {
    /// Create an empty, stopped transport at unity gain
    pub fn new() -> Self {
        Self {
            source: None,
            position: 0,
            length: 0,
            native_rate: 0,
            state: PlayState::Stopped,
            gain: 1.0,
        }
    }

    /// Attach a source, rewinding to the start and stopping
    ///
    /// The previously attached source (if any) is released here; with a
    /// deferred-drop handle its memory is reclaimed off the audio thread.
    pub fn load(&mut self, source: SharedSource) {
        self.length = source.length_in_samples();
        self.native_rate = source.sample_rate();
        self.source = Some(source);
        self.position = 0;
        self.state = PlayState::Stopped;
    }

    /// Detach the current source, leaving the transport empty and stopped
    pub fn detach(&mut self) -> Option<SharedSource> {
        self.position = 0;
        self.length = 0;
        self.native_rate = 0;
        self.state = PlayState::Stopped;
        self.source.take()
    }

    /// Start playback (no-op if already playing)
    pub fn play(&mut self) {
        self.state = PlayState::Playing;
    }

    /// Stop playback (no-op if already stopped)
    pub fn stop(&mut self) {
        self.state = PlayState::Stopped;
    }

    /// Seek to `seconds`, clamped to `[0, length]`
    pub fn seek(&mut self, seconds: f64) {
        if self.native_rate == 0 {
            return;
        }
        let target = seconds * self.native_rate as f64;
        // NaN and negatives land on 0
        let samples = if target > 0.0 { target.round() as u64 } else { 0 };
        self.seek_samples(samples);
    }

    /// Seek to an absolute frame, clamped to the track length
    pub fn seek_samples(&mut self, position: u64) {
        self.position = position.min(self.length);
    }

    /// Set the playback gain, clamped to `[0, 1]`
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = if gain.is_nan() { self.gain } else { gain.clamp(0.0, 1.0) };
    }

    /// `position / length`
    pub fn position_relative(&self) -> Result<f64, TransportError> {
        if self.length == 0 {
            return Err(TransportError::ZeroLength);
        }
        Ok(self.position as f64 / self.length as f64)
    }

    /// Current position in frames
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Track length in frames (0 when empty)
    #[inline]
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Native sample rate of the attached source (0 when empty)
    #[inline]
    pub fn native_rate(&self) -> u32 {
        self.native_rate
    }

    pub fn position_seconds(&self) -> f64 {
        if self.native_rate == 0 {
            0.0
        } else {
            self.position as f64 / self.native_rate as f64
        }
    }

    pub fn length_seconds(&self) -> f64 {
        if self.native_rate == 0 {
            0.0
        } else {
            self.length as f64 / self.native_rate as f64
        }
    }

    #[inline]
    pub fn gain(&self) -> f32 {
        self.gain
    }

    #[inline]
    pub fn state(&self) -> PlayState {
        self.state
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    #[inline]
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Whether the position has reached the end of the track
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.position >= self.length
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for Transport {
    fn prepare(&mut self, _block_size: usize, _sample_rate: u32) {
        // Reads happen at the native rate; conversion lives in the resampler
    }

    fn get_next_block(&mut self, out: &mut [StereoSample]) -> usize {
        let source = match &self.source {
            Some(source) if self.state == PlayState::Playing => source,
            _ => {
                out.fill(StereoSample::silence());
                return 0;
            }
        };

        let produced = source.read_block(self.position, out).min(out.len());
        self.position = (self.position + produced as u64).min(self.length);

        if self.gain != 1.0 {
            for frame in &mut out[..produced] {
                *frame *= self.gain;
            }
        }
        out[produced..].fill(StereoSample::silence());
        produced
    }

    fn release(&mut self) {}
}
