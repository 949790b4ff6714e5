//! Common types for Oto
//!
//! This module contains the fundamental audio types shared by the engine,
//! the sample sources and the audio backend: stereo samples, pre-allocated
//! stereo buffers, deck identifiers and the transport play state.

/// Default output sample rate when the device does not dictate one
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Number of decks created when no configuration says otherwise
pub const DEFAULT_NUM_DECKS: usize = 3;

/// Upper bound on decks per session (mixer membership is a fixed-size set)
pub const MAX_DECKS: usize = 8;

/// Maximum buffer size to pre-allocate for real-time safety
///
/// Covers all common device configurations (64 .. 4096 frames).
/// Pre-allocating to this size eliminates allocations in the audio callback.
pub const MAX_BUFFER_SIZE: usize = 8192;

/// Largest speed ratio a deck accepts
pub const MAX_SPEED_RATIO: f64 = 100.0;

/// Audio sample type (32-bit float for processing)
pub type Sample = f32;

/// A single stereo sample (left and right channels)
///
/// Uses `#[repr(C)]` to ensure predictable memory layout: [left, right].
/// This enables zero-copy conversion between `&[StereoSample]` and `&[f32]`
/// (interleaved format) using bytemuck.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StereoSample {
    pub left: Sample,
    pub right: Sample,
}

impl StereoSample {
    /// Create a new stereo sample
    #[inline]
    pub fn new(left: Sample, right: Sample) -> Self {
        Self { left, right }
    }

    /// Create a silent stereo sample
    #[inline]
    pub fn silence() -> Self {
        Self::default()
    }

    /// Create a mono sample (same value in both channels)
    #[inline]
    pub fn mono(value: Sample) -> Self {
        Self { left: value, right: value }
    }

    /// Linear interpolation towards `other` (`t` in 0..1)
    #[inline]
    pub fn lerp(&self, other: &Self, t: Sample) -> Self {
        Self {
            left: self.left + (other.left - self.left) * t,
            right: self.right + (other.right - self.right) * t,
        }
    }
}

impl std::ops::Add for StereoSample {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            left: self.left + other.left,
            right: self.right + other.right,
        }
    }
}

impl std::ops::AddAssign for StereoSample {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.left += other.left;
        self.right += other.right;
    }
}

impl std::ops::Mul<Sample> for StereoSample {
    type Output = Self;

    #[inline]
    fn mul(self, factor: Sample) -> Self {
        Self {
            left: self.left * factor,
            right: self.right * factor,
        }
    }
}

impl std::ops::MulAssign<Sample> for StereoSample {
    #[inline]
    fn mul_assign(&mut self, factor: Sample) {
        self.left *= factor;
        self.right *= factor;
    }
}

/// A pre-allocated block of stereo samples
///
/// Allocated once (usually at [`MAX_BUFFER_SIZE`]) and then resized in place
/// with [`StereoBuffer::set_len_from_capacity`], which never allocates.
#[derive(Debug, Clone, Default)]
pub struct StereoBuffer {
    samples: Vec<StereoSample>,
}

impl StereoBuffer {
    /// Create a buffer filled with silence
    pub fn silence(len: usize) -> Self {
        Self {
            samples: vec![StereoSample::silence(); len],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Allocated capacity in stereo samples
    #[inline]
    pub fn capacity(&self) -> usize {
        self.samples.capacity()
    }

    /// Set the working length of a pre-allocated buffer (real-time safe)
    ///
    /// Growing past the capacity would allocate; callers on the audio thread
    /// clamp to [`MAX_BUFFER_SIZE`] first. Newly exposed elements are silent.
    #[inline]
    pub fn set_len_from_capacity(&mut self, new_len: usize) {
        let current_len = self.samples.len();
        if new_len > current_len {
            debug_assert!(new_len <= self.samples.capacity(), "set_len_from_capacity called with len > capacity");
            self.samples.resize(new_len, StereoSample::silence());
        } else {
            self.samples.truncate(new_len);
        }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [StereoSample] {
        &mut self.samples
    }

    /// Zero-copy view as interleaved f32 `[L, R, L, R, ...]`
    #[inline]
    pub fn as_interleaved(&self) -> &[Sample] {
        bytemuck::cast_slice(&self.samples)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StereoSample> {
        self.samples.iter()
    }
}

/// Deck identifier (index into the session's decks)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeckId(pub usize);

impl DeckId {
    /// Create a new deck ID (panics if >= MAX_DECKS)
    pub fn new(id: usize) -> Self {
        assert!(id < MAX_DECKS, "Deck ID must be less than {}", MAX_DECKS);
        Self(id)
    }

    /// Index into per-deck arrays
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }

    /// Get the deck number (1-based, for display)
    pub fn display_number(&self) -> usize {
        self.0 + 1
    }
}

impl std::fmt::Display for DeckId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Deck {}", self.display_number())
    }
}

/// Transport state of a deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Stopped,
    Playing,
}

impl PlayState {
    /// Encoding used by the lock-free deck atomics
    #[inline]
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            PlayState::Stopped => 0,
            PlayState::Playing => 1,
        }
    }

    #[inline]
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => PlayState::Playing,
            _ => PlayState::Stopped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_sample_operations() {
        let a = StereoSample::new(1.0, 2.0);
        let b = StereoSample::new(0.5, 0.5);

        let sum = a + b;
        assert_eq!(sum.left, 1.5);
        assert_eq!(sum.right, 2.5);

        let scaled = a * 0.5;
        assert_eq!(scaled.left, 0.5);
        assert_eq!(scaled.right, 1.0);
    }

    #[test]
    fn test_lerp_midpoint() {
        let a = StereoSample::new(0.0, 1.0);
        let b = StereoSample::new(1.0, -1.0);
        let mid = a.lerp(&b, 0.5);
        assert_eq!(mid, StereoSample::new(0.5, 0.0));
        assert_eq!(a.lerp(&b, 0.0), a);
    }

    #[test]
    fn test_set_len_from_capacity_does_not_reallocate() {
        let mut buffer = StereoBuffer::silence(MAX_BUFFER_SIZE);
        let capacity = buffer.capacity();

        buffer.set_len_from_capacity(128);
        assert_eq!(buffer.len(), 128);

        buffer.set_len_from_capacity(MAX_BUFFER_SIZE);
        assert_eq!(buffer.len(), MAX_BUFFER_SIZE);
        assert_eq!(buffer.capacity(), capacity);
    }

    #[test]
    fn test_interleaved_view() {
        let mut buffer = StereoBuffer::silence(2);
        buffer.as_mut_slice()[0] = StereoSample::new(1.0, 2.0);
        buffer.as_mut_slice()[1] = StereoSample::new(3.0, 4.0);
        assert_eq!(buffer.as_interleaved(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_play_state_encoding() {
        for state in [PlayState::Stopped, PlayState::Playing] {
            assert_eq!(PlayState::from_u8(state.to_u8()), state);
        }
        assert_eq!(PlayState::from_u8(42), PlayState::Stopped);
    }
}
