//! Block-producing audio sources

use crate::types::StereoSample;

/// Something the render thread can pull stereo blocks from
///
/// Implemented by [`Transport`](super::Transport), [`Resampler`](super::Resampler),
/// [`Deck`](super::Deck) and [`EngineSession`](super::EngineSession); each
/// composes the next by delegation.
pub trait AudioSource {
    /// Configure for the host's block size and output sample rate
    ///
    /// Called before the first block and again whenever the device
    /// configuration changes. May allocate.
    fn prepare(&mut self, block_size: usize, sample_rate: u32);

    /// Fill `out` completely and return the number of frames that carry audio
    ///
    /// Frames that carry no audio are written as silence. Must not block,
    /// allocate or fail.
    fn get_next_block(&mut self, out: &mut [StereoSample]) -> usize;

    /// Release anything acquired in [`prepare`](Self::prepare)
    fn release(&mut self);
}
