//! In-memory PCM sample source

use crate::types::{Sample, StereoSample};

use super::SampleSource;

/// A fully decoded track held in memory as stereo frames
///
/// Decoding happens on the control thread; reads on the audio thread are a
/// bounds-checked `memcpy`, so the render path never waits on I/O.
#[derive(Debug, Clone)]
pub struct PcmSource {
    frames: Vec<StereoSample>,
    sample_rate: u32,
    channels: u16,
}

impl PcmSource {
    /// Wrap already-decoded stereo frames
    pub fn new(frames: Vec<StereoSample>, sample_rate: u32, channels: u16) -> Self {
        Self {
            frames,
            sample_rate: sample_rate.max(1),
            channels: channels.clamp(1, 2),
        }
    }

    /// Build from interleaved samples with `channels` channels per frame
    ///
    /// Mono is duplicated to both sides; anything wider than stereo keeps
    /// the first two channels.
    pub fn from_interleaved(samples: &[Sample], channels: u16, sample_rate: u32) -> Self {
        let channels = channels.max(1) as usize;
        let frames = samples
            .chunks_exact(channels)
            .map(|frame| {
                if channels == 1 {
                    StereoSample::mono(frame[0])
                } else {
                    StereoSample::new(frame[0], frame[1])
                }
            })
            .collect();
        Self::new(frames, sample_rate, channels.min(2) as u16)
    }

    /// Decoded frames
    pub fn frames(&self) -> &[StereoSample] {
        &self.frames
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the source holds no audio
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl SampleSource for PcmSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn length_in_samples(&self) -> u64 {
        self.frames.len() as u64
    }

    fn channel_count(&self) -> u16 {
        self.channels
    }

    fn read_block(&self, start: u64, out: &mut [StereoSample]) -> usize {
        let len = self.frames.len();
        let start = (start.min(len as u64)) as usize;
        let count = (len - start).min(out.len());
        out[..count].copy_from_slice(&self.frames[start..start + count]);
        count
    }
}
