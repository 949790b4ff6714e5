//! Variable-speed linear resampler wrapping a [`Transport`]
//!
//! Speed changes are done by reading the transport faster or slower than the
//! output rate, without pitch correction. The effective step through the
//! source per output frame is
//!
//! ```text
//! step = speed_ratio * native_rate / output_rate
//! ```
//!
//! so a 44.1kHz file on a 48kHz device plays at its true speed when the ratio
//! is 1.0. When the step is exactly 1 the transport is read directly.
//!
//! Interpolation keeps two frames (`prev`, `next`) and a fractional phase
//! between them. Input is pulled from the transport in chunks sized to what
//! the block will consume, so the transport position tracks playback closely
//! and a block of `N` frames at step `r` consumes `floor(phase + N * r)`
//! frames. Output is a pure function of `(position, ratio)` after a reset.

use super::{AudioSource, ParamError, Transport};
use crate::source::SharedSource;
use crate::types::{StereoSample, DEFAULT_SAMPLE_RATE};

/// Frames pulled from the transport per refill
const CHUNK_FRAMES: usize = 512;

pub struct Resampler {
    transport: Transport,
    speed_ratio: f64,
    output_rate: u32,
    step: f64,
    phase: f64,
    prev: StereoSample,
    next: StereoSample,
    primed: bool,
    chunk: Vec<StereoSample>,
    chunk_pos: usize,
    chunk_len: usize,
}

impl Resampler {
    /// Wrap a transport at unity speed
    pub fn new(transport: Transport) -> Self {
        let mut resampler = Self {
            transport,
            speed_ratio: 1.0,
            output_rate: DEFAULT_SAMPLE_RATE,
            step: 1.0,
            phase: 0.0,
            prev: StereoSample::silence(),
            next: StereoSample::silence(),
            primed: false,
            chunk: vec![StereoSample::silence(); CHUNK_FRAMES],
            chunk_pos: 0,
            chunk_len: 0,
        };
        resampler.update_step();
        resampler
    }

    /// Set the playback speed ratio
    ///
    /// Rejects ratios that are not strictly positive and finite. There is no
    /// upper bound here; decks apply their own policy limit.
    pub fn set_speed_ratio(&mut self, ratio: f64) -> Result<(), ParamError> {
        if !(ratio > 0.0 && ratio.is_finite()) {
            return Err(ParamError::SpeedOutOfRange(ratio));
        }
        self.speed_ratio = ratio;
        let was_passthrough = self.is_passthrough();
        self.update_step();
        if was_passthrough != self.is_passthrough() {
            self.reset();
        }
        Ok(())
    }

    #[inline]
    pub fn speed_ratio(&self) -> f64 {
        self.speed_ratio
    }

    /// Source frames advanced per output frame
    #[inline]
    pub fn step(&self) -> f64 {
        self.step
    }

    #[inline]
    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    /// Attach a new source to the wrapped transport
    pub fn load(&mut self, source: SharedSource) {
        self.transport.load(source);
        self.update_step();
        self.reset();
    }

    /// Detach the wrapped transport's source
    pub fn detach(&mut self) -> Option<SharedSource> {
        let old = self.transport.detach();
        self.update_step();
        self.reset();
        old
    }

    /// Seek the wrapped transport (seconds) and drop interpolation state
    pub fn seek(&mut self, seconds: f64) {
        self.transport.seek(seconds);
        self.reset();
    }

    /// Seek the wrapped transport (frames) and drop interpolation state
    pub fn seek_samples(&mut self, position: u64) {
        self.transport.seek_samples(position);
        self.reset();
    }

    /// Forget buffered input so the next block starts at the transport position
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.prev = StereoSample::silence();
        self.next = StereoSample::silence();
        self.primed = false;
        self.chunk_pos = 0;
        self.chunk_len = 0;
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Mutable access to the wrapped transport
    ///
    /// Callers that move the position through this must call [`reset`](Self::reset).
    pub fn transport_mut(&mut self) -> &mut Transport {
        &mut self.transport
    }

    fn update_step(&mut self) {
        let native = match self.transport.native_rate() {
            0 => self.output_rate,
            rate => rate,
        };
        self.step = self.speed_ratio * native as f64 / self.output_rate.max(1) as f64;
    }

    #[inline]
    fn is_passthrough(&self) -> bool {
        self.step == 1.0
    }

    /// Next input frame, refilling from the transport when the chunk runs dry
    ///
    /// `budget` is how many more frames the current block expects to request;
    /// a refill asks for at most that many (but always at least one).
    fn pull(&mut self, budget: &mut usize, real_frames: &mut usize) -> StereoSample {
        if self.chunk_pos == self.chunk_len {
            let request = (*budget).clamp(1, CHUNK_FRAMES);
            *budget = budget.saturating_sub(request);
            *real_frames += self.transport.get_next_block(&mut self.chunk[..request]);
            self.chunk_pos = 0;
            self.chunk_len = request;
        }
        let frame = self.chunk[self.chunk_pos];
        self.chunk_pos += 1;
        frame
    }

    fn render_interpolated(&mut self, out: &mut [StereoSample]) -> usize {
        let mut real_frames = 0;
        // Frames this block advances through, minus what is already buffered
        let advances = (self.phase + out.len() as f64 * self.step).floor() as usize;
        let mut budget = advances.saturating_sub(self.chunk_len - self.chunk_pos);

        if !self.primed {
            budget += 2;
            self.prev = self.pull(&mut budget, &mut real_frames);
            self.next = self.pull(&mut budget, &mut real_frames);
            self.primed = true;
        }

        for frame in out.iter_mut() {
            *frame = self.prev.lerp(&self.next, self.phase as f32);
            self.phase += self.step;
            while self.phase >= 1.0 {
                self.phase -= 1.0;
                self.prev = self.next;
                self.next = self.pull(&mut budget, &mut real_frames);
            }
        }

        if real_frames == 0 && self.transport.is_at_end() {
            0
        } else {
            out.len()
        }
    }
}

impl AudioSource for Resampler {
    fn prepare(&mut self, block_size: usize, sample_rate: u32) {
        self.output_rate = sample_rate.max(1);
        self.transport.prepare(block_size, sample_rate);
        self.update_step();
        self.reset();
    }

    fn get_next_block(&mut self, out: &mut [StereoSample]) -> usize {
        if !self.transport.is_playing() {
            out.fill(StereoSample::silence());
            return 0;
        }
        if self.is_passthrough() && !self.primed {
            return self.transport.get_next_block(out);
        }
        self.render_interpolated(out)
    }

    fn release(&mut self) {
        self.transport.release();
        self.reset();
    }
}
