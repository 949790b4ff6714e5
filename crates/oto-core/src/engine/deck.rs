//! Deck - one independently controlled playback unit
//!
//! A deck composes a [`Resampler`] (which owns the [`Transport`]), a
//! [`Looper`], and the loaded track's title. It lives on the audio thread;
//! the control surface reads its state through [`DeckAtomics`].

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use basedrop::Shared;

use super::{validate_gain, validate_relative_position, validate_speed};
use super::{AudioSource, Looper, ParamError, Resampler, Transport};
use crate::source::{LoadedTrack, SourceProvider};
use crate::types::{DeckId, PlayState, StereoSample};

/// Lock-free deck state for UI polling
///
/// Written by the audio thread after every block and every applied command;
/// read by any thread with relaxed ordering. Each field is individually
/// atomic, so a reader may see values from two adjacent blocks but never a
/// torn value.
#[derive(Debug)]
pub struct DeckAtomics {
    /// Playhead position in source frames
    pub position: AtomicU64,
    /// Track length in source frames (0 = no track)
    pub length: AtomicU64,
    /// Native sample rate of the loaded track
    pub sample_rate: AtomicU32,
    /// 0=Stopped, 1=Playing
    pub state: AtomicU8,
    /// Gain as `f32` bits
    pub gain: AtomicU32,
    /// Speed ratio as `f64` bits
    pub speed: AtomicU64,
    /// Loop start as `f64` bits (fraction of length)
    pub loop_start: AtomicU64,
    /// Loop end as `f64` bits (fraction of length)
    pub loop_end: AtomicU64,
    pub loop_enabled: AtomicBool,
    pub has_track: AtomicBool,
}

impl DeckAtomics {
    pub fn new() -> Self {
        Self {
            position: AtomicU64::new(0),
            length: AtomicU64::new(0),
            sample_rate: AtomicU32::new(0),
            state: AtomicU8::new(PlayState::Stopped.to_u8()),
            gain: AtomicU32::new(1.0f32.to_bits()),
            speed: AtomicU64::new(1.0f64.to_bits()),
            loop_start: AtomicU64::new(0.0f64.to_bits()),
            loop_end: AtomicU64::new(0.0f64.to_bits()),
            loop_enabled: AtomicBool::new(false),
            has_track: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn length(&self) -> u64 {
        self.length.load(Ordering::Relaxed)
    }

    /// Relative position, 0.0 when no track is loaded
    pub fn position_relative(&self) -> f64 {
        match self.length() {
            0 => 0.0,
            length => self.position() as f64 / length as f64,
        }
    }

    pub fn position_seconds(&self) -> f64 {
        match self.sample_rate.load(Ordering::Relaxed) {
            0 => 0.0,
            rate => self.position() as f64 / rate as f64,
        }
    }

    pub fn length_seconds(&self) -> f64 {
        match self.sample_rate.load(Ordering::Relaxed) {
            0 => 0.0,
            rate => self.length() as f64 / rate as f64,
        }
    }

    #[inline]
    pub fn play_state(&self) -> PlayState {
        PlayState::from_u8(self.state.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.play_state() == PlayState::Playing
    }

    #[inline]
    pub fn gain(&self) -> f32 {
        f32::from_bits(self.gain.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        f64::from_bits(self.speed.load(Ordering::Relaxed))
    }

    /// Loop `(start, end)` as fractions of the track length
    pub fn loop_bounds(&self) -> (f64, f64) {
        (
            f64::from_bits(self.loop_start.load(Ordering::Relaxed)),
            f64::from_bits(self.loop_end.load(Ordering::Relaxed)),
        )
    }

    #[inline]
    pub fn is_looping(&self) -> bool {
        self.loop_enabled.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn has_track(&self) -> bool {
        self.has_track.load(Ordering::Relaxed)
    }
}

impl Default for DeckAtomics {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Deck {
    id: DeckId,
    resampler: Resampler,
    looper: Looper,
    title: Option<Shared<String>>,
    atomics: Arc<DeckAtomics>,
}

impl Deck {
    /// Create an empty deck
    pub fn new(id: DeckId) -> Self {
        let deck = Self {
            id,
            resampler: Resampler::new(Transport::new()),
            looper: Looper::new(),
            title: None,
            atomics: Arc::new(DeckAtomics::new()),
        };
        deck.sync_all_atomics();
        deck
    }

    #[inline]
    pub fn id(&self) -> DeckId {
        self.id
    }

    /// Shared handle to this deck's lock-free state
    pub fn atomics(&self) -> Arc<DeckAtomics> {
        Arc::clone(&self.atomics)
    }

    /// Replace the loaded track
    ///
    /// The new track starts stopped at position 0; loop bounds, gain and speed
    /// carry over. Returns `false` (leaving the deck untouched) for a track
    /// with no audio.
    pub fn load_track(&mut self, track: LoadedTrack) -> bool {
        if track.source().length_in_samples() == 0 {
            return false;
        }
        let (source, title) = track.into_parts();
        self.resampler.load(source);
        self.title = Some(title);
        self.sync_all_atomics();
        true
    }

    /// Open `path` through `provider` and load it
    ///
    /// Decodes on the calling thread, so this is for control-thread use only.
    /// On failure the deck keeps whatever it had before.
    pub fn load_file(&mut self, provider: &SourceProvider, path: &Path) -> bool {
        match provider.open(path) {
            Ok(track) => self.load_track(track),
            Err(e) => {
                log::warn!("{}: failed to load {:?}: {}", self.id, path, e);
                false
            }
        }
    }

    /// Eject the current track
    pub fn unload_track(&mut self) {
        self.resampler.detach();
        self.title = None;
        self.sync_all_atomics();
    }

    /// Start playback (ignored without a track)
    pub fn play(&mut self) {
        if !self.has_track() {
            return;
        }
        self.resampler.transport_mut().play();
        self.sync_state_atomic();
    }

    pub fn stop(&mut self) {
        self.resampler.transport_mut().stop();
        self.sync_state_atomic();
    }

    /// Seek to an absolute time, clamped to the track
    pub fn seek(&mut self, seconds: f64) {
        self.resampler.seek(seconds);
        self.sync_position_atomic();
    }

    /// Seek to a fraction of the track length
    pub fn seek_relative(&mut self, position: f64) -> Result<(), ParamError> {
        let position = validate_relative_position(position).inspect_err(|e| {
            log::warn!("{}: ignoring seek: {}", self.id, e);
        })?;
        let length = self.resampler.transport().length();
        self.resampler.seek_samples((position * length as f64).round() as u64);
        self.sync_position_atomic();
        Ok(())
    }

    /// Set the output gain; values outside `[0, 1]` are ignored
    pub fn set_gain(&mut self, gain: f32) -> Result<(), ParamError> {
        let gain = validate_gain(gain).inspect_err(|e| {
            log::warn!("{}: ignoring gain change: {}", self.id, e);
        })?;
        self.resampler.transport_mut().set_gain(gain);
        self.atomics.gain.store(gain.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    /// Set the speed ratio; values outside `(0, 100]` are ignored
    pub fn set_speed(&mut self, ratio: f64) -> Result<(), ParamError> {
        let ratio = validate_speed(ratio).inspect_err(|e| {
            log::warn!("{}: ignoring speed change: {}", self.id, e);
        })?;
        self.resampler.set_speed_ratio(ratio)?;
        self.atomics.speed.store(ratio.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    pub fn set_loop_start(&mut self, start: f64) {
        self.looper.set_start(start);
        self.sync_loop_atomics();
    }

    pub fn set_loop_end(&mut self, end: f64) {
        self.looper.set_end(end);
        self.sync_loop_atomics();
    }

    pub fn enable_loop(&mut self, enabled: bool) {
        self.looper.set_enabled(enabled);
        self.sync_loop_atomics();
    }

    /// Relative playhead position, 0.0 when no track is loaded
    pub fn position_relative(&self) -> f64 {
        self.resampler.transport().position_relative().unwrap_or(0.0)
    }

    /// Title of the loaded track, empty before the first load
    pub fn title(&self) -> &str {
        self.title.as_deref().map_or("", String::as_str)
    }

    pub fn position_seconds(&self) -> f64 {
        self.resampler.transport().position_seconds()
    }

    pub fn length_seconds(&self) -> f64 {
        self.resampler.transport().length_seconds()
    }

    pub fn gain(&self) -> f32 {
        self.resampler.transport().gain()
    }

    pub fn speed(&self) -> f64 {
        self.resampler.speed_ratio()
    }

    pub fn state(&self) -> PlayState {
        self.resampler.transport().state()
    }

    pub fn has_track(&self) -> bool {
        self.resampler.transport().has_source()
    }

    pub fn is_looping(&self) -> bool {
        self.looper.is_enabled()
    }

    /// Loop `(start, end)` as fractions of the track length
    pub fn loop_bounds(&self) -> (f64, f64) {
        (self.looper.start(), self.looper.end())
    }

    pub fn transport(&self) -> &Transport {
        self.resampler.transport()
    }

    fn sync_position_atomic(&self) {
        self.atomics
            .position
            .store(self.resampler.transport().position(), Ordering::Relaxed);
    }

    fn sync_state_atomic(&self) {
        self.atomics.state.store(self.state().to_u8(), Ordering::Relaxed);
    }

    fn sync_loop_atomics(&self) {
        let a = &self.atomics;
        a.loop_start.store(self.looper.start().to_bits(), Ordering::Relaxed);
        a.loop_end.store(self.looper.end().to_bits(), Ordering::Relaxed);
        a.loop_enabled.store(self.looper.is_enabled(), Ordering::Relaxed);
    }

    fn sync_all_atomics(&self) {
        let transport = self.resampler.transport();
        let a = &self.atomics;
        a.length.store(transport.length(), Ordering::Relaxed);
        a.sample_rate.store(transport.native_rate(), Ordering::Relaxed);
        a.gain.store(transport.gain().to_bits(), Ordering::Relaxed);
        a.speed.store(self.resampler.speed_ratio().to_bits(), Ordering::Relaxed);
        a.has_track.store(transport.has_source(), Ordering::Relaxed);
        self.sync_position_atomic();
        self.sync_state_atomic();
        self.sync_loop_atomics();
    }
}

impl AudioSource for Deck {
    fn prepare(&mut self, block_size: usize, sample_rate: u32) {
        self.resampler.prepare(block_size, sample_rate);
    }

    fn get_next_block(&mut self, out: &mut [StereoSample]) -> usize {
        if !self.has_track() || !self.resampler.transport().is_playing() {
            out.fill(StereoSample::silence());
            return 0;
        }

        let produced = self.resampler.get_next_block(out);
        if self.looper.after_block(self.resampler.transport_mut()) {
            self.resampler.reset();
        }
        self.sync_position_atomic();
        produced
    }

    fn release(&mut self) {
        self.resampler.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::test_util::{constant_track, RampSource};
    use crate::types::MAX_SPEED_RATIO;

    fn prepared_deck() -> Deck {
        let mut deck = Deck::new(DeckId::new(0));
        deck.prepare(64, 1000);
        deck
    }

    #[test]
    fn test_empty_deck_is_silent() {
        let mut deck = prepared_deck();
        deck.play();
        assert_eq!(deck.state(), PlayState::Stopped);

        let mut out = [StereoSample::mono(0.7); 64];
        assert_eq!(deck.get_next_block(&mut out), 0);
        assert!(out.iter().all(|s| *s == StereoSample::silence()));
        assert_eq!(deck.position_relative(), 0.0);
        assert_eq!(deck.title(), "");
    }

    #[test]
    fn test_load_then_position_is_zero() {
        let mut deck = prepared_deck();
        assert!(deck.load_track(constant_track(0.5, 1000, 1000)));
        assert_eq!(deck.position_relative(), 0.0);
        assert_eq!(deck.title(), "constant.wav");
        assert!(deck.atomics().has_track());
        assert_eq!(deck.atomics().length(), 1000);
    }

    #[test]
    fn test_gain_out_of_range_keeps_previous() {
        let mut deck = prepared_deck();
        deck.set_gain(0.4).unwrap();
        for bad in [-0.1, 1.5, f32::NAN] {
            assert!(deck.set_gain(bad).is_err());
            assert_eq!(deck.gain(), 0.4);
        }
        assert_eq!(deck.atomics().gain(), 0.4);
    }

    #[test]
    fn test_speed_out_of_range_keeps_previous() {
        let mut deck = prepared_deck();
        deck.set_speed(1.5).unwrap();
        for bad in [0.0, -1.0, MAX_SPEED_RATIO + 1.0] {
            assert!(deck.set_speed(bad).is_err());
            assert_eq!(deck.speed(), 1.5);
        }
        assert!(deck.set_speed(MAX_SPEED_RATIO).is_ok());
    }

    #[test]
    fn test_seek_relative_rejects_out_of_range() {
        let mut deck = prepared_deck();
        deck.load_track(constant_track(0.5, 1000, 1000));
        deck.seek_relative(0.25).unwrap();
        assert!(deck.seek_relative(1.2).is_err());
        assert!((deck.position_relative() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_stopped_seek_holds_position() {
        let mut deck = prepared_deck();
        deck.load_track(constant_track(0.5, 1000, 1000));
        deck.seek(0.3);

        let mut out = [StereoSample::mono(1.0); 64];
        assert_eq!(deck.get_next_block(&mut out), 0);
        assert!(out.iter().all(|s| *s == StereoSample::silence()));
        assert!((deck.position_seconds() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_playing_applies_gain() {
        let mut deck = prepared_deck();
        deck.load_track(constant_track(0.8, 1000, 1000));
        deck.set_gain(0.5).unwrap();
        deck.play();

        let mut out = [StereoSample::silence(); 64];
        assert_eq!(deck.get_next_block(&mut out), 64);
        assert!(out.iter().all(|s| (s.left - 0.4).abs() < 1e-6));
        assert_eq!(deck.atomics().position(), 64);
    }

    #[test]
    fn test_loop_returns_to_start() {
        let mut deck = prepared_deck();
        let (source, _) = RampSource::new(1000, 1000);
        deck.load_track(LoadedTrack::new(source, "ramp.wav"));
        deck.set_loop_start(0.2);
        deck.set_loop_end(0.5);
        deck.enable_loop(true);
        deck.play();

        let mut out = [StereoSample::silence(); 64];
        let mut looped = false;
        for _ in 0..10 {
            deck.get_next_block(&mut out);
            if deck.position_relative() < 0.5 && deck.transport().position() == 200 {
                looped = true;
                break;
            }
        }
        assert!(looped);

        // Next block resumes from the loop start
        deck.get_next_block(&mut out);
        assert_eq!(out[0], StereoSample::new(200.0, -200.0));
    }

    #[test]
    fn test_inverted_loop_never_triggers() {
        let mut deck = prepared_deck();
        deck.load_track(constant_track(0.1, 256, 1000));
        deck.set_loop_start(0.5);
        deck.set_loop_end(0.2);
        deck.enable_loop(true);
        deck.play();

        let mut out = [StereoSample::silence(); 64];
        for _ in 0..8 {
            deck.get_next_block(&mut out);
        }
        assert_eq!(deck.transport().position(), 256);
        assert!(deck.is_looping());
        assert_eq!(deck.loop_bounds(), (0.5, 0.2));
    }

    #[test]
    fn test_reload_keeps_loop_and_gain() {
        let mut deck = prepared_deck();
        deck.load_track(constant_track(0.1, 500, 1000));
        deck.set_gain(0.3).unwrap();
        deck.set_loop_end(0.9);
        deck.play();

        assert!(deck.load_track(constant_track(0.2, 800, 1000)));
        assert_eq!(deck.state(), PlayState::Stopped);
        assert_eq!(deck.gain(), 0.3);
        assert_eq!(deck.loop_bounds(), (0.0, 0.9));
    }

    #[test]
    fn test_unload_clears_title_and_silences() {
        let mut deck = prepared_deck();
        deck.load_track(constant_track(0.5, 1000, 1000));
        deck.play();
        deck.unload_track();
        assert!(!deck.has_track());
        assert_eq!(deck.title(), "");
        assert!(!deck.atomics().is_playing());
    }

    #[test]
    fn test_load_file_failure_keeps_previous_track() {
        let mut deck = prepared_deck();
        deck.load_track(constant_track(0.5, 1000, 1000));
        assert!(!deck.load_file(&SourceProvider::default(), Path::new("/nonexistent/x.wav")));
        assert_eq!(deck.title(), "constant.wav");
        assert!(deck.has_track());
    }
}
