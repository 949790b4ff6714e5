//! End-to-end: decode real WAV files, drive a session through the command
//! queue and check the rendered mix.

use std::path::{Path, PathBuf};

use oto_core::engine::{command_channel, CommandReceiver, EngineSession, SessionController};
use oto_core::source::SourceProvider;
use oto_core::{DeckId, PlayState, StereoSample};

const RATE: u32 = 8000;
const BLOCK: usize = 256;

/// Write a stereo 16-bit WAV holding `frames` frames of a constant value
fn write_constant_wav(dir: &Path, name: &str, value: f32, frames: usize) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    let sample = (value * 32768.0) as i16;
    for _ in 0..frames * 2 {
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
    path
}

/// Write a mono 16-bit WAV whose frame `i` is `i / frames` (a rising ramp)
fn write_ramp_wav(dir: &Path, name: &str, frames: usize) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..frames {
        writer
            .write_sample(((i as f32 / frames as f32) * 32767.0) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
    path
}

struct Rig {
    session: EngineSession,
    rx: CommandReceiver,
    ctl: SessionController,
}

impl Rig {
    fn new(num_decks: usize) -> Self {
        let mut session = EngineSession::new(num_decks);
        session.prepare(BLOCK, RATE);
        let (tx, rx) = command_channel();
        let ctl = SessionController::new(tx, session.deck_atomics(), SourceProvider::default());
        Self { session, rx, ctl }
    }

    /// One host callback: apply pending commands, then render
    fn tick(&mut self) -> Vec<StereoSample> {
        let mut out = vec![StereoSample::silence(); BLOCK];
        self.session.process_commands(&mut self.rx);
        self.session.render_block(&mut out);
        out
    }
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn silent_deck_plus_playing_deck_equals_playing_deck() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_constant_wav(dir.path(), "tone.wav", 0.25, RATE as usize);
    let mut rig = Rig::new(3);

    assert!(rig.ctl.load_track(DeckId(1), &path));
    assert_eq!(rig.ctl.title(DeckId(1)), "tone.wav");
    rig.ctl.play(DeckId(1)).unwrap();

    let out = rig.tick();
    assert!(out.iter().all(|s| approx(s.left, 0.25) && approx(s.right, 0.25)));
}

#[test]
fn two_decks_sum_with_gain() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_constant_wav(dir.path(), "a.wav", 0.5, RATE as usize);
    let b = write_constant_wav(dir.path(), "b.wav", 0.25, RATE as usize);
    let mut rig = Rig::new(2);

    assert!(rig.ctl.load_track(DeckId(0), &a));
    assert!(rig.ctl.load_track(DeckId(1), &b));
    rig.ctl.set_gain(DeckId(0), 0.5).unwrap();
    rig.ctl.play(DeckId(0)).unwrap();
    rig.ctl.play(DeckId(1)).unwrap();

    let out = rig.tick();
    assert!(out.iter().all(|s| approx(s.left, 0.5)));
}

#[test]
fn load_then_position_is_zero_before_play() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ramp_wav(dir.path(), "ramp.wav", 4000);
    let mut rig = Rig::new(1);

    assert!(rig.ctl.load_track(DeckId(0), &path));
    rig.tick();
    assert_eq!(rig.ctl.position_relative(DeckId(0)), 0.0);
    assert!(rig.ctl.atomics(DeckId(0)).unwrap().has_track());
}

#[test]
fn stopped_seek_holds_position_and_renders_silence() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ramp_wav(dir.path(), "ramp.wav", 4000);
    let mut rig = Rig::new(1);

    rig.ctl.load_track(DeckId(0), &path);
    rig.ctl.seek_relative(DeckId(0), 0.5).unwrap();

    for _ in 0..3 {
        let out = rig.tick();
        assert!(out.iter().all(|s| *s == StereoSample::silence()));
    }
    assert!((rig.ctl.position_relative(DeckId(0)) - 0.5).abs() < 1e-9);
}

#[test]
fn loop_window_wraps_playback() {
    let dir = tempfile::tempdir().unwrap();
    let frames = 4000;
    let path = write_ramp_wav(dir.path(), "ramp.wav", frames);
    let mut rig = Rig::new(1);

    rig.ctl.load_track(DeckId(0), &path);
    rig.ctl.set_loop_start(DeckId(0), 0.2).unwrap();
    rig.ctl.set_loop_end(DeckId(0), 0.5).unwrap();
    rig.ctl.enable_loop(DeckId(0), true).unwrap();
    rig.ctl.play(DeckId(0)).unwrap();

    // Enough blocks to cross the loop end several times
    let mut max_position: f64 = 0.0;
    for _ in 0..40 {
        rig.tick();
        max_position = max_position.max(rig.ctl.position_relative(DeckId(0)));
    }

    // Position never runs more than one block past the loop end
    let block_fraction = BLOCK as f64 / frames as f64;
    assert!(max_position < 0.5 + block_fraction, "max position {max_position}");
    let position = rig.ctl.position_relative(DeckId(0));
    assert!((0.2..0.5 + block_fraction).contains(&position));
}

#[test]
fn inverted_loop_never_triggers() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ramp_wav(dir.path(), "ramp.wav", 2000);
    let mut rig = Rig::new(1);

    rig.ctl.load_track(DeckId(0), &path);
    rig.ctl.set_loop_start(DeckId(0), 0.5).unwrap();
    rig.ctl.set_loop_end(DeckId(0), 0.2).unwrap();
    rig.ctl.enable_loop(DeckId(0), true).unwrap();
    rig.ctl.play(DeckId(0)).unwrap();

    for _ in 0..20 {
        rig.tick();
    }
    // Holds at the end, still playing
    assert_eq!(rig.ctl.position_relative(DeckId(0)), 1.0);
    assert_eq!(rig.ctl.atomics(DeckId(0)).unwrap().play_state(), PlayState::Playing);
}

#[test]
fn double_speed_advances_twice_as_fast() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ramp_wav(dir.path(), "ramp.wav", 100_000);
    let mut rig = Rig::new(1);

    rig.ctl.load_track(DeckId(0), &path);
    rig.ctl.set_speed(DeckId(0), 2.0).unwrap();
    rig.ctl.play(DeckId(0)).unwrap();

    rig.tick();
    let after_first = rig.ctl.atomics(DeckId(0)).unwrap().position();
    rig.tick();
    let after_second = rig.ctl.atomics(DeckId(0)).unwrap().position();

    assert!((2 * BLOCK as u64..=2 * BLOCK as u64 + 2).contains(&after_first));
    assert_eq!(after_second - after_first, 2 * BLOCK as u64);
}

#[test]
fn invalid_parameters_leave_state_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_constant_wav(dir.path(), "tone.wav", 0.5, 2000);
    let mut rig = Rig::new(1);

    rig.ctl.load_track(DeckId(0), &path);
    rig.ctl.set_gain(DeckId(0), 0.8).unwrap();
    rig.ctl.set_speed(DeckId(0), 1.25).unwrap();
    rig.tick();

    assert!(rig.ctl.set_gain(DeckId(0), 1.2).is_err());
    assert!(rig.ctl.set_gain(DeckId(0), -0.2).is_err());
    assert!(rig.ctl.set_speed(DeckId(0), 0.0).is_err());
    assert!(rig.ctl.set_speed(DeckId(0), 150.0).is_err());
    rig.tick();

    let atomics = rig.ctl.atomics(DeckId(0)).unwrap();
    assert_eq!(atomics.gain(), 0.8);
    assert_eq!(atomics.speed(), 1.25);
}

#[test]
fn failed_load_keeps_previous_track() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_constant_wav(dir.path(), "keep.wav", 0.5, 2000);
    let garbage = dir.path().join("garbage.wav");
    std::fs::write(&garbage, b"RIFF but not really").unwrap();
    let mut rig = Rig::new(1);

    assert!(rig.ctl.load_track(DeckId(0), &path));
    rig.tick();
    assert!(!rig.ctl.load_track(DeckId(0), &garbage));
    assert!(!rig.ctl.load_track(DeckId(0), &dir.path().join("missing.wav")));
    rig.tick();

    assert_eq!(rig.ctl.title(DeckId(0)), "keep.wav");
    assert_eq!(rig.session.deck(DeckId(0)).unwrap().title(), "keep.wav");
}

#[test]
fn reloading_swaps_at_block_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_constant_wav(dir.path(), "first.wav", 0.5, RATE as usize);
    let second = write_constant_wav(dir.path(), "second.wav", 0.125, RATE as usize);
    let mut rig = Rig::new(1);

    rig.ctl.load_track(DeckId(0), &first);
    rig.ctl.play(DeckId(0)).unwrap();
    let out = rig.tick();
    assert!(out.iter().all(|s| approx(s.left, 0.5)));

    // The new track starts stopped; the whole next block is from the new state
    rig.ctl.load_track(DeckId(0), &second);
    let out = rig.tick();
    assert!(out.iter().all(|s| *s == StereoSample::silence()));

    rig.ctl.play(DeckId(0)).unwrap();
    let out = rig.tick();
    assert!(out.iter().all(|s| approx(s.left, 0.125)));
    assert_eq!(rig.ctl.title(DeckId(0)), "second.wav");
}
