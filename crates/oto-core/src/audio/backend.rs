//! cpal output stream driving an [`EngineSession`]
//!
//! ```text
//! ┌──────────────────┐                     ┌─────────────────────┐
//! │  Control Thread  │───push()───────────►│   Command Queue     │
//! │ SessionController│                     │  (lock-free SPSC)   │
//! └──────────────────┘                     └──────────┬──────────┘
//!         │                                           │
//!         │ Relaxed atomics                           │ pop()
//!         ▼                                           ▼
//! ┌──────────────────┐                     ┌─────────────────────┐
//! │   DeckAtomics    │◄────────────────────│  cpal Audio Thread  │
//! │   (lock-free)    │     sync writes     │ (owns EngineSession)│
//! └──────────────────┘                     └─────────────────────┘
//! ```
//!
//! The session is moved into the stream callback, so the audio thread is its
//! only owner and no lock is ever taken on the render path.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize as CpalBufferSize, SampleFormat, Stream, StreamConfig};

use super::config::{AudioConfig, BufferSize, DEFAULT_BUFFER_SIZE, MIN_BUFFER_SIZE};
use super::device::{default_output_device, find_device_by_id};
use super::error::{AudioError, AudioResult};
use crate::engine::{command_channel, CommandReceiver, EngineSession, SessionController};
use crate::source::SourceProvider;
use crate::types::{StereoBuffer, DEFAULT_SAMPLE_RATE, MAX_BUFFER_SIZE};

/// Keeps the output stream alive; drop to stop audio
pub struct AudioHandle {
    _stream: Stream,
    sample_rate: u32,
    buffer_size: u32,
}

impl AudioHandle {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Buffer size in frames (nominal when the device chooses)
    pub fn buffer_size(&self) -> u32 {
        self.buffer_size
    }

    /// One-way output latency in milliseconds
    pub fn latency_ms(&self) -> f32 {
        latency_ms(self.buffer_size, self.sample_rate)
    }
}

/// Everything the control surface needs from a started audio system
pub struct AudioSystemResult {
    /// Drop to stop audio
    pub handle: AudioHandle,
    /// Control handle for the session now owned by the audio thread
    pub controller: SessionController,
    pub sample_rate: u32,
    pub buffer_size: u32,
    pub latency_ms: f32,
}

fn latency_ms(buffer_size: u32, sample_rate: u32) -> f32 {
    (buffer_size as f32 / sample_rate.max(1) as f32) * 1000.0
}

/// Open the configured output device and start rendering `num_decks` decks
pub fn start_audio_system(config: &AudioConfig, num_decks: usize) -> AudioResult<AudioSystemResult> {
    let device = match &config.device {
        Some(id) => find_device_by_id(id)?,
        None => default_output_device()?,
    };
    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    log::info!("Using audio device: {}", device_name);

    let (supported, buffer_size) = select_output_config(&device, config)?;
    let sample_rate = supported.sample_rate().0;
    let stream_config = StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size: match config.buffer_size {
            BufferSize::Default => CpalBufferSize::Default,
            BufferSize::Fixed(_) => CpalBufferSize::Fixed(buffer_size),
        },
    };
    let latency = latency_ms(buffer_size, sample_rate);
    log::info!(
        "Audio config: {} channels, {}Hz, {} frames (~{:.1}ms latency)",
        stream_config.channels,
        sample_rate,
        buffer_size,
        latency
    );

    let mut session = EngineSession::new(num_decks);
    session.prepare(buffer_size as usize, sample_rate);
    let (command_tx, command_rx) = command_channel();
    let controller = SessionController::new(command_tx, session.deck_atomics(), SourceProvider::default());

    let stream = build_output_stream(&device, &stream_config, RenderState::new(session, command_rx))?;
    stream
        .play()
        .map_err(|e| AudioError::StreamPlayError(e.to_string()))?;
    log::info!("Audio stream started");

    Ok(AudioSystemResult {
        handle: AudioHandle {
            _stream: stream,
            sample_rate,
            buffer_size,
        },
        controller,
        sample_rate,
        buffer_size,
        latency_ms: latency,
    })
}

/// State moved into the stream callback
struct RenderState {
    session: EngineSession,
    command_rx: CommandReceiver,
    /// Pre-allocated mix buffer
    buffer: StereoBuffer,
}

impl RenderState {
    fn new(session: EngineSession, command_rx: CommandReceiver) -> Self {
        Self {
            session,
            command_rx,
            buffer: StereoBuffer::silence(MAX_BUFFER_SIZE),
        }
    }

    /// Render into an interleaved device buffer with `channels` channels
    ///
    /// Commands are applied once per callback; long callbacks are rendered in
    /// slices of at most [`MAX_BUFFER_SIZE`] frames. Channels beyond the
    /// first two are silent.
    fn render(&mut self, data: &mut [f32], channels: usize) {
        self.session.process_commands(&mut self.command_rx);

        for slice in data.chunks_mut(MAX_BUFFER_SIZE * channels) {
            let n_frames = slice.len() / channels;
            self.buffer.set_len_from_capacity(n_frames);
            self.session.render_block(self.buffer.as_mut_slice());

            if channels == 2 {
                slice.copy_from_slice(self.buffer.as_interleaved());
                continue;
            }
            for (frame, sample) in slice.chunks_mut(channels).zip(self.buffer.iter()) {
                frame[0] = sample.left;
                if channels > 1 {
                    frame[1] = sample.right;
                }
                for ch in frame.iter_mut().skip(2) {
                    *ch = 0.0;
                }
            }
        }
    }
}

/// Pick an f32 config with at least two channels at the preferred rate
///
/// Returns the config and the buffer size in frames.
fn select_output_config(
    device: &cpal::Device,
    config: &AudioConfig,
) -> AudioResult<(cpal::SupportedStreamConfig, u32)> {
    let supported: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| AudioError::ConfigError(e.to_string()))?
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .collect();

    if supported.is_empty() {
        return Err(AudioError::UnsupportedFormat(
            "device has no f32 output configuration".to_string(),
        ));
    }

    let target_rate = config.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);
    let in_range = |c: &&cpal::SupportedStreamConfigRange| {
        target_rate >= c.min_sample_rate().0 && target_rate <= c.max_sample_rate().0
    };

    let best = supported
        .iter()
        .filter(|c| c.channels() >= 2)
        .find(in_range)
        .or_else(|| supported.iter().find(|c| c.channels() >= 2))
        .or_else(|| supported.first())
        .ok_or_else(|| AudioError::ConfigError("No suitable output configuration".to_string()))?;

    let sample_rate = if in_range(&best) {
        cpal::SampleRate(target_rate)
    } else {
        let fallback = best.max_sample_rate();
        log::warn!(
            "Audio device doesn't support {}Hz, using {}Hz (tracks are resampled on playback)",
            target_rate,
            fallback.0
        );
        fallback
    };

    let buffer_size = match config.buffer_size {
        BufferSize::Default => DEFAULT_BUFFER_SIZE,
        BufferSize::Fixed(frames) => frames.clamp(MIN_BUFFER_SIZE, MAX_BUFFER_SIZE as u32),
    };

    Ok((best.clone().with_sample_rate(sample_rate), buffer_size))
}

fn build_output_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    mut state: RenderState,
) -> AudioResult<Stream> {
    let channels = config.channels.max(1) as usize;

    device
        .build_output_stream(
            config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                state.render(data, channels);
            },
            move |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::StreamBuildError(e.to_string()))
}
