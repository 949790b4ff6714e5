//! Audio output via cpal
//!
//! Opens one stereo output stream and moves an [`EngineSession`](crate::engine::EngineSession)
//! into its callback. The caller gets back a [`SessionController`](crate::engine::SessionController)
//! for control and polling.
//!
//! ```ignore
//! use oto_core::audio::{start_audio_system, AudioConfig};
//!
//! let mut audio = start_audio_system(&AudioConfig::default(), 3)?;
//! audio.controller.load_track(DeckId(0), Path::new("set.flac"));
//! audio.controller.play(DeckId(0))?;
//! let position = audio.controller.position_relative(DeckId(0));
//! ```

mod backend;
mod config;
mod device;
mod error;

pub use backend::{start_audio_system, AudioHandle, AudioSystemResult};
pub use config::{AudioConfig, BufferSize, DeviceId, DEFAULT_BUFFER_SIZE, MIN_BUFFER_SIZE};
pub use device::{default_output_device, find_device_by_id, get_output_devices, OutputDevice};
pub use error::{AudioError, AudioResult};
