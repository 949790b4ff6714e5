//! Audio output configuration
//!
//! Device selection, buffer size and sample rate preferences for the cpal
//! backend. Serialised as part of the player's YAML config.

use serde::{Deserialize, Serialize};

/// Nominal buffer size used when the device picks its own (frames)
///
/// 512 frames @ 44.1kHz is ~11.6ms, a safe default for most systems.
pub const DEFAULT_BUFFER_SIZE: u32 = 512;

/// Smallest fixed buffer size accepted (frames)
pub const MIN_BUFFER_SIZE: u32 = 64;

/// Preferred buffer size for the output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BufferSize {
    /// Let the device choose
    #[default]
    Default,
    /// Request a specific size in frames (clamped to a sane range)
    Fixed(u32),
}

impl BufferSize {
    /// Requested size in frames, or `None` for the device default
    pub fn as_frames(&self) -> Option<u32> {
        match self {
            BufferSize::Default => None,
            BufferSize::Fixed(frames) => Some(*frames),
        }
    }
}

/// Output device identifier: device name plus the host backend it lives on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceId {
    /// Device name as reported by the system
    pub name: String,
    /// Audio host (e.g. "ALSA", "CoreAudio"); `None` searches every host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl DeviceId {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: None,
        }
    }

    pub fn with_host(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: Some(host.into()),
        }
    }

    /// Label with the host prefix, e.g. `[ALSA] hw:0,0`
    pub fn display_label(&self) -> String {
        match &self.host {
            Some(host) => format!("[{}] {}", host, self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Output device (`None` = system default)
    pub device: Option<DeviceId>,
    /// Preferred buffer size
    pub buffer_size: BufferSize,
    /// Preferred sample rate (`None` = 44100 if supported)
    pub sample_rate: Option<u32>,
}

impl AudioConfig {
    pub fn with_device(mut self, device: DeviceId) -> Self {
        self.device = Some(device);
        self
    }

    pub fn with_buffer_frames(mut self, frames: u32) -> Self {
        self.buffer_size = BufferSize::Fixed(frames);
        self
    }

    pub fn with_sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = Some(rate);
        self
    }
}
