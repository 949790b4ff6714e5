//! Oto Core - multi-deck playback and mixing engine
//!
//! - [`source`]: decoding files into seekable sample sources
//! - [`engine`]: transport, resampler, looper, deck, mixer and session
//! - [`audio`]: the cpal output stream that drives a session
//! - [`config`]: YAML configuration

pub mod audio;
pub mod config;
pub mod engine;
pub mod source;
pub mod types;

pub use types::*;
