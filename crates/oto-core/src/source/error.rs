//! Sample source error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while opening or decoding a track
#[derive(Error, Debug)]
pub enum SourceError {
    /// The file could not be opened or read
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No registered decoder claims this file
    #[error("No decoder registered for {0:?}")]
    NoDecoder(PathBuf),

    /// The container or codec is not supported
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// The stream was recognised but decoding failed
    #[error("Failed to decode audio: {0}")]
    Decode(String),

    /// Decoding succeeded but produced no audio frames
    #[error("Track contains no audio: {0:?}")]
    Empty(PathBuf),
}

/// Result type for source operations
pub type SourceResult<T> = Result<T, SourceError>;
