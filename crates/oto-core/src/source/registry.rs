//! Process-wide decoder registry
//!
//! The registry is built once at startup and is immutable afterwards. It maps
//! file extensions to decoder functions, with an optional catch-all decoder
//! that probes the stream contents. The render and control paths never touch
//! it directly: a [`SourceProvider`](super::SourceProvider) is handed a
//! `&'static` reference and only ever returns opened tracks.

use std::path::Path;
use std::sync::OnceLock;

use super::decode::{decode_probed, decode_wav};
use super::{PcmSource, SourceError, SourceResult};

/// Decoder entry point: fully decodes the file at `path`
pub type DecoderFn = fn(&Path) -> SourceResult<PcmSource>;

/// A named decoder and the extensions it claims
#[derive(Debug, Clone)]
pub struct DecoderEntry {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
    pub decode: DecoderFn,
}

impl DecoderEntry {
    fn claims(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}

/// Ordered collection of decoder factories
#[derive(Debug, Clone, Default)]
pub struct DecoderRegistry {
    decoders: Vec<DecoderEntry>,
    fallback: Option<DecoderEntry>,
}

static REGISTRY: OnceLock<DecoderRegistry> = OnceLock::new();

impl DecoderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in WAV and symphonia decoders
    pub fn with_basic_formats() -> Self {
        let mut registry = Self::new();
        registry
            .register("wav", &["wav", "wave"], decode_wav)
            .register("symphonia", &["flac", "mp3", "ogg", "oga", "aif", "aiff"], decode_probed)
            .set_fallback("symphonia-probe", decode_probed);
        registry
    }

    /// Register a decoder for the given extensions
    ///
    /// Earlier registrations win when two decoders claim the same extension.
    pub fn register(
        &mut self,
        name: &'static str,
        extensions: &'static [&'static str],
        decode: DecoderFn,
    ) -> &mut Self {
        self.decoders.push(DecoderEntry {
            name,
            extensions,
            decode,
        });
        self
    }

    /// Decoder used when no extension matches
    pub fn set_fallback(&mut self, name: &'static str, decode: DecoderFn) -> &mut Self {
        self.fallback = Some(DecoderEntry {
            name,
            extensions: &[],
            decode,
        });
        self
    }

    /// Find the decoder responsible for `path`
    pub fn find(&self, path: &Path) -> Option<&DecoderEntry> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|ext| self.decoders.iter().find(|d| d.claims(ext)))
            .or(self.fallback.as_ref())
    }

    /// Decode `path` with the responsible decoder
    pub fn decode(&self, path: &Path) -> SourceResult<PcmSource> {
        let entry = self
            .find(path)
            .ok_or_else(|| SourceError::NoDecoder(path.to_path_buf()))?;
        log::debug!("Decoding {:?} with '{}' decoder", path, entry.name);
        (entry.decode)(path)
    }

    /// Extensions claimed by the registered decoders
    pub fn extensions(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.decoders.iter().flat_map(|d| d.extensions.iter().copied())
    }

    /// Whether any decoder is registered
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty() && self.fallback.is_none()
    }
}

/// Install the process-wide registry
///
/// Must happen before the first call to [`registry`]. Returns the registry
/// back if one is already installed.
pub fn install_registry(registry: DecoderRegistry) -> Result<&'static DecoderRegistry, DecoderRegistry> {
    let mut pending = Some(registry);
    let installed = REGISTRY.get_or_init(|| pending.take().unwrap_or_default());
    match pending {
        Some(rejected) => Err(rejected),
        None => Ok(installed),
    }
}

/// The process-wide registry (built-in formats unless one was installed)
pub fn registry() -> &'static DecoderRegistry {
    REGISTRY.get_or_init(DecoderRegistry::with_basic_formats)
}
