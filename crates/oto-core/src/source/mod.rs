//! Sample sources - opened tracks the engine reads from
//!
//! A [`SampleSource`] is a randomly readable stream of stereo frames with a
//! fixed length and native sample rate. Sources are immutable once opened and
//! are read by the audio thread through a shared, deferred-drop handle
//! ([`SharedSource`]), so replacing a deck's track never frees memory inside
//! the audio callback.
//!
//! Opening happens on the control thread through a [`SourceProvider`], which
//! consults the process-wide [`DecoderRegistry`].

mod decode;
mod error;
mod pcm;
mod registry;

use std::path::Path;

use basedrop::Shared;

use crate::engine::gc_handle;
use crate::types::StereoSample;

pub use decode::{decode_probed, decode_wav};
pub use error::{SourceError, SourceResult};
pub use pcm::PcmSource;
pub use registry::{install_registry, registry, DecoderEntry, DecoderFn, DecoderRegistry};

/// A seekable, randomly readable stream of stereo frames
pub trait SampleSource: Send + Sync {
    /// Native sample rate in Hz (> 0)
    fn sample_rate(&self) -> u32;

    /// Total length in frames
    fn length_in_samples(&self) -> u64;

    /// Channels in the original stream (1 or 2)
    fn channel_count(&self) -> u16;

    /// Copy frames starting at `start` into `out`
    ///
    /// Returns the number of frames written, which is less than `out.len()`
    /// at end-of-stream. Frames past the returned count are left untouched.
    fn read_block(&self, start: u64, out: &mut [StereoSample]) -> usize;

    /// Total length in seconds
    fn length_in_seconds(&self) -> f64 {
        self.length_in_samples() as f64 / self.sample_rate().max(1) as f64
    }
}

/// Shared handle to an opened source
///
/// Dropping the last handle on the audio thread only enqueues the source for
/// the background collector.
pub type SharedSource = Shared<Box<dyn SampleSource>>;

/// An opened track ready to be handed to a deck
pub struct LoadedTrack {
    source: SharedSource,
    title: Shared<String>,
}

impl LoadedTrack {
    /// Wrap an opened source and its display title
    pub fn new<S: SampleSource + 'static>(source: S, title: impl Into<String>) -> Self {
        let handle = gc_handle();
        let source: Box<dyn SampleSource> = Box::new(source);
        Self {
            source: Shared::new(&handle, source),
            title: Shared::new(&handle, title.into()),
        }
    }

    /// The opened source
    pub fn source(&self) -> &SharedSource {
        &self.source
    }

    /// Display title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Split into source and title handles
    pub(crate) fn into_parts(self) -> (SharedSource, Shared<String>) {
        (self.source, self.title)
    }
}

impl std::fmt::Debug for LoadedTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedTrack")
            .field("title", &self.title())
            .field("sample_rate", &self.source.sample_rate())
            .field("length_in_samples", &self.source.length_in_samples())
            .finish()
    }
}

/// Opens locators into tracks using an injected decoder registry
#[derive(Debug, Clone, Copy)]
pub struct SourceProvider {
    registry: &'static DecoderRegistry,
}

impl SourceProvider {
    /// Create a provider backed by `registry`
    pub fn new(registry: &'static DecoderRegistry) -> Self {
        Self { registry }
    }

    /// Decode the file at `path`
    ///
    /// The title is the file name, matching what the deck displays.
    pub fn open(&self, path: &Path) -> SourceResult<LoadedTrack> {
        let pcm = self.registry.decode(path)?;
        if pcm.is_empty() {
            return Err(SourceError::Empty(path.to_path_buf()));
        }

        let title = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        log::info!(
            "Opened '{}': {} frames @ {}Hz, {} channel(s), {:.1}s",
            title,
            pcm.len(),
            pcm.sample_rate(),
            pcm.channel_count(),
            pcm.length_in_seconds()
        );

        Ok(LoadedTrack::new(pcm, title))
    }
}

impl Default for SourceProvider {
    fn default() -> Self {
        Self::new(registry())
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    //! Instrumented sources for engine tests

    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use super::*;

    /// Source whose frame `i` is `(i as f32, -(i as f32))`, counting frames read
    pub struct RampSource {
        pub length: u64,
        pub sample_rate: u32,
        pub frames_read: Arc<AtomicU64>,
    }

    impl RampSource {
        pub fn new(length: u64, sample_rate: u32) -> (Self, Arc<AtomicU64>) {
            let counter = Arc::new(AtomicU64::new(0));
            let source = Self {
                length,
                sample_rate,
                frames_read: Arc::clone(&counter),
            };
            (source, counter)
        }
    }

    impl SampleSource for RampSource {
        fn sample_rate(&self) -> u32 {
            self.sample_rate
        }

        fn length_in_samples(&self) -> u64 {
            self.length
        }

        fn channel_count(&self) -> u16 {
            2
        }

        fn read_block(&self, start: u64, out: &mut [StereoSample]) -> usize {
            let available = self.length.saturating_sub(start) as usize;
            let count = available.min(out.len());
            for (i, frame) in out.iter_mut().take(count).enumerate() {
                let value = (start + i as u64) as f32;
                *frame = StereoSample::new(value, -value);
            }
            self.frames_read.fetch_add(count as u64, Ordering::Relaxed);
            count
        }
    }

    /// Constant-amplitude track of `length` frames
    pub fn constant_track(value: f32, length: usize, sample_rate: u32) -> LoadedTrack {
        LoadedTrack::new(
            PcmSource::new(vec![StereoSample::mono(value); length], sample_rate, 2),
            "constant.wav",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_quarter_second(_path: &Path) -> SourceResult<PcmSource> {
        Ok(PcmSource::new(vec![StereoSample::mono(0.5); 2000], 8000, 1))
    }

    #[test]
    fn test_provider_uses_injected_registry() {
        let mut custom = DecoderRegistry::new();
        custom.register("stub", &["stub"], decode_quarter_second);
        let provider = SourceProvider::new(Box::leak(Box::new(custom)));

        let track = provider.open(Path::new("/music/intro.stub")).unwrap();
        assert_eq!(track.title(), "intro.stub");
        assert_eq!(track.source().length_in_samples(), 2000);
        assert!((track.source().length_in_seconds() - 0.25).abs() < 1e-9);

        // No fallback registered, so other extensions have no decoder
        let err = provider.open(Path::new("/music/intro.wav")).unwrap_err();
        assert!(matches!(err, SourceError::NoDecoder(_)));
    }

    #[test]
    fn test_provider_reports_missing_file() {
        let provider = SourceProvider::default();
        assert!(provider.open(Path::new("/nonexistent/deck.wav")).is_err());
    }

    #[test]
    fn test_provider_titles_track_with_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Opening Set.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(1000i16).unwrap();
        }
        writer.finalize().unwrap();

        let track = SourceProvider::default().open(&path).unwrap();
        assert_eq!(track.title(), "Opening Set.wav");
        assert_eq!(track.source().length_in_samples(), 100);
    }

    #[test]
    fn test_provider_rejects_empty_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("silence.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        hound::WavWriter::create(&path, spec).unwrap().finalize().unwrap();

        let err = SourceProvider::default().open(&path).unwrap_err();
        assert!(matches!(err, SourceError::Empty(_)));
    }
}
