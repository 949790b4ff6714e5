//! Built-in decoders
//!
//! - WAV via `hound` (fast path, integer and float PCM)
//! - Everything else symphonia can probe (FLAC, MP3, Ogg/Vorbis, AIFF, WAV)

use std::fs::File;
use std::path::Path;

use super::{PcmSource, SourceError, SourceResult};

/// Decode a RIFF/WAVE file with hound
pub fn decode_wav(path: &Path) -> SourceResult<PcmSource> {
    let reader = hound::WavReader::open(path).map_err(|e| wav_error(path, e))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| wav_error(path, e))?,
        hound::SampleFormat::Int => {
            let max_val = 2.0_f32.powi(spec.bits_per_sample as i32 - 1);
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|x| x as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| wav_error(path, e))?
        }
    };

    Ok(PcmSource::from_interleaved(&samples, spec.channels, spec.sample_rate))
}

fn wav_error(path: &Path, e: hound::Error) -> SourceError {
    match e {
        hound::Error::IoError(source) => SourceError::Io {
            path: path.to_path_buf(),
            source,
        },
        hound::Error::FormatError(msg) => SourceError::UnsupportedFormat(msg.to_string()),
        hound::Error::Unsupported => SourceError::UnsupportedFormat("unsupported WAV encoding".to_string()),
        other => SourceError::Decode(other.to_string()),
    }
}

/// Decode any format symphonia can probe
pub fn decode_probed(path: &Path) -> SourceResult<PcmSource> {
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::DecoderOptions;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let file = File::open(path).map_err(|e| SourceError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| SourceError::UnsupportedFormat(e.to_string()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| SourceError::UnsupportedFormat("No audio track found".to_string()))?;

    let track_id = track.id;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| SourceError::UnsupportedFormat("Unknown sample rate".to_string()))?;

    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(2);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| SourceError::UnsupportedFormat(e.to_string()))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                log::warn!("Error reading packet from {:?}: {}", path, e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                log::warn!("Skipping corrupt packet in {:?}: {}", path, e);
                continue;
            }
            Err(e) => return Err(SourceError::Decode(e.to_string())),
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            channels = spec.channels.count() as u16;
            let duration = decoded.capacity() as u64;
            sample_buf = Some(SampleBuffer::new(duration, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    Ok(PcmSource::from_interleaved(&samples, channels, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SampleSource;

    fn write_wav(path: &Path, channels: u16, frames: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in frames {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_decode_wav_int16_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 2, &[16384, -16384, 0, 32767]);

        let source = decode_wav(&path).unwrap();
        assert_eq!(source.sample_rate(), 22050);
        assert_eq!(source.channel_count(), 2);
        assert_eq!(source.len(), 2);
        assert!((source.frames()[0].left - 0.5).abs() < 1e-4);
        assert!((source.frames()[0].right + 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_decode_wav_missing_file_is_io_error() {
        let err = decode_wav(Path::new("/nonexistent/track.wav")).unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[test]
    fn test_probed_decoder_reads_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 1, &[8192; 64]);

        let source = decode_probed(&path).unwrap();
        assert_eq!(source.len(), 64);
        assert_eq!(source.channel_count(), 1);
        assert!((source.frames()[10].right - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_probed_decoder_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.bin");
        std::fs::write(&path, b"definitely not audio").unwrap();

        assert!(decode_probed(&path).is_err());
    }
}
