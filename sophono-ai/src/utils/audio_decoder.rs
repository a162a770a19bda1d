//! Waveform loading
//!
//! **Purpose:** Decode an audio file into a mono f32 sample sequence
//!
//! Uses symphonia for format-agnostic decoding (MP3, FLAC, AAC, WAV, OGG, ...)
//! and rubato when a target sample rate other than the native one is requested.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::path::Path;
use symphonia::core::audio::{AudioBufferRef, SampleBuffer};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::error::AnalysisError;

/// Immutable mono signal with its sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    /// Wrap already-decoded mono samples
    ///
    /// # Errors
    /// * `AnalysisError::Decode` if `sample_rate` is zero
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::Decode(
                "Sample rate must be positive".to_string(),
            ));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode an audio file to a mono [`Waveform`]
///
/// **Algorithm:**
/// 1. Probe the container (file extension used as hint)
/// 2. Pick the first track with a real codec
/// 3. Decode every packet of that track, averaging channels to mono
/// 4. Resample to `target_sample_rate` if given and different from native
///
/// Packets that individually fail to decode are skipped with a warning.
///
/// # Errors
/// * `AnalysisError::Decode` - file unreadable, unsupported format, no audio
///   track, unknown sample rate, or resampling failure
pub fn load_waveform(
    file_path: &Path,
    target_sample_rate: Option<u32>,
) -> Result<Waveform, AnalysisError> {
    debug!(path = %file_path.display(), "Decoding audio file");

    let file = std::fs::File::open(file_path).map_err(|e| {
        AnalysisError::Decode(format!(
            "Failed to open audio file {}: {}",
            file_path.display(),
            e
        ))
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = file_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| {
            AnalysisError::Decode(format!(
                "Unsupported or corrupt audio file {}: {}",
                file_path.display(),
                e
            ))
        })?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AnalysisError::Decode("No audio track found in file".to_string()))?;

    let track_id = track.id;
    let native_sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AnalysisError::Decode("Sample rate unknown".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AnalysisError::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(AnalysisError::Decode(format!("Error reading packet: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => mix_to_mono(decoded, &mut samples),
            Err(SymphoniaError::DecodeError(msg)) => {
                skipped_packets += 1;
                warn!(path = %file_path.display(), error = msg, "Skipping undecodable packet");
            }
            Err(e) => {
                return Err(AnalysisError::Decode(format!("Failed to decode packet: {}", e)));
            }
        }
    }

    debug!(
        path = %file_path.display(),
        native_sample_rate,
        total_samples = samples.len(),
        skipped_packets,
        "Audio decoding complete"
    );

    ensure_decoded(&samples, skipped_packets)?;

    match target_sample_rate {
        Some(target) if target != native_sample_rate => {
            let resampled = resample_mono(samples, native_sample_rate, target)?;
            Waveform::new(resampled, target)
        }
        _ => Waveform::new(samples, native_sample_rate),
    }
}

/// A stream whose every packet failed to decode is a decode error, not silence
fn ensure_decoded(samples: &[f32], skipped_packets: usize) -> Result<(), AnalysisError> {
    if samples.is_empty() && skipped_packets > 0 {
        return Err(AnalysisError::Decode(format!(
            "No decodable audio: all {} packets failed",
            skipped_packets
        )));
    }
    Ok(())
}

/// Average all channels of a decoded buffer into `out`
fn mix_to_mono(decoded: AudioBufferRef<'_>, out: &mut Vec<f32>) {
    let spec = *decoded.spec();
    let channels = spec.channels.count().max(1);

    let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
    buffer.copy_interleaved_ref(decoded);

    out.extend(
        buffer
            .samples()
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}

/// Resample a mono signal with rubato's sinc interpolator
///
/// Single pass: the chunk size equals the input length.
fn resample_mono(
    samples: Vec<f32>,
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<f32>, AnalysisError> {
    if samples.is_empty() {
        return Ok(samples);
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = target_rate as f64 / source_rate as f64;
    let num_frames = samples.len();

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, num_frames, 1)
        .map_err(|e| AnalysisError::Decode(format!("Failed to create resampler: {}", e)))?;

    let input = vec![samples];
    let mut output = resampler
        .process(&input, None)
        .map_err(|e| AnalysisError::Decode(format!("Resampling failed: {}", e)))?;

    debug!(
        "Resampled {} frames ({} Hz) → {} frames ({} Hz)",
        num_frames,
        source_rate,
        output[0].len(),
        target_rate
    );

    Ok(output.swap_remove(0))
}
