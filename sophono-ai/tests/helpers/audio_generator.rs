//! Audio Test Fixture Generator
//!
//! Writes 16-bit PCM WAV files with hound

use std::path::{Path, PathBuf};

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Sine frequency in Hz
    pub frequency: f32,
    /// Peak amplitude, 0.0 writes digital silence
    pub amplitude: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 20.0,
            sample_rate: 44100,
            channels: 2,
            frequency: 440.0,
            amplitude: 0.5,
        }
    }
}

fn wav_spec(sample_rate: u32, channels: u16) -> hound::WavSpec {
    hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Generate a sine-tone WAV file
pub fn generate_test_wav(path: &Path, config: &AudioConfig) -> anyhow::Result<PathBuf> {
    let mut writer = hound::WavWriter::create(path, wav_spec(config.sample_rate, config.channels))?;
    let total_samples = (config.duration_seconds * config.sample_rate as f64) as usize;

    for i in 0..total_samples {
        let t = i as f32 / config.sample_rate as f32;
        let sample = to_i16(config.amplitude * (2.0 * std::f32::consts::PI * config.frequency * t).sin());
        for _ in 0..config.channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

/// Generate a mono click track
///
/// Each click is a short 1 kHz burst; clicks start every `period_samples`.
pub fn generate_click_track(
    path: &Path,
    sample_rate: u32,
    period_samples: usize,
    duration_seconds: f64,
) -> anyhow::Result<PathBuf> {
    let mut writer = hound::WavWriter::create(path, wav_spec(sample_rate, 1))?;
    let total_samples = (duration_seconds * sample_rate as f64) as usize;
    let click_len = 256;

    for i in 0..total_samples {
        let offset = i % period_samples;
        let sample = if offset < click_len {
            let t = offset as f32 / sample_rate as f32;
            0.9 * (2.0 * std::f32::consts::PI * 1000.0 * t).sin()
        } else {
            0.0
        };
        writer.write_sample(to_i16(sample))?;
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_simple_wav() {
        let temp_dir = TempDir::new().unwrap();
        let wav_path = temp_dir.path().join("test.wav");

        generate_test_wav(&wav_path, &AudioConfig::default()).unwrap();

        let metadata = std::fs::metadata(&wav_path).unwrap();
        assert!(metadata.len() > 1000, "WAV file should be non-trivial size");
    }
}
