//! Acoustic feature extraction
//!
//! Reduces a waveform to 17 scalars: tempo, mean spectral centroid, mean
//! zero-crossing rate, mean RMS energy and the 13 time-averaged MFCCs.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::dsp::{self, SpectralFrames, N_MFCC};
use crate::error::AnalysisError;
use crate::utils::Waveform;

/// Summary features of one song
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcousticFeatures {
    /// Estimated global tempo (BPM)
    pub tempo: f64,
    /// Mean spectral centroid (Hz)
    pub spectral_centroid: f64,
    /// Mean zero-crossing rate, in [0, 1]
    pub zero_crossing_rate: f64,
    /// Mean RMS energy
    pub rms: f64,
    /// Time-averaged MFCCs 1..=13
    pub mfcc: [f64; N_MFCC],
}

impl AcousticFeatures {
    /// All 17 features as `(name, value)` pairs
    pub fn named_values(&self) -> Vec<(String, f64)> {
        let mut values = vec![
            ("tempo".to_string(), self.tempo),
            ("spectral_centroid".to_string(), self.spectral_centroid),
            ("zero_crossing_rate".to_string(), self.zero_crossing_rate),
            ("rms".to_string(), self.rms),
        ];
        values.extend(
            self.mfcc
                .iter()
                .enumerate()
                .map(|(i, &v)| (format!("mfcc_{}", i + 1), v)),
        );
        values
    }
}

/// Computes [`AcousticFeatures`] from a [`Waveform`]
#[derive(Debug, Clone, Copy, Default)]
pub struct AcousticFeatureExtractor;

impl AcousticFeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// # Errors
    /// * `AnalysisError::EmptySignal` - no samples, or peak amplitude at the silence floor
    pub fn extract(&self, waveform: &Waveform) -> Result<AcousticFeatures, AnalysisError> {
        if waveform.is_empty() {
            return Err(AnalysisError::EmptySignal("audio contains no samples".to_string()));
        }
        if dsp::is_silent(waveform.samples()) {
            return Err(AnalysisError::EmptySignal("audio is silent".to_string()));
        }

        let samples = waveform.samples();
        let sample_rate = waveform.sample_rate();

        let spectral = SpectralFrames::compute(samples, sample_rate);
        let tempo = dsp::estimate_tempo(&spectral.onset_envelope(), sample_rate);

        let mfcc_frames = spectral.mfcc();
        let mut mfcc = [0.0; N_MFCC];
        for frame in &mfcc_frames {
            for (acc, value) in mfcc.iter_mut().zip(frame) {
                *acc += value;
            }
        }
        for value in mfcc.iter_mut() {
            *value /= mfcc_frames.len() as f64;
        }

        let features = AcousticFeatures {
            tempo,
            spectral_centroid: dsp::mean(&spectral.centroid),
            zero_crossing_rate: dsp::mean(&dsp::zero_crossing_rate_frames(samples)),
            rms: dsp::mean(&dsp::rms_frames(samples)),
            mfcc,
        };

        debug!(
            frames = spectral.num_frames(),
            tempo = features.tempo,
            rms = features.rms,
            "Extracted acoustic features"
        );

        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(frequency: f32, seconds: f32, sample_rate: u32, amplitude: f32) -> Waveform {
        let n = (seconds * sample_rate as f32) as usize;
        let samples = (0..n)
            .map(|i| {
                amplitude
                    * (2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate as f32).sin()
            })
            .collect();
        Waveform::new(samples, sample_rate).unwrap()
    }

    #[test]
    fn test_extract_produces_seventeen_finite_values() {
        let features = AcousticFeatureExtractor::new()
            .extract(&tone(440.0, 2.0, 22050, 0.5))
            .unwrap();

        let values = features.named_values();
        assert_eq!(values.len(), 17);
        assert!(values.iter().all(|(_, v)| v.is_finite()));
        assert_eq!(values[4].0, "mfcc_1");
        assert_eq!(values[16].0, "mfcc_13");
    }

    #[test]
    fn test_extract_ranges() {
        let features = AcousticFeatureExtractor::new()
            .extract(&tone(1000.0, 2.0, 22050, 0.5))
            .unwrap();

        assert!(features.tempo > 0.0);
        assert!(features.spectral_centroid >= 0.0);
        assert!((0.0..=1.0).contains(&features.zero_crossing_rate));
        assert!(features.rms >= 0.0);
        // A 0.5 amplitude sine has RMS of about 0.354
        assert!((features.rms - 0.354).abs() < 0.03, "rms {}", features.rms);
    }

    #[test]
    fn test_extract_empty_signal() {
        let waveform = Waveform::new(Vec::new(), 22050).unwrap();
        assert!(matches!(
            AcousticFeatureExtractor::new().extract(&waveform),
            Err(AnalysisError::EmptySignal(_))
        ));
    }

    #[test]
    fn test_extract_silent_signal() {
        let waveform = Waveform::new(vec![0.0; 22050], 22050).unwrap();
        assert!(matches!(
            AcousticFeatureExtractor::new().extract(&waveform),
            Err(AnalysisError::EmptySignal(_))
        ));
    }

    #[test]
    fn test_features_serialize_with_mfcc_array() {
        let features = AcousticFeatures {
            tempo: 120.0,
            spectral_centroid: 1500.0,
            zero_crossing_rate: 0.05,
            rms: 0.2,
            mfcc: [0.0; N_MFCC],
        };
        let json = serde_json::to_value(&features).unwrap();
        assert_eq!(json["mfcc"].as_array().unwrap().len(), N_MFCC);
        assert_eq!(json["tempo"], 120.0);
    }
}
