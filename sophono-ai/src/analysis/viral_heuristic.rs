//! Rule-based viral heuristic
//!
//! Four independent checks, one point each:
//! 1. Tempo within 110–130 BPM
//! 2. Mean RMS energy above 0.1
//! 3. Fewer than 8 distinct structural segments
//! 4. Some 15-second window whose per-second energies sum above 1.8

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::dsp::{self, SpectralFrames, HOP_LENGTH};
use super::segmentation::{distinct_segments, segment_frames, DEFAULT_SEGMENT_COUNT};
use crate::error::AnalysisError;
use crate::utils::Waveform;

pub const TEMPO_RANGE: RangeInclusive<f64> = 110.0..=130.0;
pub const ENERGY_THRESHOLD: f64 = 0.1;
pub const MAX_SEGMENTS: usize = 8;
pub const HIGHLIGHT_WINDOW_SECONDS: usize = 15;
/// Mean per-second energy a highlight window must exceed
pub const HIGHLIGHT_ENERGY_THRESHOLD: f64 = 0.12;

/// Why the highlight check could not be evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HighlightSkip {
    #[serde(rename = "Audio too short")]
    AudioTooShort,
    #[serde(rename = "Calculation error")]
    CalculationError,
}

impl fmt::Display for HighlightSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HighlightSkip::AudioTooShort => write!(f, "Audio too short"),
            HighlightSkip::CalculationError => write!(f, "Calculation error"),
        }
    }
}

/// Outcome of the highlight check: a boolean, or the reason it was skipped
///
/// Serializes untagged, so JSON carries either `true`/`false` or the reason text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HighlightCheck {
    Evaluated(bool),
    Skipped(HighlightSkip),
}

impl HighlightCheck {
    /// True only for an evaluated, passing check
    pub fn passed(&self) -> bool {
        matches!(self, HighlightCheck::Evaluated(true))
    }
}

impl fmt::Display for HighlightCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HighlightCheck::Evaluated(true) => write!(f, "Found"),
            HighlightCheck::Evaluated(false) => write!(f, "Not found"),
            HighlightCheck::Skipped(reason) => write!(f, "{}", reason),
        }
    }
}

/// Heuristic score and the measurements behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViralHeuristicResult {
    /// 0..=4, one point per passing check
    pub score: u8,
    pub tempo: f64,
    /// Mean RMS energy
    pub energy: f64,
    /// Distinct structural segments
    pub segments: usize,
    pub highlight_check: HighlightCheck,
}

impl ViralHeuristicResult {
    /// Combine measurements into a scored result
    pub fn evaluate(tempo: f64, energy: f64, segments: usize, highlight_check: HighlightCheck) -> Self {
        let mut result = Self {
            score: 0,
            tempo,
            energy,
            segments,
            highlight_check,
        };
        result.score = [
            result.tempo_passed(),
            result.energy_passed(),
            result.repetition_passed(),
            result.highlight_check.passed(),
        ]
        .into_iter()
        .map(u8::from)
        .sum();
        result
    }

    pub fn tempo_passed(&self) -> bool {
        TEMPO_RANGE.contains(&self.tempo)
    }

    pub fn energy_passed(&self) -> bool {
        self.energy > ENERGY_THRESHOLD
    }

    pub fn repetition_passed(&self) -> bool {
        self.segments < MAX_SEGMENTS
    }
}

/// Highlight check over per-frame RMS energies
///
/// Buckets frames into whole seconds by frame center time, averages each
/// bucket, then slides a `HIGHLIGHT_WINDOW_SECONDS` window over the bucket
/// means looking for a sum above `HIGHLIGHT_ENERGY_THRESHOLD * window`.
pub fn highlight_check(rms_frames: &[f64], sample_rate: u32, duration_seconds: f64) -> HighlightCheck {
    if !duration_seconds.is_finite() {
        return HighlightCheck::Skipped(HighlightSkip::CalculationError);
    }
    let seconds = duration_seconds.floor() as usize;
    if seconds < HIGHLIGHT_WINDOW_SECONDS {
        return HighlightCheck::Skipped(HighlightSkip::AudioTooShort);
    }

    let frames_per_second = sample_rate as f64 / HOP_LENGTH as f64;
    let first_frame = |second: usize| ((second as f64 * frames_per_second).ceil() as usize).min(rms_frames.len());

    let mut per_second = Vec::with_capacity(seconds);
    for second in 0..seconds {
        let bucket = &rms_frames[first_frame(second)..first_frame(second + 1)];
        if bucket.is_empty() {
            return HighlightCheck::Skipped(HighlightSkip::CalculationError);
        }
        let energy = dsp::mean(bucket);
        if !energy.is_finite() {
            return HighlightCheck::Skipped(HighlightSkip::CalculationError);
        }
        per_second.push(energy);
    }

    let best_window = per_second
        .windows(HIGHLIGHT_WINDOW_SECONDS)
        .map(|window| window.iter().sum::<f64>())
        .fold(f64::NEG_INFINITY, f64::max);

    if !best_window.is_finite() {
        return HighlightCheck::Skipped(HighlightSkip::CalculationError);
    }

    HighlightCheck::Evaluated(best_window > HIGHLIGHT_ENERGY_THRESHOLD * HIGHLIGHT_WINDOW_SECONDS as f64)
}

/// Scores a [`Waveform`] against the four heuristic checks
#[derive(Debug, Clone, Copy)]
pub struct ViralHeuristicScorer {
    segment_count: usize,
}

impl Default for ViralHeuristicScorer {
    fn default() -> Self {
        Self {
            segment_count: DEFAULT_SEGMENT_COUNT,
        }
    }
}

impl ViralHeuristicScorer {
    pub fn new(segment_count: usize) -> Self {
        Self { segment_count }
    }

    /// # Errors
    /// * `AnalysisError::EmptySignal` - waveform has no samples
    pub fn score(&self, waveform: &Waveform) -> Result<ViralHeuristicResult, AnalysisError> {
        if waveform.is_empty() {
            return Err(AnalysisError::EmptySignal("audio contains no samples".to_string()));
        }

        let samples = waveform.samples();
        let sample_rate = waveform.sample_rate();

        let spectral = SpectralFrames::compute(samples, sample_rate);
        let tempo = dsp::estimate_tempo(&spectral.onset_envelope(), sample_rate);
        let rms = dsp::rms_frames(samples);
        let energy = dsp::mean(&rms);

        let labels = segment_frames(&spectral.mfcc(), self.segment_count);
        let segments = distinct_segments(&labels);

        let highlight = highlight_check(&rms, sample_rate, waveform.duration_seconds());

        let result = ViralHeuristicResult::evaluate(tempo, energy, segments, highlight);
        debug!(
            score = result.score,
            tempo,
            energy,
            segments,
            brightness = dsp::mean(&spectral.centroid),
            highlight = %result.highlight_check,
            "Viral heuristic evaluated"
        );
        Ok(result)
    }
}
