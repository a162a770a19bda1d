//! Frame-level DSP primitives
//!
//! Shared by the acoustic feature extractor and the viral heuristic scorer.
//! Each caller runs its own pass over the waveform; nothing here caches.
//!
//! Conventions (all frame-based measures agree on framing):
//! - Frame length / FFT size 2048, hop 512
//! - Centered frames: `1 + len / hop` frames, frame `i` centered on sample `i * hop`
//! - Periodic Hann window for the STFT
//! - 128-band Slaney mel filterbank, dB scaling with an 80 dB floor below peak
//! - 13 MFCCs from an orthonormal DCT-II of the dB mel spectrum

use rustfft::{num_complex::Complex, FftPlanner};

pub const FRAME_LENGTH: usize = 2048;
pub const HOP_LENGTH: usize = 512;
pub const N_MELS: usize = 128;
pub const N_MFCC: usize = 13;

/// Power floor before taking logarithms
const AMIN: f64 = 1e-10;
/// Dynamic range kept by [`power_to_db`]
const TOP_DB: f64 = 80.0;
/// Magnitudes at or below this count as zero for zero-crossing detection
const ZERO_CROSSING_THRESHOLD: f32 = 1e-10;
/// Peak amplitude at or below this is treated as silence
const SILENCE_THRESHOLD: f32 = 1e-8;

/// Tempo prior center (BPM)
pub const START_BPM: f64 = 120.0;
/// Tempo prior width in octaves
const STD_BPM: f64 = 1.0;
/// Tempos at or above this are never reported
const MAX_TEMPO: f64 = 320.0;
/// Autocorrelation window for tempo estimation, in seconds
const AC_SIZE_SECONDS: f64 = 8.0;

/// One MFCC vector
pub type MfccFrame = [f64; N_MFCC];

/// Per-frame spectral measures from one STFT pass
#[derive(Debug, Clone)]
pub struct SpectralFrames {
    /// Spectral centroid per frame (Hz)
    pub centroid: Vec<f64>,
    /// dB-scaled mel spectrum per frame (`N_MELS` bands)
    pub log_mel: Vec<Vec<f64>>,
}

impl SpectralFrames {
    /// Run the STFT and derive centroid + log-mel frames
    pub fn compute(samples: &[f32], sample_rate: u32) -> Self {
        let padded = pad_zero(samples);
        let window = hann_window(FRAME_LENGTH);
        let filterbank = MelFilterbank::new(sample_rate, FRAME_LENGTH, N_MELS);
        let frequencies = fft_frequencies(sample_rate, FRAME_LENGTH);

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(FRAME_LENGTH);
        let mut buffer = vec![Complex::new(0.0f32, 0.0); FRAME_LENGTH];

        let n_frames = frame_count(samples.len());
        let mut centroid = Vec::with_capacity(n_frames);
        let mut mel_power = Vec::with_capacity(n_frames);
        let mut power = vec![0.0f64; FRAME_LENGTH / 2 + 1];

        for frame in 0..n_frames {
            let start = frame * HOP_LENGTH;
            for (i, slot) in buffer.iter_mut().enumerate() {
                *slot = Complex::new(padded[start + i] * window[i], 0.0);
            }
            fft.process(&mut buffer);

            let mut weighted = 0.0f64;
            let mut total = 0.0f64;
            for (k, bin) in buffer.iter().take(power.len()).enumerate() {
                let magnitude = bin.norm() as f64;
                weighted += frequencies[k] * magnitude;
                total += magnitude;
                power[k] = magnitude * magnitude;
            }
            centroid.push(if total > 0.0 { weighted / total } else { 0.0 });
            mel_power.push(filterbank.apply(&power));
        }

        power_to_db(&mut mel_power);

        Self {
            centroid,
            log_mel: mel_power,
        }
    }

    pub fn num_frames(&self) -> usize {
        self.centroid.len()
    }

    /// MFCC vector for every frame
    pub fn mfcc(&self) -> Vec<MfccFrame> {
        let dct = DctBasis::new(N_MELS);
        self.log_mel.iter().map(|frame| dct.apply(frame)).collect()
    }

    /// Onset strength envelope: mean positive dB increase across mel bands
    pub fn onset_envelope(&self) -> Vec<f64> {
        let mut envelope = Vec::with_capacity(self.log_mel.len());
        if self.log_mel.is_empty() {
            return envelope;
        }
        envelope.push(0.0);
        for pair in self.log_mel.windows(2) {
            let flux: f64 = pair[1]
                .iter()
                .zip(&pair[0])
                .map(|(current, previous)| (current - previous).max(0.0))
                .sum();
            envelope.push(flux / N_MELS as f64);
        }
        envelope
    }
}

/// Number of centered frames for a signal of `len` samples
pub fn frame_count(len: usize) -> usize {
    1 + len / HOP_LENGTH
}

/// Periodic Hann window
pub fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|n| {
            0.5 - 0.5 * (2.0 * std::f64::consts::PI * n as f64 / len as f64).cos() as f32
        })
        .collect()
}

/// Center frequency of each rFFT bin
fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f64> {
    (0..=n_fft / 2)
        .map(|k| k as f64 * sample_rate as f64 / n_fft as f64)
        .collect()
}

/// Zero-pad `FRAME_LENGTH / 2` samples on each side
fn pad_zero(samples: &[f32]) -> Vec<f32> {
    let pad = FRAME_LENGTH / 2;
    let mut padded = vec![0.0f32; samples.len() + 2 * pad];
    padded[pad..pad + samples.len()].copy_from_slice(samples);
    padded
}

/// Repeat the edge samples `FRAME_LENGTH / 2` times on each side
fn pad_edge(samples: &[f32]) -> Vec<f32> {
    let pad = FRAME_LENGTH / 2;
    let first = samples.first().copied().unwrap_or(0.0);
    let last = samples.last().copied().unwrap_or(0.0);

    let mut padded = Vec::with_capacity(samples.len() + 2 * pad);
    padded.extend(std::iter::repeat(first).take(pad));
    padded.extend_from_slice(samples);
    padded.extend(std::iter::repeat(last).take(pad));
    padded
}

/// Root-mean-square energy per frame
pub fn rms_frames(samples: &[f32]) -> Vec<f64> {
    let padded = pad_zero(samples);
    (0..frame_count(samples.len()))
        .map(|frame| {
            let start = frame * HOP_LENGTH;
            let sum_squares: f64 = padded[start..start + FRAME_LENGTH]
                .iter()
                .map(|&s| (s as f64).powi(2))
                .sum();
            (sum_squares / FRAME_LENGTH as f64).sqrt()
        })
        .collect()
}

/// Zero-crossing rate per frame, in [0, 1]
///
/// Counts sign changes between consecutive samples of the frame and divides by
/// the frame length. Near-zero samples count as non-negative.
pub fn zero_crossing_rate_frames(samples: &[f32]) -> Vec<f64> {
    let padded = pad_edge(samples);
    let negative: Vec<bool> = padded
        .iter()
        .map(|&s| s < 0.0 && s.abs() > ZERO_CROSSING_THRESHOLD)
        .collect();

    (0..frame_count(samples.len()))
        .map(|frame| {
            let start = frame * HOP_LENGTH;
            let crossings = negative[start..start + FRAME_LENGTH]
                .windows(2)
                .filter(|w| w[0] != w[1])
                .count();
            crossings as f64 / FRAME_LENGTH as f64
        })
        .collect()
}

/// Estimate a single global tempo (BPM) from an onset envelope
///
/// Autocorrelates the envelope over lags up to `AC_SIZE_SECONDS`, then picks the
/// lag maximizing `ln(1 + 1e6·ac) + log-normal prior(120 BPM, 1 octave)`.
/// Always positive; envelopes too short to hold a candidate lag yield
/// [`START_BPM`].
pub fn estimate_tempo(onset_envelope: &[f64], sample_rate: u32) -> f64 {
    let frames_per_second = sample_rate as f64 / HOP_LENGTH as f64;
    let max_lag = ((AC_SIZE_SECONDS * frames_per_second) as usize).min(onset_envelope.len());

    let autocorrelation: Vec<f64> = (0..max_lag)
        .map(|lag| {
            onset_envelope
                .iter()
                .zip(&onset_envelope[lag..])
                .map(|(a, b)| a * b)
                .sum::<f64>()
        })
        .collect();

    let energy = autocorrelation.first().copied().unwrap_or(0.0);
    let log_start = START_BPM.log2();

    let mut best: Option<(f64, f64)> = None;
    for (lag, &ac) in autocorrelation.iter().enumerate().skip(1) {
        let bpm = 60.0 * frames_per_second / lag as f64;
        if bpm >= MAX_TEMPO {
            continue;
        }
        let normalized = if energy > 0.0 { ac / energy } else { 0.0 };
        let log_prior = -0.5 * ((bpm.log2() - log_start) / STD_BPM).powi(2);
        let score = (1.0 + 1e6 * normalized.max(0.0)).ln() + log_prior;

        if best.map_or(true, |(best_score, _)| score > best_score) {
            best = Some((score, bpm));
        }
    }

    best.map(|(_, bpm)| bpm).unwrap_or(START_BPM)
}

/// Arithmetic mean (0 for an empty slice)
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// True when the signal has no samples or never rises above the silence floor
pub fn is_silent(samples: &[f32]) -> bool {
    samples.iter().all(|s| s.abs() <= SILENCE_THRESHOLD)
}

/// Convert power to dB in place, relative to 1.0, clipped at `TOP_DB` below the peak
pub fn power_to_db(frames: &mut [Vec<f64>]) {
    let mut peak = f64::NEG_INFINITY;
    for value in frames.iter_mut().flat_map(|f| f.iter_mut()) {
        *value = 10.0 * value.max(AMIN).log10();
        peak = peak.max(*value);
    }

    let floor = peak - TOP_DB;
    for value in frames.iter_mut().flat_map(|f| f.iter_mut()) {
        *value = value.max(floor);
    }
}

// ============================================================================
// Mel filterbank
// ============================================================================

const MEL_F_SP: f64 = 200.0 / 3.0;
const MEL_MIN_LOG_HZ: f64 = 1000.0;
const MEL_MIN_LOG_MEL: f64 = MEL_MIN_LOG_HZ / MEL_F_SP;

fn mel_log_step() -> f64 {
    6.4f64.ln() / 27.0
}

/// Slaney mel scale: linear below 1 kHz, logarithmic above
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MEL_MIN_LOG_HZ {
        MEL_MIN_LOG_MEL + (hz / MEL_MIN_LOG_HZ).ln() / mel_log_step()
    } else {
        hz / MEL_F_SP
    }
}

pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MEL_MIN_LOG_MEL {
        MEL_MIN_LOG_HZ * (mel_log_step() * (mel - MEL_MIN_LOG_MEL)).exp()
    } else {
        MEL_F_SP * mel
    }
}

/// Triangular mel filters with Slaney area normalization
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    weights: Vec<Vec<f64>>,
}

impl MelFilterbank {
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize) -> Self {
        let frequencies = fft_frequencies(sample_rate, n_fft);
        let min_mel = hz_to_mel(0.0);
        let max_mel = hz_to_mel(sample_rate as f64 / 2.0);

        let mel_points: Vec<f64> = (0..n_mels + 2)
            .map(|i| mel_to_hz(min_mel + (max_mel - min_mel) * i as f64 / (n_mels + 1) as f64))
            .collect();

        let weights = (0..n_mels)
            .map(|m| {
                let (left, center, right) = (mel_points[m], mel_points[m + 1], mel_points[m + 2]);
                let norm = 2.0 / (right - left);
                frequencies
                    .iter()
                    .map(|&f| {
                        let lower = (f - left) / (center - left);
                        let upper = (right - f) / (right - center);
                        lower.min(upper).max(0.0) * norm
                    })
                    .collect::<Vec<f64>>()
            })
            .collect();

        Self { weights }
    }

    pub fn num_bands(&self) -> usize {
        self.weights.len()
    }

    /// Project a power spectrum onto the mel bands
    pub fn apply(&self, power: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .map(|band| band.iter().zip(power).map(|(w, p)| w * p).sum::<f64>())
            .collect()
    }
}

/// Orthonormal DCT-II basis truncated to `N_MFCC` outputs
struct DctBasis {
    rows: Vec<Vec<f64>>,
}

impl DctBasis {
    fn new(n_inputs: usize) -> Self {
        let n = n_inputs as f64;
        let rows = (0..N_MFCC)
            .map(|k| {
                let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
                (0..n_inputs)
                    .map(|i| {
                        scale
                            * (std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n))
                                .cos()
                    })
                    .collect::<Vec<f64>>()
            })
            .collect();
        Self { rows }
    }

    fn apply(&self, input: &[f64]) -> MfccFrame {
        let mut out = [0.0; N_MFCC];
        for (coefficient, row) in out.iter_mut().zip(&self.rows) {
            *coefficient = row.iter().zip(input).map(|(b, x)| b * x).sum::<f64>();
        }
        out
    }
}
