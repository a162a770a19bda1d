//! Audio analysis
//!
//! - `dsp`: frame-level primitives (STFT, mel, MFCC, RMS, ZCR, tempo)
//! - `features`: 17-scalar acoustic summary
//! - `segmentation`: contiguous structural segments from MFCC frames
//! - `viral_heuristic`: four-check rule-based score

pub mod dsp;
pub mod features;
pub mod segmentation;
pub mod viral_heuristic;

pub use features::{AcousticFeatureExtractor, AcousticFeatures};
pub use viral_heuristic::{
    HighlightCheck, HighlightSkip, ViralHeuristicResult, ViralHeuristicScorer,
};
