//! Utility modules for sophono-ai

pub mod audio_decoder;

pub use audio_decoder::{load_waveform, Waveform};
