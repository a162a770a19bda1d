//! Test Helper Utilities
//!
//! Shared utilities for testing sophono-ai

#![allow(dead_code)]

pub mod audio_generator;
pub mod text_generator;

pub use audio_generator::{generate_click_track, generate_test_wav, AudioConfig};
pub use text_generator::ScriptedGenerator;
