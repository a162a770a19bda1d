//! # Sophono Common Library
//!
//! Shared code for the Sophono services:
//! - Error types
//! - Configuration loading (TOML + environment resolution)
//! - API response types for the analysis result boundary

pub mod api;
pub mod config;
pub mod error;

pub use error::{Error, Result};
