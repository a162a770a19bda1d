//! API types shared between the analysis service and its clients
//!
//! Contains ONLY plain serializable types; the HTTP framework wiring lives in
//! `sophono-ai`.

pub mod types;

pub use types::{AnalysisResponse, ResponseStatus, ScoreSource};
