//! sophono-ai library interface
//!
//! Viral-potential analysis for songs and lyrics. Exposes the analysis
//! pipeline, the collaborator abstraction and the HTTP router.

pub mod analysis;
pub mod api;
pub mod error;
pub mod services;
pub mod utils;
pub mod workflow;

pub use crate::error::{AnalysisError, ApiError, ApiResult};

use std::path::PathBuf;
use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Router};
use chrono::{DateTime, Utc};
use sophono_common::api::AnalysisResponse;
use sophono_common::config::TomlConfig;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::services::{EstimateConfig, GenerationOptions, TextGenerator};
use crate::workflow::{LyricsAnalyzer, SongAnalyzer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<TomlConfig>,
    pub generator: Arc<dyn TextGenerator>,
    pub song_analyzer: Arc<SongAnalyzer>,
    pub lyrics_analyzer: Arc<LyricsAnalyzer>,
    /// Where uploads are staged while analyzed
    pub staging_dir: PathBuf,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last failed invocation, for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(config: TomlConfig, generator: Arc<dyn TextGenerator>) -> Self {
        let song_analyzer = SongAnalyzer::new(
            generator.clone(),
            GenerationOptions::music(&config.collaborator),
            EstimateConfig::from(&config.estimate),
        );
        let lyrics_analyzer =
            LyricsAnalyzer::new(generator.clone(), GenerationOptions::lyrics(&config.collaborator));

        Self {
            staging_dir: config.staging.resolved_dir(),
            config: Arc::new(config),
            generator,
            song_analyzer: Arc::new(song_analyzer),
            lyrics_analyzer: Arc::new(lyrics_analyzer),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Remember the message of a failed invocation
    pub async fn record_outcome(&self, response: &AnalysisResponse) {
        if let Some(message) = response.message.as_ref().filter(|_| !response.is_success()) {
            *self.last_error.write().await = Some(message.clone());
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.server.max_upload_bytes;

    Router::new()
        .merge(api::music_routes())
        .merge(api::lyrics_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
