//! Lyrics analysis workflow: validate, prompt, return the reply verbatim

use std::sync::Arc;

use sophono_common::api::AnalysisResponse;
use tracing::{error, info};

use crate::error::AnalysisError;
use crate::services::{lyrics_prompt, GenerationOptions, GenerationRequest, TextGenerator};

pub struct LyricsAnalyzer {
    generator: Arc<dyn TextGenerator>,
    options: GenerationOptions,
}

impl LyricsAnalyzer {
    pub fn new(generator: Arc<dyn TextGenerator>, options: GenerationOptions) -> Self {
        Self { generator, options }
    }

    /// # Errors
    /// * `AnalysisError::EmptyInput` - blank lyrics; the collaborator is not called
    /// * `AnalysisError::Collaborator` - generation failed
    pub async fn analyze(&self, lyrics: &str) -> Result<String, AnalysisError> {
        if lyrics.trim().is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let request = GenerationRequest::user_prompt(lyrics_prompt(lyrics), &self.options);
        let analysis = self.generator.generate(&request).await?;

        info!(lyrics_chars = lyrics.len(), reply_chars = analysis.len(), "Lyrics assessment complete");
        Ok(analysis)
    }

    /// Invocation boundary: every failure becomes an error-status response
    pub async fn process(&self, lyrics: &str) -> AnalysisResponse {
        match self.analyze(lyrics).await {
            Ok(analysis) => AnalysisResponse::lyrics(analysis),
            Err(e) => {
                error!(error = %e, "Lyrics analysis failed");
                AnalysisResponse::error(e.to_string())
            }
        }
    }
}
