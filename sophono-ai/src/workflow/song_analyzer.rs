//! Song analysis workflow
//!
//! **Flow:**
//! 1. Decode the file to a mono waveform
//! 2. Extract acoustic features and the viral heuristic from the same waveform
//! 3. Render the assessment prompt and call the collaborator
//! 4. Extract the final score and derive the stream/revenue estimate
//!
//! Steps 1–2 are CPU-bound and run on the blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use sophono_common::api::AnalysisResponse;
use tracing::{error, info, warn};

use crate::analysis::{AcousticFeatureExtractor, AcousticFeatures, ViralHeuristicResult, ViralHeuristicScorer};
use crate::error::AnalysisError;
use crate::services::{
    extract_final_score, music_prompt, EstimateConfig, GenerationOptions, GenerationRequest,
    ScoreParse, TextGenerator, ViralEstimate,
};
use crate::utils::load_waveform;

/// Features plus heuristic for one song
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongAnalysis {
    pub acoustic_features: AcousticFeatures,
    pub viral_analysis: ViralHeuristicResult,
}

/// Decode `path` and run both analysis passes
///
/// # Errors
/// * `AnalysisError::Decode` - unreadable or unsupported file
/// * `AnalysisError::EmptySignal` - no samples or silence
pub fn analyze_song(path: &Path, target_sample_rate: Option<u32>) -> Result<SongAnalysis, AnalysisError> {
    let waveform = load_waveform(path, target_sample_rate)?;
    info!(
        path = %path.display(),
        sample_rate = waveform.sample_rate(),
        duration_secs = waveform.duration_seconds(),
        "Loaded waveform"
    );

    let acoustic_features = AcousticFeatureExtractor::new().extract(&waveform)?;
    let viral_analysis = ViralHeuristicScorer::default().score(&waveform)?;

    Ok(SongAnalysis {
        acoustic_features,
        viral_analysis,
    })
}

/// Complete result of one music invocation
#[derive(Debug, Clone, Serialize)]
pub struct SongReport {
    pub analysis: SongAnalysis,
    /// Collaborator text, verbatim
    pub assessment: String,
    pub estimate: ViralEstimate,
}

impl SongReport {
    pub fn to_response(&self) -> AnalysisResponse {
        AnalysisResponse::music(
            self.assessment.clone(),
            self.estimate.score,
            self.estimate.source,
            self.estimate.streams,
            self.estimate.revenue,
        )
    }
}

/// Runs the music path end to end
pub struct SongAnalyzer {
    generator: Arc<dyn TextGenerator>,
    options: GenerationOptions,
    estimate: EstimateConfig,
    target_sample_rate: Option<u32>,
}

impl SongAnalyzer {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        options: GenerationOptions,
        estimate: EstimateConfig,
    ) -> Self {
        Self {
            generator,
            options,
            estimate,
            target_sample_rate: None,
        }
    }

    /// Resample decoded audio to this rate before analysis
    pub fn with_target_sample_rate(mut self, sample_rate: Option<u32>) -> Self {
        self.target_sample_rate = sample_rate;
        self
    }

    /// Analyze the file at `path`
    ///
    /// The file is only read; the caller owns its lifetime.
    pub async fn analyze_file(&self, path: &Path) -> Result<SongReport, AnalysisError> {
        let analysis = analyze_blocking(path.to_path_buf(), self.target_sample_rate).await?;
        self.assess(analysis).await
    }

    /// Collaborator step for an already analyzed song
    pub async fn assess(&self, analysis: SongAnalysis) -> Result<SongReport, AnalysisError> {
        let prompt = music_prompt(&analysis.acoustic_features, &analysis.viral_analysis);
        let request = GenerationRequest::user_prompt(prompt, &self.options);

        let assessment = self.generator.generate(&request).await?;

        let parse = extract_final_score(&assessment);
        if parse == ScoreParse::NotFound {
            warn!("Assessment has no <final> score tag; using default score");
        }
        let estimate = ViralEstimate::from_parse(parse, &self.estimate);

        info!(
            heuristic_score = analysis.viral_analysis.score,
            score = estimate.score,
            streams = estimate.streams,
            "Song assessment complete"
        );

        Ok(SongReport {
            analysis,
            assessment,
            estimate,
        })
    }

    /// Invocation boundary: every failure becomes an error-status response
    pub async fn process_file(&self, path: &Path) -> AnalysisResponse {
        match self.analyze_file(path).await {
            Ok(report) => report.to_response(),
            Err(e) => {
                error!(path = %path.display(), error = %e, "Music analysis failed");
                AnalysisResponse::error(e.to_string())
            }
        }
    }
}

/// Run [`analyze_song`] on the blocking pool
pub async fn analyze_blocking(
    path: PathBuf,
    target_sample_rate: Option<u32>,
) -> Result<SongAnalysis, AnalysisError> {
    tokio::task::spawn_blocking(move || analyze_song(&path, target_sample_rate))
        .await
        .map_err(|e| AnalysisError::Internal(format!("Analysis task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::HighlightCheck;
    use crate::services::LlmError;
    use async_trait::async_trait;
    use sophono_common::api::{ResponseStatus, ScoreSource};

    struct FixedReply(&'static str);

    #[async_trait]
    impl TextGenerator for FixedReply {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    struct Unreachable;

    #[async_trait]
    impl TextGenerator for Unreachable {
        fn name(&self) -> &str {
            "unreachable"
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<String, LlmError> {
            Err(LlmError::Connection("connection refused".to_string()))
        }
    }

    fn analyzer(generator: Arc<dyn TextGenerator>) -> SongAnalyzer {
        SongAnalyzer::new(
            generator,
            GenerationOptions {
                model: "test-model".to_string(),
                temperature: 0.5,
                max_tokens: 1024,
            },
            EstimateConfig::default(),
        )
    }

    fn analysis() -> SongAnalysis {
        SongAnalysis {
            acoustic_features: AcousticFeatures {
                tempo: 120.0,
                spectral_centroid: 2000.0,
                zero_crossing_rate: 0.08,
                rms: 0.2,
                mfcc: [1.0; 13],
            },
            viral_analysis: ViralHeuristicResult::evaluate(120.0, 0.2, 6, HighlightCheck::Evaluated(true)),
        }
    }

    #[tokio::test]
    async fn test_assess_extracts_score() {
        let report = analyzer(Arc::new(FixedReply("Solid. <final>73</final>")))
            .assess(analysis())
            .await
            .unwrap();

        assert_eq!(report.estimate.score, 73);
        assert_eq!(report.estimate.source, ScoreSource::Extracted);
        assert_eq!(report.assessment, "Solid. <final>73</final>");

        let response = report.to_response();
        assert_eq!(response.status, ResponseStatus::Success);
        assert_eq!(response.score, Some(73));
    }

    #[tokio::test]
    async fn test_assess_without_tag_uses_default() {
        let report = analyzer(Arc::new(FixedReply("No score given")))
            .assess(analysis())
            .await
            .unwrap();

        assert_eq!(report.estimate.score, 50);
        assert_eq!(report.estimate.streams, 50_000_000);
        assert_eq!(report.estimate.source, ScoreSource::Default);
    }

    #[tokio::test]
    async fn test_collaborator_failure_is_error() {
        let result = analyzer(Arc::new(Unreachable)).assess(analysis()).await;
        match result {
            Err(AnalysisError::Collaborator(_)) => {}
            other => panic!("expected collaborator error, got {:?}", other.map(|r| r.estimate)),
        }
    }

    #[tokio::test]
    async fn test_process_missing_file_reports_error() {
        let response = analyzer(Arc::new(FixedReply("<final>80</final>")))
            .process_file(Path::new("/nonexistent/song.mp3"))
            .await;
        assert_eq!(response.status, ResponseStatus::Error);
        assert!(response.message.unwrap().starts_with("Decode error"));
    }
}
