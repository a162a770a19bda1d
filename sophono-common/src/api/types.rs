//! Result boundary types
//!
//! Every invocation of the music or lyrics pipeline ends in exactly one
//! [`AnalysisResponse`]: either a success carrying the collaborator's text (and,
//! for music, the derived score and estimate) or an error carrying a message.

use serde::{Deserialize, Serialize};

/// Outcome of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Where the final 0-100 score came from
///
/// `Default` means the collaborator's reply carried no `<final>` tag and the
/// neutral midpoint was substituted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    Extracted,
    Default,
}

/// JSON body returned by `/process-music` and `/process-lyrics`
///
/// # Examples
///
/// ```
/// use sophono_common::api::types::{AnalysisResponse, ResponseStatus};
///
/// let response = AnalysisResponse::error("No lyrics provided");
/// assert_eq!(response.status, ResponseStatus::Error);
/// assert_eq!(response.message.as_deref(), Some("No lyrics provided"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub status: ResponseStatus,

    /// Collaborator text, returned verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    /// Final 0-100 score (music path only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_source: Option<ScoreSource>,

    /// Estimated stream count (music path only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streams: Option<u64>,

    /// Estimated revenue in dollars (music path only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<f64>,

    /// Error message (error status only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AnalysisResponse {
    /// Successful music analysis
    pub fn music(
        result: String,
        score: u32,
        score_source: ScoreSource,
        streams: u64,
        revenue: f64,
    ) -> Self {
        Self {
            status: ResponseStatus::Success,
            result: Some(result),
            score: Some(score),
            score_source: Some(score_source),
            streams: Some(streams),
            revenue: Some(revenue),
            message: None,
        }
    }

    /// Successful lyrics analysis
    pub fn lyrics(result: String) -> Self {
        Self {
            status: ResponseStatus::Success,
            result: Some(result),
            score: None,
            score_source: None,
            streams: None,
            revenue: None,
            message: None,
        }
    }

    /// Failed invocation
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            result: None,
            score: None,
            score_source: None,
            streams: None,
            revenue: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}
