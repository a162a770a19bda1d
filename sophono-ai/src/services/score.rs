//! Score extraction and stream/revenue estimation
//!
//! The collaborator reports its 0–100 assessment inside `<final>…</final>`.
//! That score is mapped onto a stream count with a logistic curve and
//! converted to revenue at a fixed per-stream rate.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use sophono_common::api::ScoreSource;
use sophono_common::config::EstimateSettings;

/// Score assumed when the reply carries no usable `<final>` tag
pub const DEFAULT_SCORE: u32 = 50;

fn final_tag() -> &'static Regex {
    static FINAL_TAG: OnceLock<Regex> = OnceLock::new();
    FINAL_TAG.get_or_init(|| Regex::new(r"<final>([0-9]+)</final>").expect("static regex is valid"))
}

/// Result of scanning a reply for the final score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreParse {
    Found(u32),
    NotFound,
}

impl ScoreParse {
    /// Extracted score, or [`DEFAULT_SCORE`]
    pub fn value(&self) -> u32 {
        match self {
            ScoreParse::Found(score) => *score,
            ScoreParse::NotFound => DEFAULT_SCORE,
        }
    }

    pub fn source(&self) -> ScoreSource {
        match self {
            ScoreParse::Found(_) => ScoreSource::Extracted,
            ScoreParse::NotFound => ScoreSource::Default,
        }
    }
}

/// Find the first `<final>N</final>` (digits only) in `text`
///
/// A digit run too large for `u32` counts as not found.
pub fn extract_final_score(text: &str) -> ScoreParse {
    final_tag()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse::<u32>().ok())
        .map_or(ScoreParse::NotFound, ScoreParse::Found)
}

/// Map a 0–100 score onto `0..=max_streams` with a logistic curve
///
/// `floor(max_streams / (1 + e^-(10·score/100 - 5)))`; 50 maps to exactly half.
pub fn sigmoid_scale(score: u32, max_streams: u64) -> u64 {
    let normalized = score as f64 / 100.0;
    let sigmoid = 1.0 / (1.0 + (-(10.0 * normalized - 5.0)).exp());
    ((sigmoid * max_streams as f64) as u64).min(max_streams)
}

/// Estimation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimateConfig {
    pub stream_ceiling: u64,
    pub revenue_per_stream: f64,
    /// Clamp extracted scores to 0..=100 before scaling
    pub clamp_score: bool,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self::from(&EstimateSettings::default())
    }
}

impl From<&EstimateSettings> for EstimateConfig {
    fn from(settings: &EstimateSettings) -> Self {
        Self {
            stream_ceiling: settings.stream_ceiling,
            revenue_per_stream: settings.revenue_per_stream,
            clamp_score: settings.clamp_score,
        }
    }
}

/// Score with its derived stream and revenue figures
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViralEstimate {
    pub score: u32,
    pub source: ScoreSource,
    pub streams: u64,
    pub revenue: f64,
}

impl ViralEstimate {
    pub fn from_parse(parse: ScoreParse, config: &EstimateConfig) -> Self {
        let score = if config.clamp_score {
            parse.value().min(100)
        } else {
            parse.value()
        };
        let streams = sigmoid_scale(score, config.stream_ceiling);
        Self {
            score,
            source: parse.source(),
            streams,
            revenue: streams as f64 * config.revenue_per_stream,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CEILING: u64 = 100_000_000;

    #[test]
    fn test_extract_found() {
        let parse = extract_final_score("Great song. <final>73</final> Summary: ...");
        assert_eq!(parse, ScoreParse::Found(73));
        assert_eq!(parse.value(), 73);
        assert_eq!(parse.source(), ScoreSource::Extracted);
    }

    #[test]
    fn test_extract_first_match_wins() {
        assert_eq!(
            extract_final_score("<final>40</final> then <final>90</final>"),
            ScoreParse::Found(40)
        );
    }

    #[test]
    fn test_extract_ignores_non_ascii_digits() {
        assert_eq!(
            extract_final_score("<final>\u{0667}\u{0663}</final> then <final>80</final>"),
            ScoreParse::Found(80)
        );
        assert_eq!(extract_final_score("<final>\u{0667}\u{0663}</final>"), ScoreParse::NotFound);
    }

    #[test]
    fn test_extract_not_found() {
        for text in [
            "No score here",
            "<final>seventy</final>",
            "<final> 73 </final>",
            "<final>-5</final>",
            "<final>99999999999999</final>",
            "",
        ] {
            let parse = extract_final_score(text);
            assert_eq!(parse, ScoreParse::NotFound, "text: {:?}", text);
            assert_eq!(parse.value(), DEFAULT_SCORE);
            assert_eq!(parse.source(), ScoreSource::Default);
        }
    }

    #[test]
    fn test_sigmoid_anchor_points() {
        assert_eq!(sigmoid_scale(50, CEILING), 50_000_000);
        let low = sigmoid_scale(0, CEILING);
        let high = sigmoid_scale(100, CEILING);
        assert!((669_000..=670_000).contains(&low), "low {}", low);
        assert!((99_330_000..=99_331_000).contains(&high), "high {}", high);
    }

    #[test]
    fn test_sigmoid_monotonic_and_bounded() {
        let mut previous = 0;
        for score in 0..=100 {
            let streams = sigmoid_scale(score, CEILING);
            assert!(streams >= previous);
            assert!(streams <= CEILING);
            previous = streams;
        }
        assert!(sigmoid_scale(u32::MAX, CEILING) <= CEILING);
    }

    #[test]
    fn test_estimate_for_found_score() {
        let estimate = ViralEstimate::from_parse(ScoreParse::Found(73), &EstimateConfig::default());
        assert_eq!(estimate.score, 73);
        assert_eq!(estimate.streams, sigmoid_scale(73, CEILING));
        assert!((estimate.revenue - estimate.streams as f64 * 0.004).abs() < 1e-6);
        assert_eq!(estimate.source, ScoreSource::Extracted);
    }

    #[test]
    fn test_estimate_default_score() {
        let estimate = ViralEstimate::from_parse(ScoreParse::NotFound, &EstimateConfig::default());
        assert_eq!(estimate.score, 50);
        assert_eq!(estimate.streams, 50_000_000);
        assert!((estimate.revenue - 200_000.0).abs() < 1e-6);
        assert_eq!(estimate.source, ScoreSource::Default);
    }

    #[test]
    fn test_out_of_range_score_clamped_by_default() {
        let estimate = ViralEstimate::from_parse(ScoreParse::Found(250), &EstimateConfig::default());
        assert_eq!(estimate.score, 100);
        assert_eq!(estimate.streams, sigmoid_scale(100, CEILING));
    }

    #[test]
    fn test_out_of_range_score_passthrough() {
        let config = EstimateConfig {
            clamp_score: false,
            ..EstimateConfig::default()
        };
        let estimate = ViralEstimate::from_parse(ScoreParse::Found(250), &config);
        assert_eq!(estimate.score, 250);
        assert!(estimate.streams > sigmoid_scale(100, CEILING));
        assert!(estimate.streams <= CEILING);
    }
}
