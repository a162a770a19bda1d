//! sophono-analyze - command-line front end
//!
//! `sophono-analyze music <PATH>` prints the acoustic features, the viral
//! trend report, the collaborator's assessment and the stream/revenue
//! estimate. `sophono-analyze lyrics` prints the lyrics assessment.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sophono_ai::analysis::{AcousticFeatures, ViralHeuristicResult};
use sophono_ai::services::prompt::MFCC_GUIDE;
use sophono_ai::services::{ChatCompletionsClient, EstimateConfig, GenerationOptions, TextGenerator};
use sophono_ai::workflow::song_analyzer::analyze_blocking;
use sophono_ai::workflow::{LyricsAnalyzer, SongAnalyzer, SongReport};
use sophono_common::config::{load_config, resolve_api_key};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sophono-analyze")]
#[command(about = "Score the viral potential of a song or its lyrics")]
#[command(version)]
struct Args {
    /// Config file (overrides SOPHONO_CONFIG and the platform default)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze an audio file
    Music {
        /// Audio file (MP3, WAV, FLAC, OGG, ...)
        path: PathBuf,

        /// Stop after feature extraction; no collaborator call
        #[arg(long)]
        features_only: bool,

        /// Resample to this rate before analysis
        #[arg(long, value_name = "HZ")]
        sample_rate: Option<u32>,
    },
    /// Analyze song lyrics
    Lyrics {
        /// Lyrics text
        #[arg(conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,

        /// Read lyrics from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Diagnostics go to stderr; stdout carries the report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sophono_ai=warn,sophono_common=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    match args.command {
        Command::Music {
            path,
            features_only,
            sample_rate,
        } => {
            let analysis = analyze_blocking(path, sample_rate).await?;

            print_features(&analysis.acoustic_features);
            print_trend_report(&analysis.viral_analysis);

            if features_only {
                return Ok(());
            }

            let generator = generator(&config);
            let analyzer = SongAnalyzer::new(
                generator,
                GenerationOptions::music(&config.collaborator),
                EstimateConfig::from(&config.estimate),
            );

            println!("\nGenerating final analysis...");
            let report = analyzer.assess(analysis).await?;
            print_song_report(&report);
        }
        Command::Lyrics { text, file } => {
            let lyrics = match (text, file) {
                (Some(text), _) => text,
                (None, Some(file)) => std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read lyrics from {}", file.display()))?,
                (None, None) => bail!("Provide lyrics text or --file"),
            };

            let analyzer = LyricsAnalyzer::new(
                generator(&config),
                GenerationOptions::lyrics(&config.collaborator),
            );
            let analysis = analyzer.analyze(&lyrics).await?;

            println!("\n=== Lyrics Analysis ===");
            println!("{}", analysis);
        }
    }

    Ok(())
}

fn generator(config: &sophono_common::config::TomlConfig) -> Arc<dyn TextGenerator> {
    let api_key = resolve_api_key(&config.collaborator);
    Arc::new(ChatCompletionsClient::from_config(&config.collaborator, api_key))
}

fn print_features(features: &AcousticFeatures) {
    println!("\n=== Acoustic Features ===");
    println!("Tempo: {:.1} BPM", features.tempo);
    println!("Spectral Centroid: {:.2} (brightness)", features.spectral_centroid);
    println!("Zero Crossing Rate: {:.4} (noisiness)", features.zero_crossing_rate);
    println!("RMS Energy: {:.4} (loudness)", features.rms);

    println!("\nMFCC Coefficients:");
    for (i, ((label, _), value)) in MFCC_GUIDE.iter().zip(&features.mfcc).enumerate() {
        println!("MFCC {} ({}): {:.4}", i + 1, label, value);
    }
}

fn print_trend_report(viral: &ViralHeuristicResult) {
    println!("\n=== Viral Trend Analysis ===");
    println!(
        "1. Tempo: {:.1} BPM ({})",
        viral.tempo,
        if viral.tempo_passed() { "Good" } else { "Outside ideal range" }
    );
    println!(
        "2. Energy: {:.2} ({})",
        viral.energy,
        if viral.energy_passed() { "Strong" } else { "Weak" }
    );
    println!(
        "3. Repetition: {} segments ({})",
        viral.segments,
        if viral.repetition_passed() { "Good" } else { "Too varied" }
    );
    println!("4. 15s Highlight: {}", viral.highlight_check);
    println!("\nViral Potential Score: {}/4", viral.score);
}

fn print_song_report(report: &SongReport) {
    println!("\n=== Final Analysis ===");
    println!("{}", report.assessment);

    println!("\n=== Estimate ===");
    println!("Analysis Score: {}/100", report.estimate.score);
    println!("Potential Streams: {}", group_thousands(report.estimate.streams));
    println!("Potential Revenue: $ {}", format_money(report.estimate.revenue));
}

/// `1234567` → `"1,234,567"`
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Two decimals with grouped whole part
fn format_money(amount: f64) -> String {
    let cents = (amount * 100.0).round().max(0.0) as u64;
    format!("{}.{:02}", group_thousands(cents / 100), cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(50_000_000), "50,000,000");
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(200_000.0), "200,000.00");
        assert_eq!(format_money(2677.14), "2,677.14");
    }
}
