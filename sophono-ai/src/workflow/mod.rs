//! End-to-end workflows for the two invocation paths

pub mod lyrics_analyzer;
pub mod song_analyzer;

pub use lyrics_analyzer::LyricsAnalyzer;
pub use song_analyzer::{analyze_song, SongAnalysis, SongAnalyzer, SongReport};
