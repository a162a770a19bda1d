//! Services: prompt rendering, collaborator client, score extraction

pub mod prompt;
pub mod score;
pub mod text_generator;

pub use prompt::{lyrics_prompt, music_prompt};
pub use score::{extract_final_score, sigmoid_scale, EstimateConfig, ScoreParse, ViralEstimate};
pub use text_generator::{
    ChatCompletionsClient, GenerationOptions, GenerationRequest, LlmError, TextGenerator,
};
