//! HTTP API handlers for sophono-ai

pub mod health;
pub mod lyrics;
pub mod music;

pub use health::health_routes;
pub use lyrics::lyrics_routes;
pub use music::music_routes;
