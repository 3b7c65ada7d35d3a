// SYNOID Narration Generation
// Copyright (c) 2026 Xing_The_Creator | SYNOID

pub mod audio;
pub mod gemini;

pub use audio::NarrationAudio;
pub use gemini::GeminiClient;

use thiserror::Error;

/// Failures from the story and speech collaborators. Messages are shown to
/// the user verbatim; nothing is retried.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("No API key configured. Set GEMINI_API_KEY (or API_KEY).")]
    MissingApiKey,

    #[error("Cannot generate speech from empty text.")]
    EmptyText,

    #[error("{0}")]
    Blocked(String),

    #[error("Gemini API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Gemini connection failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Could not decode speech audio: {0}")]
    Decode(String),
}

/// A story-then-speech run that failed. `story` is set when the story was
/// produced and only speech synthesis failed.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct NarrationFailure {
    pub story: Option<String>,
    pub source: GenerationError,
}

impl From<GenerationError> for NarrationFailure {
    fn from(source: GenerationError) -> Self {
        Self { story: None, source }
    }
}
