// SYNOID Montage Configuration
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Settings come from the environment (optionally a `.env` file loaded by
// `main`). CLI flags override individual fields.

use std::env;

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_STORY_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_VOICE: &str = "Zephyr";

/// The TTS endpoint returns raw 16-bit PCM at this rate, single channel.
pub const NARRATION_SAMPLE_RATE: u32 = 24_000;
pub const NARRATION_CHANNELS: u16 = 1;

#[derive(Debug, Clone)]
pub struct MontageConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub story_model: String,
    pub tts_model: String,
    pub voice: String,
    pub story_temperature: f32,
    pub story_max_tokens: u32,
    pub story_thinking_budget: u32,
}

impl Default for MontageConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_GEMINI_URL.to_string(),
            story_model: DEFAULT_STORY_MODEL.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            story_temperature: 0.8,
            story_max_tokens: 250,
            story_thinking_budget: 50,
        }
    }
}

impl MontageConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            api_key: get("GEMINI_API_KEY").or_else(|| get("API_KEY")),
            api_url: get("SYNOID_GEMINI_URL").unwrap_or(defaults.api_url),
            story_model: get("SYNOID_STORY_MODEL").unwrap_or(defaults.story_model),
            tts_model: get("SYNOID_TTS_MODEL").unwrap_or(defaults.tts_model),
            voice: get("SYNOID_TTS_VOICE").unwrap_or(defaults.voice),
            ..defaults
        }
    }
}
