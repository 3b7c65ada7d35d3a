// SYNOID Gemini Bridge
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Story and speech generation over the Gemini `generateContent` REST API.

use crate::config::MontageConfig;
use crate::generation::audio::NarrationAudio;
use crate::generation::{GenerationError, NarrationFailure};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
    pub finish_message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub text: Option<String>,
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: Option<String>,
    pub data: Option<String>,
}

impl GenerateContentResponse {
    fn first_candidate(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    /// Concatenated text of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.first_candidate()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        Some(text)
    }

    fn finish_details(&self, fallback: &str, reason_label: &str) -> String {
        let candidate = self.first_candidate();
        let reason = candidate.and_then(|c| c.finish_reason.as_deref());
        let message = candidate.and_then(|c| c.finish_message.as_deref());

        let mut details = match reason {
            Some(r) => format!("{} {}.", reason_label, r),
            None => fallback.to_string(),
        };
        if let Some(m) = message {
            details.push_str(&format!(" Message: {}.", m));
        }
        details
    }
}

pub fn story_prompt(prompt: &str) -> String {
    format!(
        "Generate a very short story, about 50-70 words, based on this prompt: \"{}\"",
        prompt
    )
}

/// Pull the story out of a response, or explain why there is none.
pub fn extract_story(response: &GenerateContentResponse) -> Result<String, GenerationError> {
    match response.text() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(GenerationError::Blocked(response.finish_details(
            "The API response did not contain a story.",
            "Story generation stopped. Reason:",
        ))),
    }
}

/// Pull the base64 audio payload out of a speech response.
pub fn extract_speech(response: &GenerateContentResponse) -> Result<String, GenerationError> {
    let data = response
        .first_candidate()
        .and_then(|c| c.content.as_ref())
        .and_then(|c| c.parts.first())
        .and_then(|p| p.inline_data.as_ref())
        .and_then(|d| d.data.as_deref())
        .filter(|d| !d.is_empty());

    match data {
        Some(d) => Ok(d.to_string()),
        None => Err(GenerationError::Blocked(response.finish_details(
            "The response did not contain audio data.",
            "Finish reason:",
        ))),
    }
}

pub struct GeminiClient {
    client: reqwest::Client,
    config: MontageConfig,
}

impl GeminiClient {
    pub fn new(config: MontageConfig) -> Result<Self, GenerationError> {
        if config.api_key.is_none() {
            return Err(GenerationError::MissingApiKey);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            config,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_url.trim_end_matches('/'),
            model
        )
    }

    async fn generate(&self, model: &str, payload: Value) -> Result<GenerateContentResponse, GenerationError> {
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        let resp = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("[GEMINI] {} returned {}: {}", model, status, body);
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.json::<GenerateContentResponse>().await?)
    }

    pub async fn generate_story(&self, prompt: &str) -> Result<String, GenerationError> {
        info!("[GEMINI] Generating story with {}: {}", self.config.story_model, prompt);

        let payload = json!({
            "contents": [{ "parts": [{ "text": story_prompt(prompt) }] }],
            "generationConfig": {
                "temperature": self.config.story_temperature,
                "maxOutputTokens": self.config.story_max_tokens,
                "thinkingConfig": { "thinkingBudget": self.config.story_thinking_budget }
            }
        });

        let response = self.generate(&self.config.story_model, payload).await?;
        let story = extract_story(&response).map_err(|e| {
            error!("[GEMINI] Story generation failed. Full response: {:?}", response);
            e
        })?;
        info!("[GEMINI] Story ready ({} words)", story.split_whitespace().count());
        Ok(story)
    }

    pub async fn generate_speech(&self, text: &str) -> Result<NarrationAudio, GenerationError> {
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyText);
        }
        info!(
            "[GEMINI] Synthesizing speech with {} (voice {})",
            self.config.tts_model, self.config.voice
        );

        let payload = json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.config.voice }
                    }
                }
            }
        });

        let response = self.generate(&self.config.tts_model, payload).await?;
        let data = extract_speech(&response).map_err(|e| {
            error!("[GEMINI] Audio generation failed. Full response: {:?}", response);
            e
        })?;
        let audio = NarrationAudio::from_base64_pcm(&data)?;
        info!("[GEMINI] Narration ready: {:.2}s", audio.duration_secs());
        Ok(audio)
    }

    /// Story first, then its narration. A speech failure still hands back the story.
    pub async fn generate_narration(&self, prompt: &str) -> Result<(String, NarrationAudio), NarrationFailure> {
        let story = self.generate_story(prompt).await?;
        match self.generate_speech(&story).await {
            Ok(audio) => Ok((story, audio)),
            Err(source) => Err(NarrationFailure {
                story: Some(story),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_extract_story_text() {
        let response = parse(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Once upon a time" }, { "text": ", the end." }] },
                "finishReason": "STOP"
            }]
        }));
        assert_eq!(extract_story(&response).unwrap(), "Once upon a time, the end.");
    }

    #[test]
    fn test_blocked_story_reports_reason() {
        let response = parse(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "   " }] },
                "finishReason": "SAFETY",
                "finishMessage": "blocked by policy"
            }]
        }));
        let err = extract_story(&response).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Story generation stopped. Reason: SAFETY. Message: blocked by policy."
        );

        let err = extract_story(&parse(json!({}))).unwrap_err();
        assert_eq!(err.to_string(), "The API response did not contain a story.");
    }

    #[test]
    fn test_extract_speech_payload() {
        let response = parse(json!({
            "candidates": [{
                "content": { "parts": [{ "inlineData": { "mimeType": "audio/L16;rate=24000", "data": "AAAA" } }] }
            }]
        }));
        assert_eq!(extract_speech(&response).unwrap(), "AAAA");

        let missing = parse(json!({ "candidates": [{ "finishReason": "OTHER" }] }));
        assert_eq!(
            extract_speech(&missing).unwrap_err().to_string(),
            "Finish reason: OTHER."
        );
    }

    #[test]
    fn test_story_prompt_wording() {
        assert_eq!(
            story_prompt("a lost robot"),
            "Generate a very short story, about 50-70 words, based on this prompt: \"a lost robot\""
        );
    }

    #[test]
    fn test_client_requires_api_key() {
        let config = MontageConfig::default();
        assert!(matches!(GeminiClient::new(config), Err(GenerationError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected_before_any_request() {
        let config = MontageConfig {
            api_key: Some("test".to_string()),
            api_url: "http://127.0.0.1:9".to_string(),
            ..MontageConfig::default()
        };
        let client = GeminiClient::new(config).unwrap();
        let err = client.generate_speech("  \n").await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot generate speech from empty text.");
    }

    #[tokio::test]
    async fn test_narration_without_story_has_no_story() {
        let config = MontageConfig {
            api_key: Some("test".to_string()),
            api_url: "http://127.0.0.1:9".to_string(),
            ..MontageConfig::default()
        };
        let client = GeminiClient::new(config).unwrap();
        let failure = client.generate_narration("a lost robot").await.unwrap_err();
        assert!(failure.story.is_none());
        assert!(matches!(failure.source, GenerationError::Http(_)));
    }
}
