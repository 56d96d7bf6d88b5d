//! Generative-language client
//!
//! Sends a text prompt to the configured generative-language endpoint
//! and returns the full structured response. Unlike transcription, a
//! failure here propagates to the caller; the orchestrator turns it
//! into a user-visible fallback message.
//!
//! One attempt per call: no retry, no backoff.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;
use zeroize::Zeroize;

/// Client for the generative-language API
pub struct GenAiClient {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

/// Request body wrapping the prompt in the endpoint's nested shape
#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

/// One text part of a content block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// Parsed response from the generative-language endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct GenerativeResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default, rename = "promptFeedback")]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// One generated-text alternative
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: CandidateContent,
    #[serde(default, rename = "finishReason")]
    pub finish_reason: Option<FinishReason>,
    #[serde(default)]
    pub index: u32,
    #[serde(default, rename = "safetyRatings")]
    pub safety_ratings: Vec<SafetyRating>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    Stop,
    MaxTokens,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SafetyRating {
    pub category: String,
    pub probability: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptFeedback {
    #[serde(default, rename = "safetyRatings")]
    pub safety_ratings: Vec<SafetyRating>,
}

impl GenerativeResponse {
    /// The first candidate's first text part, if any
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.parts.first())
            .map(|part| part.text.as_str())
    }
}

impl GenAiClient {
    /// Create a new generative-language client
    pub fn new(api_key: &str, endpoint: &str) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client for GenAiClient")?;

        Ok(Self {
            api_key: api_key.to_string(),
            endpoint: endpoint.to_string(),
            client,
        })
    }

    /// Send a prompt and return the full parsed response
    ///
    /// Non-2xx statuses surface as `ApiError::Server` with the status
    /// code and response body.
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    pub async fn complete(&self, prompt: &str) -> Result<GenerativeResponse, ApiError> {
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Server { status, message });
        }

        response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse generative response: {}", e))
        })
    }
}

impl Drop for GenAiClient {
    fn drop(&mut self) {
        // Clear API key from memory
        self.api_key.zeroize();
    }
}
