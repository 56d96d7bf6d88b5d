//! Speech-to-text client
//!
//! Uploads a finished WAV take to the configured transcription endpoint
//! and extracts the recognized text.
//!
//! The request path is `Result`-based internally; the public
//! `transcribe` wrapper converts every failure into an empty string so
//! callers always have a displayable transcript. This is the one place
//! that sentinel conversion happens.

use crate::error::ApiError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument, warn};
use zeroize::Zeroize;

/// Client for the speech-to-text upload endpoint
pub struct TranscriptionClient {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

/// Response from the transcription endpoint
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: Option<String>,
    error: Option<String>,
}

impl TranscriptionClient {
    /// Create a new transcription client
    pub fn new(api_key: &str, endpoint: &str) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client for TranscriptionClient")?;

        Ok(Self {
            api_key: api_key.to_string(),
            endpoint: endpoint.to_string(),
            client,
        })
    }

    /// Transcribe a recorded take, returning empty text on any failure
    ///
    /// An empty asset path short-circuits to an empty transcript.
    pub async fn transcribe(&self, asset: &Path) -> String {
        if asset.as_os_str().is_empty() {
            warn!("Empty asset path; skipping transcription");
            return String::new();
        }

        match self.request_transcript(asset).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Transcription failed: {}", e);
                String::new()
            }
        }
    }

    /// Upload the asset bytes and parse the recognized text
    #[instrument(skip(self), fields(asset = %asset.display()))]
    async fn request_transcript(&self, asset: &Path) -> Result<String, ApiError> {
        let bytes = tokio::fs::read(asset).await?;
        info!("Uploading {} bytes for transcription", bytes.len());

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "audio/wav")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Server { status, message });
        }

        let parsed: TranscriptionResponse = response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse transcription response: {}", e))
        })?;

        extract_text(parsed)
    }
}

/// Map the `{text?, error?}` response shape to a transcript
///
/// A missing `text` with no `error` counts as "the service heard
/// nothing" and yields an empty transcript.
fn extract_text(response: TranscriptionResponse) -> Result<String, ApiError> {
    if let Some(error) = response.error {
        return Err(ApiError::Service(error));
    }
    Ok(response.text.unwrap_or_default())
}

impl Drop for TranscriptionClient {
    fn drop(&mut self) {
        // Clear API key from memory
        self.api_key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> TranscriptionResponse {
        serde_json::from_str(json).expect("Failed to deserialize")
    }

    #[test]
    fn test_text_field_is_returned() {
        let text = extract_text(parse(r#"{"text":"hello"}"#)).expect("text expected");
        assert_eq!(text, "hello");
    }

    #[test]
    fn test_error_field_is_an_error() {
        let result = extract_text(parse(r#"{"error":"bad audio"}"#));
        assert!(matches!(result, Err(ApiError::Service(ref e)) if e == "bad audio"));
    }

    #[test]
    fn test_neither_field_yields_empty_text() {
        let text = extract_text(parse(r#"{}"#)).expect("empty text expected");
        assert_eq!(text, "");
    }

    #[test]
    fn test_malformed_response_rejected() {
        assert!(serde_json::from_str::<TranscriptionResponse>("not json").is_err());
    }

    #[tokio::test]
    async fn test_empty_asset_path_returns_empty_string() {
        let client = TranscriptionClient::new("key", "https://example.invalid/stt")
            .expect("client should build");
        assert_eq!(client.transcribe(Path::new("")).await, "");
    }

    #[tokio::test]
    async fn test_missing_asset_returns_empty_string() {
        let client = TranscriptionClient::new("key", "https://example.invalid/stt")
            .expect("client should build");
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.wav");
        assert_eq!(client.transcribe(&missing).await, "");
    }
}
