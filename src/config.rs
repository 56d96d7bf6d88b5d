//! Application configuration
//!
//! Non-secret settings are embedded from `config.toml` at build time.
//! Secrets (API keys and endpoint URLs) are read from the environment,
//! optionally populated from a `.env` file via dotenvy in `main`.
//!
//! Missing secrets are not fatal at startup: the affected remote call
//! fails at request time with an authorization or network error instead.

use crate::error::ConfigError;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;
use zeroize::Zeroize;

/// Non-secret application settings (embedded `config.toml`)
#[derive(Debug, Deserialize)]
pub struct Settings {
    pub gesture: GestureSettings,
    pub session: SessionSettings,
}

#[derive(Debug, Deserialize)]
pub struct GestureSettings {
    /// A press held at least this long becomes a recording
    pub hold_threshold_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct SessionSettings {
    /// Pause between stopping a recording and surfacing the transcript
    pub transcript_display_delay_ms: u64,
}

impl Settings {
    /// Parse settings from the embedded TOML document
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn hold_threshold(&self) -> Duration {
        Duration::from_millis(self.gesture.hold_threshold_ms)
    }

    pub fn transcript_display_delay(&self) -> Duration {
        Duration::from_millis(self.session.transcript_display_delay_ms)
    }
}

/// Secrets and endpoint URLs supplied via the environment
///
/// Keys are cleared from memory on drop. Clients copy what they need
/// at construction and are responsible for their own copies.
#[derive(Debug, Default)]
pub struct Secrets {
    /// Generative-language API key (`GEMINI_KEY`)
    pub gemini_key: String,
    /// Generative-language endpoint URL (`GEMINI_URL`)
    pub gemini_url: String,
    /// Speech-to-text API key (`WHISPER_KEY`)
    pub whisper_key: String,
    /// Speech-to-text endpoint URL (`WHISPER_URL`)
    pub whisper_url: String,
    /// Auth provider base URL (`SUPABASE_URL`)
    pub auth_url: String,
    /// Auth provider anon key (`SUPABASE_ANON_KEY`)
    pub auth_anon_key: String,
}

impl Secrets {
    /// Read secrets from the environment, defaulting to empty strings
    pub fn from_env() -> Self {
        let secrets = Self {
            gemini_key: env_or_empty("GEMINI_KEY"),
            gemini_url: env_or_empty("GEMINI_URL"),
            whisper_key: env_or_empty("WHISPER_KEY"),
            whisper_url: env_or_empty("WHISPER_URL"),
            auth_url: env_or_empty("SUPABASE_URL"),
            auth_anon_key: env_or_empty("SUPABASE_ANON_KEY"),
        };

        if secrets.gemini_key.is_empty() || secrets.gemini_url.is_empty() {
            warn!("GEMINI_KEY/GEMINI_URL not set; chat requests will fail");
        }
        if secrets.whisper_key.is_empty() || secrets.whisper_url.is_empty() {
            warn!("WHISPER_KEY/WHISPER_URL not set; transcription will fail");
        }

        secrets
    }
}

fn env_or_empty(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}

impl Drop for Secrets {
    fn drop(&mut self) {
        self.gemini_key.zeroize();
        self.whisper_key.zeroize();
        self.auth_anon_key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_settings_parse() {
        let settings = Settings::from_toml(include_str!("../config.toml"))
            .expect("embedded config.toml must parse");
        assert_eq!(settings.gesture.hold_threshold_ms, 2000);
        assert_eq!(settings.session.transcript_display_delay_ms, 500);
    }

    #[test]
    fn test_settings_durations() {
        let settings = Settings::from_toml(
            "[gesture]\nhold_threshold_ms = 1500\n[session]\ntranscript_display_delay_ms = 250\n",
        )
        .expect("settings must parse");
        assert_eq!(settings.hold_threshold(), Duration::from_millis(1500));
        assert_eq!(settings.transcript_display_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_malformed_settings_rejected() {
        assert!(Settings::from_toml("[gesture]\nhold_threshold_ms = \"soon\"").is_err());
    }
}
