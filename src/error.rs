use thiserror::Error;

/// Errors from the remote HTTP services (transcription, generative
/// language, auth provider)
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to read audio asset: {0}")]
    Asset(#[from] std::io::Error),

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Service reported error: {0}")]
    Service(String),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse settings: {0}")]
    Toml(#[from] toml::de::Error),
}
