//! Auth provider client
//!
//! Thin client over the hosted auth provider's token endpoints. The
//! rest of the application treats it purely as an opaque session-token
//! source: sign in, sign up, sign out, read the current session, and
//! subscribe to state changes. The provider's wider protocol is not
//! implemented here.

use crate::error::ApiError;
use crate::storage;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};
use zeroize::Zeroize;

/// An authenticated session as cached locally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub email: String,
}

/// Auth state changes published to subscribers
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn { email: String },
    SignedOut,
}

/// Wire shape of the provider's token/signup responses
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    email: String,
}

#[derive(Debug, Serialize)]
struct CredentialsRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Client for the hosted auth provider
pub struct AuthClient {
    base_url: String,
    anon_key: String,
    client: reqwest::Client,
    session: Option<Session>,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthClient {
    pub fn new(base_url: &str, anon_key: &str) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client for AuthClient")?;

        let (events, _) = broadcast::channel(16);
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            client,
            session: None,
            events,
        })
    }

    /// Subscribe to auth state changes
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// The current session, if signed in
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Restore a cached session from disk, if one exists
    pub fn restore(&mut self) {
        if let Some(session) = storage::load_session() {
            info!("Restored cached session for {}", session.email);
            let email = session.email.clone();
            self.session = Some(session);
            let _ = self.events.send(AuthEvent::SignedIn { email });
        }
    }

    /// Sign in with email and password
    #[instrument(skip(self, password))]
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Session, ApiError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        let token = self.credentials_request(&url, email, password).await?;
        Ok(self.store_session(token))
    }

    /// Create an account and sign in
    #[instrument(skip(self, password))]
    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<Session, ApiError> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        let token = self.credentials_request(&url, email, password).await?;
        Ok(self.store_session(token))
    }

    /// Sign out and drop the cached session
    ///
    /// The server-side revocation is best-effort; the local session is
    /// cleared regardless.
    pub async fn sign_out(&mut self) {
        if let Some(session) = self.session.take() {
            let url = format!("{}/auth/v1/logout", self.base_url);
            let result = self
                .client
                .post(&url)
                .header("apikey", &self.anon_key)
                .header(
                    "Authorization",
                    format!("Bearer {}", session.access_token),
                )
                .send()
                .await;
            if let Err(e) = result {
                warn!("Sign-out request failed: {}", e);
            }
        }

        if let Err(e) = storage::clear_session() {
            warn!("Failed to clear cached session: {}", e);
        }
        let _ = self.events.send(AuthEvent::SignedOut);
        info!("Signed out");
    }

    async fn credentials_request(
        &self,
        url: &str,
        email: &str,
        password: &str,
    ) -> Result<TokenResponse, ApiError> {
        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .header("Content-Type", "application/json")
            .json(&CredentialsRequest { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Server { status, message });
        }

        response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse auth response: {}", e))
        })
    }

    fn store_session(&mut self, token: TokenResponse) -> Session {
        let session = Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            user_id: token.user.id,
            email: token.user.email,
        };

        if let Err(e) = storage::save_session(&session) {
            warn!("Failed to cache session: {}", e);
        }

        info!("Signed in as {}", session.email);
        self.session = Some(session.clone());
        let _ = self.events.send(AuthEvent::SignedIn {
            email: session.email.clone(),
        });
        session
    }
}

impl Drop for AuthClient {
    fn drop(&mut self) {
        self.anon_key.zeroize();
        if let Some(ref mut session) = self.session {
            session.access_token.zeroize();
            session.refresh_token.zeroize();
        }
    }
}
