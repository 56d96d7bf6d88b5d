//! Conversation state
//!
//! Holds the append-only message history and the send-flow flags for
//! one chat session. The state transitions live here, separate from the
//! HTTP client, so the exchange flow can be exercised without I/O.

use crate::error::ApiError;
use chrono::Utc;
use serde::Serialize;

/// Fixed reply appended when the generative request fails
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error processing your request.";

/// One turn in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Unique id derived from capture time (epoch millis)
    pub id: String,
    pub text: String,
    pub is_user: bool,
}

/// Append-only conversation history plus send-flow state
///
/// At most one request is outstanding at a time: `begin_send` refuses
/// while `loading` is set, so assistant replies can never interleave.
pub struct ChatSession {
    messages: Vec<Message>,
    loading: bool,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            loading: false,
        }
    }

    /// Messages in insertion (= chronological = display) order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether a generative request is outstanding
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Begin a send: append the user message and mark loading
    ///
    /// Returns `None` without touching state when the prompt is blank
    /// or a request is already outstanding.
    pub fn begin_send(&mut self, text: &str) -> Option<Message> {
        if text.trim().is_empty() || self.loading {
            return None;
        }

        let message = Message {
            id: Utc::now().timestamp_millis().to_string(),
            text: text.to_string(),
            is_user: true,
        };
        self.messages.push(message.clone());
        self.loading = true;
        Some(message)
    }

    /// Finish a send: append the assistant reply and clear loading
    ///
    /// A failed request appends the fixed fallback reply instead. The
    /// reply id is offset by one so it stays distinct from a user
    /// message captured in the same instant.
    pub fn finish_send(&mut self, reply: Result<String, ApiError>) -> Message {
        let text = reply.unwrap_or_else(|_| FALLBACK_REPLY.to_string());
        let message = Message {
            id: (Utc::now().timestamp_millis() + 1).to_string(),
            text,
            is_user: false,
        };
        self.messages.push(message.clone());
        self.loading = false;
        message
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}
