//! Interaction orchestrator
//!
//! Sequences user intent into the recorder, transcription client, and
//! chat flow, and publishes observable state changes over a broadcast
//! channel. Presentation subscribes to the events; it never reaches
//! into the orchestrator's state.

use crate::chat::{ChatSession, Message};
use crate::config::Settings;
use crate::error::ApiError;
use crate::genai::GenAiClient;
use crate::gesture::{GestureEvent, HoldGesture};
use crate::recorder::Recorder;
use crate::transcription::TranscriptionClient;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Observable state changes published by the orchestrator
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Microphone capture began
    ListeningStarted,
    /// Microphone capture ended
    ListeningStopped,
    /// Transcript of the finished take is ready for display
    TranscriptReady(String),
    /// A short press asked for the conversation screen
    NavigateToChat,
    /// A message was appended to the conversation
    MessageAppended(Message),
    /// The outstanding-request flag changed
    LoadingChanged(bool),
}

/// Screen-level logic tying gesture, recorder, transcription, and chat
/// together
pub struct Orchestrator {
    recorder: Recorder,
    transcriber: TranscriptionClient,
    genai: GenAiClient,
    chat: ChatSession,
    gesture: HoldGesture,
    transcript_display_delay: Duration,
    events: broadcast::Sender<SessionEvent>,
}

impl Orchestrator {
    pub fn new(
        recorder: Recorder,
        transcriber: TranscriptionClient,
        genai: GenAiClient,
        settings: &Settings,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            recorder,
            transcriber,
            genai,
            chat: ChatSession::new(),
            gesture: HoldGesture::new(settings.hold_threshold()),
            transcript_display_delay: settings.transcript_display_delay(),
            events,
        }
    }

    /// Subscribe to orchestrator events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Finger down on the talk control
    pub fn press(&mut self, now: Instant) {
        self.gesture.press(now);
    }

    /// Advance the hold timer; starts recording when the hold arms
    pub fn tick(&mut self, now: Instant) {
        if self.gesture.tick(now) == Some(GestureEvent::HoldBegan) {
            if self.recorder.start_recording() {
                self.emit(SessionEvent::ListeningStarted);
            } else {
                warn!("Hold armed but recording could not start");
            }
        }
    }

    /// Finger up: dispatches to tap navigation or stop-and-transcribe
    pub async fn release(&mut self, now: Instant) {
        match self.gesture.release(now) {
            Some(GestureEvent::Tap) => {
                info!("Short press; navigating to chat");
                self.emit(SessionEvent::NavigateToChat);
            }
            Some(GestureEvent::HoldEnded) => {
                self.emit(SessionEvent::ListeningStopped);
                let result = self.recorder.stop_and_transcribe(&self.transcriber).await;
                if result.success {
                    // Brief pause so the stop is visible before the text lands.
                    tokio::time::sleep(self.transcript_display_delay).await;
                    self.emit(SessionEvent::TranscriptReady(
                        result.transcription.unwrap_or_default(),
                    ));
                } else if let Some(error) = result.error {
                    warn!("Stop recording failed: {}", error);
                }
            }
            Some(GestureEvent::HoldBegan) | None => {}
        }
    }

    /// Discard any active recording without transcribing
    pub fn cancel_recording(&mut self) -> bool {
        let _ = self.gesture.release(Instant::now());
        let was_listening = self.recorder.is_recording();
        let cancelled = self.recorder.cancel_recording();
        if cancelled && was_listening {
            self.emit(SessionEvent::ListeningStopped);
        }
        cancelled
    }

    /// Send a typed prompt through the conversational flow
    ///
    /// No-op if the prompt is blank or a request is outstanding.
    pub async fn send_text(&mut self, text: &str) {
        let Some(user_message) = self.chat.begin_send(text) else {
            return;
        };
        self.emit(SessionEvent::MessageAppended(user_message.clone()));
        self.emit(SessionEvent::LoadingChanged(true));

        let reply = match self.genai.complete(&user_message.text).await {
            Ok(response) => match response.first_text() {
                Some(reply_text) => Ok(reply_text.to_string()),
                None => Err(ApiError::InvalidResponse(
                    "no candidates in response".to_string(),
                )),
            },
            Err(e) => Err(e),
        };

        if let Err(ref e) = reply {
            error!("Generative request failed: {}", e);
        }

        let assistant_message = self.chat.finish_send(reply);
        self.emit(SessionEvent::MessageAppended(assistant_message));
        self.emit(SessionEvent::LoadingChanged(false));
    }

    /// Conversation history, oldest first
    pub fn messages(&self) -> &[Message] {
        self.chat.messages()
    }

    /// Whether the microphone is live
    pub fn is_listening(&self) -> bool {
        self.recorder.is_recording()
    }

    fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine; events are advisory.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::FALLBACK_REPLY;

    fn test_orchestrator() -> Orchestrator {
        let settings = Settings::from_toml(
            "[gesture]\nhold_threshold_ms = 2000\n[session]\ntranscript_display_delay_ms = 0\n",
        )
        .expect("settings");
        let transcriber =
            TranscriptionClient::new("", "").expect("transcription client should build");
        let genai = GenAiClient::new("", "").expect("genai client should build");
        Orchestrator::new(Recorder::new(), transcriber, genai, &settings)
    }

    fn drain(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_short_press_navigates_instead_of_recording() {
        let mut orchestrator = test_orchestrator();
        let mut rx = orchestrator.subscribe();

        let t0 = Instant::now();
        orchestrator.press(t0);
        orchestrator.tick(t0 + Duration::from_millis(400));
        orchestrator.release(t0 + Duration::from_millis(500)).await;

        let events = drain(&mut rx);
        assert!(matches!(events.as_slice(), [SessionEvent::NavigateToChat]));
        assert!(!orchestrator.is_listening());
    }

    #[tokio::test]
    async fn test_release_without_press_does_nothing() {
        let mut orchestrator = test_orchestrator();
        let mut rx = orchestrator.subscribe();

        orchestrator.release(Instant::now()).await;

        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_cancel_without_recording_is_noop_success() {
        let mut orchestrator = test_orchestrator();
        assert!(orchestrator.cancel_recording());
        assert!(!orchestrator.is_listening());
    }

    #[tokio::test]
    async fn test_failed_request_appends_fallback_and_clears_loading() {
        // The client has no endpoint configured, so the request fails
        // at send time; the user sees the fixed apology.
        let mut orchestrator = test_orchestrator();
        let mut rx = orchestrator.subscribe();

        orchestrator.send_text("Oi").await;

        let messages = orchestrator.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "Oi");
        assert!(messages[0].is_user);
        assert_eq!(messages[1].text, FALLBACK_REPLY);
        assert!(!messages[1].is_user);

        let events = drain(&mut rx);
        assert!(matches!(
            events.as_slice(),
            [
                SessionEvent::MessageAppended(_),
                SessionEvent::LoadingChanged(true),
                SessionEvent::MessageAppended(_),
                SessionEvent::LoadingChanged(false),
            ]
        ));
    }

    #[tokio::test]
    async fn test_blank_prompt_is_ignored() {
        let mut orchestrator = test_orchestrator();
        let mut rx = orchestrator.subscribe();

        orchestrator.send_text("   ").await;

        assert!(orchestrator.messages().is_empty());
        assert!(drain(&mut rx).is_empty());
    }
}
