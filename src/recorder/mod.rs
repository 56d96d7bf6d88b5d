//! Recording session management module
//!
//! Owns the lifecycle of the single microphone recording: start, stop,
//! cancel. A session moves `Idle -> Listening -> Idle`; a second start
//! while listening is rejected, not queued.
//!
//! Platform failures (no device, stream errors, filesystem errors) are
//! caught and logged here; callers only ever observe booleans and
//! `RecordingResult` flags.

mod wav;

use crate::audio::{self, AudioChunk};
use crate::transcription::TranscriptionClient;
use chrono::Local;
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Outcome of stopping a recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingResult {
    pub success: bool,
    /// Location of the finished WAV take
    pub uri: Option<PathBuf>,
    pub error: Option<String>,
    /// Populated by `stop_and_transcribe` on success
    pub transcription: Option<String>,
}

impl RecordingResult {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            uri: None,
            error: Some(error.into()),
            transcription: None,
        }
    }

    fn finished(uri: PathBuf) -> Self {
        Self {
            success: true,
            uri: Some(uri),
            error: None,
            transcription: None,
        }
    }
}

/// Accumulated samples of one finished capture
struct RecordedTake {
    samples: Vec<i16>,
    sample_rate: u32,
}

/// State of an active recording: the capture handle plus the task
/// accumulating its chunks
struct RecordingSession {
    handle: audio::AudioCaptureHandle,
    collector: JoinHandle<RecordedTake>,
    started_at: Instant,
}

/// The one recording controller in the process
///
/// Constructed once at the composition root and passed explicitly;
/// exactly one microphone resource exists system-wide.
pub struct Recorder {
    session: Option<RecordingSession>,
    takes_dir: PathBuf,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            session: None,
            takes_dir: std::env::temp_dir().join("ascend"),
        }
    }

    /// Check that microphone capture is available
    ///
    /// Fails closed: any probe failure reads as "not granted".
    pub fn setup_audio(&self) -> bool {
        let available = audio::input_available();
        if !available {
            warn!("No usable audio input; microphone unavailable or denied");
        }
        available
    }

    /// Start a new recording
    ///
    /// Returns false if audio is unavailable or a recording is already
    /// active. The active session is never disturbed.
    pub fn start_recording(&mut self) -> bool {
        if !self.setup_audio() {
            return false;
        }

        if self.session.is_some() {
            warn!("Recording already in progress; ignoring start");
            return false;
        }

        match audio::start_capture() {
            Ok((handle, chunk_rx)) => {
                let collector = tokio::spawn(collect_take(chunk_rx));
                self.session = Some(RecordingSession {
                    handle,
                    collector,
                    started_at: Instant::now(),
                });
                info!("Recording started");
                true
            }
            Err(e) => {
                error!("Failed to start recording: {}", e);
                false
            }
        }
    }

    /// Stop the active recording and finalize the WAV take
    pub async fn stop_recording(&mut self) -> RecordingResult {
        let Some(mut session) = self.session.take() else {
            return RecordingResult::failed("no recording in progress");
        };

        session.handle.stop();
        info!(
            "Recording stopped after {:?}",
            session.started_at.elapsed()
        );

        let take = match session.collector.await {
            Ok(take) => take,
            Err(e) => {
                error!("Failed to collect recorded audio: {}", e);
                return RecordingResult::failed(format!("failed to collect audio: {}", e));
            }
        };

        if let Err(e) = std::fs::create_dir_all(&self.takes_dir) {
            error!("Failed to create takes directory: {}", e);
            return RecordingResult::failed(format!("failed to create takes directory: {}", e));
        }

        let filename = format!("take-{}.wav", Local::now().format("%Y-%m-%d-%H-%M-%S%.3f"));
        let path = self.takes_dir.join(filename);

        match wav::write_take(&path, &take.samples, take.sample_rate) {
            Ok(()) => {
                info!("Saved take to: {:?}", path);
                RecordingResult::finished(path)
            }
            Err(e) => {
                error!("Failed to write take: {}", e);
                RecordingResult::failed(format!("failed to write take: {}", e))
            }
        }
    }

    /// Stop the active recording and transcribe the finished take
    ///
    /// The transcription is awaited before returning, so on success the
    /// result carries the transcript (empty string if the service failed).
    pub async fn stop_and_transcribe(
        &mut self,
        transcriber: &TranscriptionClient,
    ) -> RecordingResult {
        let mut result = self.stop_recording().await;
        if result.success {
            if let Some(ref uri) = result.uri {
                result.transcription = Some(transcriber.transcribe(uri).await);
            }
        }
        result
    }

    /// Discard the active recording without transcribing
    ///
    /// Returns true when there was nothing to cancel.
    pub fn cancel_recording(&mut self) -> bool {
        let Some(mut session) = self.session.take() else {
            return true;
        };

        session.handle.stop();
        session.collector.abort();
        info!("Recording cancelled");
        true
    }

    /// Whether a recording is currently active
    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    #[cfg(test)]
    fn with_takes_dir(dir: PathBuf) -> Self {
        Self {
            session: None,
            takes_dir: dir,
        }
    }

    /// Install a session that is not backed by real capture hardware
    #[cfg(test)]
    fn install_fake_session(&mut self, samples: Vec<i16>, sample_rate: u32) {
        let take = RecordedTake {
            samples,
            sample_rate,
        };
        self.session = Some(RecordingSession {
            handle: audio::AudioCaptureHandle::detached(),
            collector: tokio::spawn(async move { take }),
            started_at: Instant::now(),
        });
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulate audio chunks until the capture side closes the channel
async fn collect_take(mut chunk_rx: mpsc::Receiver<AudioChunk>) -> RecordedTake {
    let mut samples = Vec::new();
    let mut sample_rate = audio::TARGET_SAMPLE_RATE;

    while let Some(chunk) = chunk_rx.recv().await {
        sample_rate = chunk.sample_rate;
        samples.extend_from_slice(&chunk.samples);
    }

    RecordedTake {
        samples,
        sample_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stop_without_session_fails_cleanly() {
        let mut recorder = Recorder::new();
        let result = recorder.stop_recording().await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("no recording in progress"));
        assert!(result.uri.is_none());
        assert!(result.transcription.is_none());
    }

    #[tokio::test]
    async fn test_cancel_without_session_is_noop_success() {
        let mut recorder = Recorder::new();
        assert!(recorder.cancel_recording());
        assert!(!recorder.is_recording());
    }

    #[tokio::test]
    async fn test_start_while_listening_is_rejected() {
        let mut recorder = Recorder::new();
        recorder.install_fake_session(vec![0; 16000], 16000);
        assert!(recorder.is_recording());

        assert!(!recorder.start_recording());

        // The original session is untouched.
        assert!(recorder.is_recording());
    }

    #[tokio::test]
    async fn test_stop_finalizes_wav_take() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut recorder = Recorder::with_takes_dir(dir.path().to_path_buf());
        recorder.install_fake_session(vec![42; 3200], 16000);

        let result = recorder.stop_recording().await;

        assert!(result.success, "stop should succeed: {:?}", result.error);
        assert!(!recorder.is_recording());
        let uri = result.uri.expect("take path");
        let mut reader = hound::WavReader::open(&uri).expect("open take");
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.samples::<i16>().count(), 3200);
    }

    #[tokio::test]
    async fn test_cancel_discards_session() {
        let mut recorder = Recorder::new();
        recorder.install_fake_session(vec![0; 100], 16000);

        assert!(recorder.cancel_recording());
        assert!(!recorder.is_recording());

        // Stopping afterwards reports no session.
        assert!(!recorder.stop_recording().await.success);
    }
}
