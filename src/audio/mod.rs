//! Audio capture module using cpal for cross-platform microphone access
//!
//! Captures audio from the default input device on a dedicated thread,
//! downmixed to mono PCM 16-bit, and delivers it in chunks over an async
//! channel. The recorder accumulates the chunks into a finished take.

mod types;

pub use types::{AudioCaptureError, AudioCaptureHandle, AudioChunk};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Preferred capture sample rate (16kHz, the speech-to-text sweet spot)
pub const TARGET_SAMPLE_RATE: u32 = 16000;

/// Samples per chunk sent over the channel (100ms at 16kHz)
const CHUNK_SIZE: usize = 1600;

/// Check that a usable input device and configuration exist
///
/// This is the closest a desktop build gets to a microphone permission
/// check: a denied or absent device shows up as "no usable input".
pub(crate) fn input_available() -> bool {
    let host = cpal::default_host();
    let Some(device) = host.default_input_device() else {
        return false;
    };
    device.default_input_config().is_ok()
}

/// Start audio capture on a dedicated thread
///
/// # Returns
/// A tuple containing:
/// - `AudioCaptureHandle` - Used to stop capture and check status
/// - `mpsc::Receiver<AudioChunk>` - Receives audio chunks for accumulation
///
/// # Errors
/// Returns `AudioCaptureError` if no input device is available, the
/// device configuration is not supported, or the stream cannot start.
pub(crate) fn start_capture(
) -> Result<(AudioCaptureHandle, mpsc::Receiver<AudioChunk>), AudioCaptureError> {
    let is_capturing = Arc::new(AtomicBool::new(true));
    let is_capturing_clone = is_capturing.clone();

    // Chunks are 100ms each, so the channel buffers about a minute of
    // audio if the consumer stalls.
    let (chunk_tx, chunk_rx) = mpsc::channel(600);

    let thread_handle = thread::spawn(move || {
        if let Err(e) = run_capture(is_capturing_clone, chunk_tx) {
            error!("Audio capture error: {}", e);
        }
    });

    let handle = AudioCaptureHandle {
        is_capturing,
        thread_handle: Some(thread_handle),
    };

    Ok((handle, chunk_rx))
}

/// Run audio capture on the current thread (blocking)
fn run_capture(
    is_capturing: Arc<AtomicBool>,
    chunk_tx: mpsc::Sender<AudioChunk>,
) -> Result<(), AudioCaptureError> {
    let host = cpal::default_host();

    let device = host
        .default_input_device()
        .ok_or(AudioCaptureError::NoInputDevice)?;

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    info!("Using audio input device: {}", device_name);

    // Prefer the target rate; otherwise take whatever the device offers.
    let supported_configs = device
        .supported_input_configs()
        .map_err(|e| AudioCaptureError::ConfigError(e.to_string()))?;

    let mut best_config = None;
    let mut found_target_rate = false;

    for config in supported_configs {
        if config.channels() > 0 {
            if config.min_sample_rate().0 <= TARGET_SAMPLE_RATE
                && config.max_sample_rate().0 >= TARGET_SAMPLE_RATE
            {
                best_config = Some(config.with_sample_rate(cpal::SampleRate(TARGET_SAMPLE_RATE)));
                found_target_rate = true;
                break;
            } else if best_config.is_none() {
                best_config = Some(config.with_max_sample_rate());
            }
        }
    }

    let supported_config = best_config.ok_or(AudioCaptureError::NoSupportedConfig)?;

    if !found_target_rate {
        warn!(
            "{}Hz not supported, capturing at {}Hz instead",
            TARGET_SAMPLE_RATE,
            supported_config.sample_rate().0
        );
    }

    let sample_format = supported_config.sample_format();
    let config: cpal::StreamConfig = supported_config.into();
    let sample_rate = config.sample_rate.0;
    let channels = config.channels as usize;

    info!("Audio config: {} channels, {} Hz", channels, sample_rate);

    let err_callback = |err| {
        error!("Audio stream error: {}", err);
    };

    // Buffer for accumulating downmixed samples until a chunk is full
    let mut pending: Vec<i16> = Vec::with_capacity(CHUNK_SIZE * 2);

    let is_capturing_stream = is_capturing.clone();
    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _| {
                if !is_capturing_stream.load(Ordering::SeqCst) {
                    return;
                }
                accumulate(data, channels, sample_rate, &mut pending, &chunk_tx);
            },
            err_callback,
            None,
        )?,
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _| {
                if !is_capturing_stream.load(Ordering::SeqCst) {
                    return;
                }
                let samples: Vec<i16> = data
                    .iter()
                    .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
                    .collect();
                accumulate(&samples, channels, sample_rate, &mut pending, &chunk_tx);
            },
            err_callback,
            None,
        )?,
        sample_format => {
            return Err(AudioCaptureError::UnsupportedFormat(format!(
                "{:?}",
                sample_format
            )));
        }
    };

    stream.play()?;
    info!("Audio capture started");

    // Keep the stream alive until capture is stopped
    while is_capturing.load(Ordering::SeqCst) {
        thread::sleep(std::time::Duration::from_millis(100));
    }

    drop(stream);
    Ok(())
}

/// Downmix interleaved frames to mono and emit full chunks
fn accumulate(
    data: &[i16],
    channels: usize,
    sample_rate: u32,
    pending: &mut Vec<i16>,
    chunk_tx: &mpsc::Sender<AudioChunk>,
) {
    for frame in data.chunks(channels.max(1)) {
        let sum: i32 = frame.iter().map(|&s| s as i32).sum();
        pending.push((sum / frame.len().max(1) as i32) as i16);
    }

    while pending.len() >= CHUNK_SIZE {
        let samples: Vec<i16> = pending.drain(..CHUNK_SIZE).collect();
        if let Err(e) = chunk_tx.try_send(AudioChunk {
            samples,
            sample_rate,
        }) {
            warn!("Dropping audio chunk: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_downmixes_stereo() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut pending = Vec::new();

        // One full chunk of interleaved stereo frames with L=100, R=300.
        let frames: Vec<i16> = std::iter::repeat([100i16, 300i16])
            .take(CHUNK_SIZE)
            .flatten()
            .collect();
        accumulate(&frames, 2, 16000, &mut pending, &tx);

        let chunk = rx.try_recv().expect("a full chunk should be emitted");
        assert_eq!(chunk.samples.len(), CHUNK_SIZE);
        assert!(chunk.samples.iter().all(|&s| s == 200));
        assert_eq!(chunk.sample_rate, 16000);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_accumulate_holds_partial_chunk() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut pending = Vec::new();

        accumulate(&[1i16; 100], 1, 16000, &mut pending, &tx);

        assert!(rx.try_recv().is_err());
        assert_eq!(pending.len(), 100);
    }

    #[test]
    fn test_audio_capture_creation() {
        // This test will only pass on machines with audio input
        match start_capture() {
            Ok((mut handle, _rx)) => {
                assert!(handle.is_capturing());
                handle.stop();
                assert!(!handle.is_capturing());
            }
            Err(AudioCaptureError::NoInputDevice) => {
                println!("No audio input device available (expected in CI)");
            }
            Err(e) => {
                panic!("Unexpected error: {}", e);
            }
        }
    }
}
