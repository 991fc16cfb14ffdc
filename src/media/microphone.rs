use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use super::backend::{CaptureBackend, CaptureFrame};
use super::devices::DeviceSelection;
use super::MediaError;

const FRAME_CHANNEL_CAPACITY: usize = 64;

/// Microphone capture over cpal.
///
/// cpal streams are not `Send`, so the stream lives on a dedicated thread
/// for the duration of the capture; `open` hands back an mpsc receiver fed
/// from the audio callback and `stop` signals the thread to drop the
/// stream.
pub struct MicrophoneBackend {
    capturing: Arc<AtomicBool>,
    stop_tx: Option<std::sync::mpsc::Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl MicrophoneBackend {
    pub fn new() -> Self {
        Self {
            capturing: Arc::new(AtomicBool::new(false)),
            stop_tx: None,
            thread: None,
        }
    }
}

impl Default for MicrophoneBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CaptureBackend for MicrophoneBackend {
    async fn open(
        &mut self,
        selection: &DeviceSelection,
    ) -> Result<mpsc::Receiver<CaptureFrame>, MediaError> {
        if selection.is_empty() {
            return Err(MediaError::NoDeviceSelected);
        }

        if self.capturing.load(Ordering::SeqCst) {
            return Err(MediaError::Recorder("capture already open".to_string()));
        }

        let (frame_tx, frame_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), MediaError>>();

        let requested_mic = selection.microphone_id.clone();

        let thread = std::thread::spawn(move || {
            let stream = match build_input_stream(requested_mic.as_deref(), frame_tx) {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(MediaError::Permission(format!(
                    "Could not start microphone capture: {}",
                    e
                ))));
                return;
            }

            let _ = ready_tx.send(Ok(()));

            // Park until stop is requested (or the backend is dropped),
            // then drop the stream to release the device.
            let _ = stop_rx.recv();
        });

        match ready_rx.await {
            Ok(Ok(())) => {
                info!("Microphone capture opened");
                self.capturing.store(true, Ordering::SeqCst);
                self.stop_tx = Some(stop_tx);
                self.thread = Some(thread);
                Ok(frame_rx)
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(MediaError::Recorder(
                    "capture thread exited before reporting readiness".to_string(),
                ))
            }
        }
    }

    async fn stop(&mut self) -> Result<(), MediaError> {
        if !self.capturing.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Capture thread panicked during shutdown");
            }
        }

        info!("Microphone capture stopped");
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "cpal-microphone"
    }
}

fn build_input_stream(
    requested_mic: Option<&str>,
    frame_tx: mpsc::Sender<CaptureFrame>,
) -> Result<cpal::Stream, MediaError> {
    let host = cpal::default_host();

    let device = match requested_mic {
        Some(id) => host
            .input_devices()
            .map_err(|e| MediaError::Permission(e.to_string()))?
            .find(|d| d.name().map(|n| n == id).unwrap_or(false))
            .ok_or_else(|| {
                MediaError::Permission(format!("selected microphone '{}' not found", id))
            })?,
        None => host.default_input_device().ok_or_else(|| {
            MediaError::Permission("no default microphone available".to_string())
        })?,
    };

    let supported = device.default_input_config().map_err(|e| {
        MediaError::Permission(format!(
            "Camera & microphone access is required to start the interview. ({})",
            e
        ))
    })?;

    let sample_rate = supported.sample_rate().0;
    let channels = supported.channels();
    let sample_format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();

    let started = Instant::now();
    let err_fn = |e| warn!("Capture stream error: {}", e);

    let stream = match sample_format {
        cpal::SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _| {
                let samples = data
                    .iter()
                    .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                    .collect();
                // try_send keeps the realtime callback non-blocking; a full
                // channel drops the frame
                let _ = frame_tx.try_send(CaptureFrame {
                    samples,
                    sample_rate,
                    channels,
                    timestamp_ms: started.elapsed().as_millis() as u64,
                });
            },
            err_fn,
            None,
        ),
        cpal::SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _| {
                let _ = frame_tx.try_send(CaptureFrame {
                    samples: data.to_vec(),
                    sample_rate,
                    channels,
                    timestamp_ms: started.elapsed().as_millis() as u64,
                });
            },
            err_fn,
            None,
        ),
        other => {
            return Err(MediaError::Recorder(format!(
                "unsupported sample format: {:?}",
                other
            )))
        }
    };

    stream.map_err(|e| MediaError::Permission(format!("failed to open capture stream: {}", e)))
}
