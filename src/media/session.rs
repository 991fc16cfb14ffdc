use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::backend::{CaptureBackend, CaptureFrame};
use super::devices::DeviceSelection;
use super::upload::RecordingUploader;
use super::MediaError;

const RECORDING_FILE_NAME: &str = "recording.wav";
const RECORDING_CONTENT_TYPE: &str = "audio/wav";

/// The single container/codec combination recordings are assembled in,
/// chosen to be playable as-is
#[derive(Debug, Clone, Copy)]
pub struct RecordingFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for RecordingFormat {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
        }
    }
}

impl From<&crate::config::MediaConfig> for RecordingFormat {
    fn from(cfg: &crate::config::MediaConfig) -> Self {
        Self {
            sample_rate: cfg.sample_rate,
            channels: cfg.channels,
        }
    }
}

/// Persisted reference to a session's captured media.
///
/// `available` stays false until the upload collaborator confirms success;
/// a missing reference is never synthesized.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingArtifact {
    pub available: bool,
    pub reference: Option<String>,
}

impl RecordingArtifact {
    pub fn stored(reference: impl Into<String>) -> Self {
        Self {
            available: true,
            reference: Some(reference.into()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            reference: None,
        }
    }
}

/// Owns the capture stream for the session's duration: permission
/// acquisition, live preview wiring, recorder lifecycle, chunk
/// accumulation, and the stop→assemble→upload round trip.
///
/// Nothing is persisted before `stop`. Tracks are released on every exit
/// path exactly once, and a repeated `stop` after a failed upload retries
/// the upload with the already-assembled recording object.
pub struct MediaSession {
    backend: Box<dyn CaptureBackend>,
    uploader: Arc<dyn RecordingUploader>,
    format: RecordingFormat,

    /// Live stream handed out by the permission request; consumed when the
    /// recorder starts
    frame_rx: Option<mpsc::Receiver<CaptureFrame>>,

    /// Buffered frames, in arrival order
    frames: Arc<Mutex<Vec<CaptureFrame>>>,

    /// Optional live-preview sink; frames are mirrored best-effort
    preview_tx: Option<mpsc::Sender<CaptureFrame>>,

    recording: Arc<AtomicBool>,
    drain_task: Option<JoinHandle<()>>,

    started: bool,
    tracks_released: bool,

    /// Assembled recording object, cached across upload retries
    assembled: Option<Vec<u8>>,

    /// Final artifact once `stop` has fully resolved
    artifact: Option<RecordingArtifact>,
}

impl MediaSession {
    pub fn new(
        backend: Box<dyn CaptureBackend>,
        uploader: Arc<dyn RecordingUploader>,
        format: RecordingFormat,
    ) -> Self {
        Self {
            backend,
            uploader,
            format,
            frame_rx: None,
            frames: Arc::new(Mutex::new(Vec::new())),
            preview_tx: None,
            recording: Arc::new(AtomicBool::new(false)),
            drain_task: None,
            started: false,
            tracks_released: false,
            assembled: None,
            artifact: None,
        }
    }

    /// Request capture access for the selected devices.
    ///
    /// On success the live stream is wired and the recorder is constructed
    /// but not started. On denial the backend's user-facing
    /// [`MediaError::Permission`] propagates, nothing is acquired, and the
    /// caller may retry with a new selection.
    pub async fn request_access(&mut self, selection: &DeviceSelection) -> Result<(), MediaError> {
        let frame_rx = self.backend.open(selection).await?;

        info!("Capture access granted via {}", self.backend.name());

        self.frame_rx = Some(frame_rx);
        self.tracks_released = false;

        Ok(())
    }

    /// Mirror captured frames into `sink` for a live preview. Must be set
    /// before the recorder starts.
    pub fn set_preview_sink(&mut self, sink: mpsc::Sender<CaptureFrame>) {
        self.preview_tx = Some(sink);
    }

    /// Begin buffering recorded frames in arrival order.
    pub fn start(&mut self) -> Result<(), MediaError> {
        let mut frame_rx = self
            .frame_rx
            .take()
            .ok_or_else(|| MediaError::Recorder("recorder is not ready to start".to_string()))?;

        self.recording.store(true, Ordering::SeqCst);

        let frames = Arc::clone(&self.frames);
        let preview_tx = self.preview_tx.clone();

        // The drain runs until the capture channel closes, i.e. until the
        // tracks are released; every frame that arrived is buffered.
        self.drain_task = Some(tokio::spawn(async move {
            while let Some(frame) = frame_rx.recv().await {
                if let Some(preview) = &preview_tx {
                    // Preview is best-effort; a slow consumer drops frames
                    let _ = preview.try_send(frame.clone());
                }

                frames.lock().await.push(frame);
            }
        }));

        self.started = true;
        info!("Recording started");

        Ok(())
    }

    /// Stop the recorder and the capture tracks, assemble the buffer into a
    /// single media object, and upload it.
    ///
    /// Resolves once the upload responds. An upload failure surfaces as
    /// [`MediaError::Upload`] with the artifact left unavailable — the
    /// caller decides whether to retry (by calling `stop` again) or abort
    /// feedback generation. Calling `stop` after the tracks are already
    /// stopped never re-releases them; once fully resolved, the artifact is
    /// returned as-is.
    pub async fn stop(&mut self) -> Result<RecordingArtifact, MediaError> {
        if let Some(artifact) = &self.artifact {
            return Ok(artifact.clone());
        }

        self.release_tracks().await;

        if !self.started {
            // Recorder never ran; nothing was buffered and there is
            // nothing to upload
            let artifact = RecordingArtifact::unavailable();
            self.artifact = Some(artifact.clone());
            return Ok(artifact);
        }

        let data = match &self.assembled {
            Some(data) => data.clone(),
            None => {
                if let Some(task) = self.drain_task.take() {
                    if let Err(e) = task.await {
                        error!("Recorder drain task panicked: {}", e);
                    }
                }

                let frames = std::mem::take(&mut *self.frames.lock().await);
                info!("Assembling recording from {} buffered frames", frames.len());

                let data = assemble_wav(&frames, self.format)?;
                self.assembled = Some(data.clone());
                data
            }
        };

        let response = self
            .uploader
            .upload(data, RECORDING_FILE_NAME, RECORDING_CONTENT_TYPE)
            .await?;

        if !response.success {
            return Err(MediaError::Upload(
                response
                    .error
                    .unwrap_or_else(|| "upload rejected by endpoint".to_string()),
            ));
        }

        let reference = response.file_path.ok_or_else(|| {
            MediaError::Upload("upload succeeded but returned no file path".to_string())
        })?;

        let artifact = RecordingArtifact::stored(reference);
        self.artifact = Some(artifact.clone());

        info!(
            "Recording uploaded: {}",
            artifact.reference.as_deref().unwrap_or_default()
        );

        Ok(artifact)
    }

    /// Release the capture tracks without uploading. Used when a session is
    /// abandoned; safe alongside `stop`.
    pub async fn release(&mut self) {
        if let Some(task) = self.drain_task.take() {
            task.abort();
        }
        self.frame_rx = None;
        self.release_tracks().await;
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    async fn release_tracks(&mut self) {
        if self.tracks_released {
            return;
        }

        self.recording.store(false, Ordering::SeqCst);

        if let Err(e) = self.backend.stop().await {
            warn!("Failed to stop capture tracks: {}", e);
        }

        self.tracks_released = true;
    }
}

/// Assemble buffered frames into a single WAV object in memory,
/// normalized to the target format (16-bit PCM WAV) so the stored
/// recording is playable as-is.
fn assemble_wav(frames: &[CaptureFrame], format: RecordingFormat) -> Result<Vec<u8>, MediaError> {
    let spec = hound::WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());

    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| MediaError::Recorder(e.to_string()))?;

        for frame in frames {
            let samples = normalize_frame(frame, format);
            for sample in samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| MediaError::Recorder(e.to_string()))?;
            }
        }

        writer
            .finalize()
            .map_err(|e| MediaError::Recorder(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

/// Normalize one frame to the target format: fold to mono first, then
/// downsample by decimation.
fn normalize_frame(frame: &CaptureFrame, format: RecordingFormat) -> Vec<i16> {
    let mut samples = if frame.channels == 2 && format.channels == 1 {
        stereo_to_mono(&frame.samples)
    } else {
        frame.samples.clone()
    };

    if frame.sample_rate > format.sample_rate {
        let ratio = (frame.sample_rate / format.sample_rate) as usize;
        if ratio > 1 {
            samples = samples.into_iter().step_by(ratio).collect();
        }
    }

    samples
}

/// Sum left and right channels, clamped (no division, to preserve volume)
fn stereo_to_mono(samples: &[i16]) -> Vec<i16> {
    let mut mono = Vec::with_capacity(samples.len() / 2);

    for chunk in samples.chunks_exact(2) {
        let sum = chunk[0] as i32 + chunk[1] as i32;
        mono.push(sum.clamp(i16::MIN as i32, i16::MAX as i32) as i16);
    }

    mono
}
