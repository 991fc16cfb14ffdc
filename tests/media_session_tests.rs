// Tests for the media session: permission acquisition, chunk buffering,
// stop/upload resolution, and track-release guarantees.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use mockview::media::{
    CaptureBackend, CaptureFrame, DeviceSelection, MediaError, MediaSession, RecordingFormat,
    RecordingUploader, UploadResponse,
};
use tokio::sync::{mpsc, Mutex};

fn selection() -> DeviceSelection {
    DeviceSelection {
        camera_id: None,
        microphone_id: Some("fake-mic".to_string()),
    }
}

fn frame(timestamp_ms: u64) -> CaptureFrame {
    CaptureFrame {
        samples: vec![timestamp_ms as i16; 160],
        sample_rate: 16000,
        channels: 1,
        timestamp_ms,
    }
}

/// Backend that emits a fixed frame script when opened and counts how
/// often its tracks are stopped.
struct ScriptedBackend {
    frames: Vec<CaptureFrame>,
    sender: Option<mpsc::Sender<CaptureFrame>>,
    stop_calls: Arc<AtomicUsize>,
    deny: bool,
}

impl ScriptedBackend {
    fn new(frames: Vec<CaptureFrame>) -> (Self, Arc<AtomicUsize>) {
        let stop_calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                frames,
                sender: None,
                stop_calls: Arc::clone(&stop_calls),
                deny: false,
            },
            stop_calls,
        )
    }

    fn denying() -> Self {
        Self {
            frames: Vec::new(),
            sender: None,
            stop_calls: Arc::new(AtomicUsize::new(0)),
            deny: true,
        }
    }
}

#[async_trait::async_trait]
impl CaptureBackend for ScriptedBackend {
    async fn open(
        &mut self,
        selection: &DeviceSelection,
    ) -> Result<mpsc::Receiver<CaptureFrame>, MediaError> {
        if selection.is_empty() {
            return Err(MediaError::NoDeviceSelected);
        }
        if self.deny {
            return Err(MediaError::Permission(
                "Camera & microphone access is required to start the interview.".to_string(),
            ));
        }

        let (tx, rx) = mpsc::channel(self.frames.len() + 1);
        for frame in self.frames.drain(..) {
            tx.send(frame).await.expect("queue scripted frame");
        }
        self.sender = Some(tx);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), MediaError> {
        if self.sender.take().is_some() {
            self.stop_calls.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.sender.is_some()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Uploader whose outcome can be flipped between calls
struct FlakyUploader {
    fail: AtomicBool,
    received: Mutex<Vec<Vec<u8>>>,
}

impl FlakyUploader {
    fn new(fail: bool) -> Self {
        Self {
            fail: AtomicBool::new(fail),
            received: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl RecordingUploader for FlakyUploader {
    async fn upload(
        &self,
        data: Vec<u8>,
        _file_name: &str,
        _content_type: &str,
    ) -> Result<UploadResponse, MediaError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MediaError::Upload("connection refused".to_string()));
        }

        self.received.lock().await.push(data);

        Ok(UploadResponse {
            success: true,
            file_path: Some("/recordings/recording_1.wav".to_string()),
            error: None,
        })
    }
}

#[tokio::test]
async fn test_record_and_upload_resolves_artifact() {
    let (backend, stop_calls) = ScriptedBackend::new(vec![frame(0), frame(100), frame(200)]);
    let uploader = Arc::new(FlakyUploader::new(false));

    let mut media = MediaSession::new(
        Box::new(backend),
        Arc::clone(&uploader) as Arc<dyn RecordingUploader>,
        RecordingFormat::default(),
    );
    media.request_access(&selection()).await.unwrap();
    media.start().unwrap();

    let artifact = media.stop().await.unwrap();

    assert!(artifact.available);
    assert_eq!(
        artifact.reference.as_deref(),
        Some("/recordings/recording_1.wav")
    );
    assert_eq!(stop_calls.load(Ordering::SeqCst), 1);

    // The uploaded object is a single WAV containing every buffered frame
    let received = uploader.received.lock().await;
    assert_eq!(received.len(), 1);
    assert_eq!(&received[0][..4], b"RIFF");
    // 3 frames x 160 samples x 2 bytes, plus the 44-byte header
    assert_eq!(received[0].len(), 44 + 3 * 160 * 2);
}

#[tokio::test]
async fn test_assembly_normalizes_to_target_format() {
    // 48 kHz stereo input folds to mono, then decimates to 16 kHz
    let stereo = CaptureFrame {
        samples: vec![100i16; 960], // 480 interleaved sample pairs
        sample_rate: 48000,
        channels: 2,
        timestamp_ms: 0,
    };

    let (backend, _) = ScriptedBackend::new(vec![stereo]);
    let uploader = Arc::new(FlakyUploader::new(false));

    let mut media = MediaSession::new(
        Box::new(backend),
        Arc::clone(&uploader) as Arc<dyn RecordingUploader>,
        RecordingFormat::default(),
    );
    media.request_access(&selection()).await.unwrap();
    media.start().unwrap();
    media.stop().await.unwrap();

    // 960 interleaved -> 480 mono -> 160 samples at 16 kHz
    let received = uploader.received.lock().await;
    assert_eq!(received[0].len(), 44 + 160 * 2);
}

#[tokio::test]
async fn test_stop_twice_is_a_no_op() {
    let (backend, stop_calls) = ScriptedBackend::new(vec![frame(0)]);
    let uploader = Arc::new(FlakyUploader::new(false));

    let mut media = MediaSession::new(
        Box::new(backend),
        Arc::clone(&uploader) as Arc<dyn RecordingUploader>,
        RecordingFormat::default(),
    );
    media.request_access(&selection()).await.unwrap();
    media.start().unwrap();

    let first = media.stop().await.unwrap();
    let second = media.stop().await.unwrap();

    assert_eq!(first.reference, second.reference);
    assert_eq!(stop_calls.load(Ordering::SeqCst), 1, "tracks released once");
    assert_eq!(uploader.received.lock().await.len(), 1, "uploaded once");
}

#[tokio::test]
async fn test_stop_before_start_does_not_upload() {
    let (backend, stop_calls) = ScriptedBackend::new(vec![frame(0)]);
    let uploader = Arc::new(FlakyUploader::new(false));

    let mut media = MediaSession::new(
        Box::new(backend),
        Arc::clone(&uploader) as Arc<dyn RecordingUploader>,
        RecordingFormat::default(),
    );
    media.request_access(&selection()).await.unwrap();

    let artifact = media.stop().await.unwrap();

    assert!(!artifact.available);
    assert!(artifact.reference.is_none());
    assert_eq!(stop_calls.load(Ordering::SeqCst), 1);
    assert!(uploader.received.lock().await.is_empty());

    // And again: still no error, still one release
    let artifact = media.stop().await.unwrap();
    assert!(!artifact.available);
    assert_eq!(stop_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_upload_failure_surfaces_and_retries() {
    let (backend, stop_calls) = ScriptedBackend::new(vec![frame(0), frame(100)]);
    let uploader = Arc::new(FlakyUploader::new(true));

    let mut media = MediaSession::new(
        Box::new(backend),
        Arc::clone(&uploader) as Arc<dyn RecordingUploader>,
        RecordingFormat::default(),
    );
    media.request_access(&selection()).await.unwrap();
    media.start().unwrap();

    // First stop: tracks released, upload fails, artifact unresolved
    let err = media.stop().await.unwrap_err();
    assert!(matches!(err, MediaError::Upload(_)));
    assert_eq!(stop_calls.load(Ordering::SeqCst), 1);

    // Retry succeeds with the already-assembled object; tracks untouched
    uploader.fail.store(false, Ordering::SeqCst);
    let artifact = media.stop().await.unwrap();

    assert!(artifact.available);
    assert_eq!(stop_calls.load(Ordering::SeqCst), 1);
    assert_eq!(uploader.received.lock().await.len(), 1);
}

#[tokio::test]
async fn test_rejected_upload_never_synthesizes_a_reference() {
    struct RejectingUploader;

    #[async_trait::async_trait]
    impl RecordingUploader for RejectingUploader {
        async fn upload(
            &self,
            _data: Vec<u8>,
            _file_name: &str,
            _content_type: &str,
        ) -> Result<UploadResponse, MediaError> {
            Ok(UploadResponse {
                success: false,
                file_path: None,
                error: Some("disk full".to_string()),
            })
        }
    }

    let (backend, _) = ScriptedBackend::new(vec![frame(0)]);
    let mut media = MediaSession::new(
        Box::new(backend),
        Arc::new(RejectingUploader),
        RecordingFormat::default(),
    );
    media.request_access(&selection()).await.unwrap();
    media.start().unwrap();

    let err = media.stop().await.unwrap_err();
    assert!(matches!(err, MediaError::Upload(msg) if msg.contains("disk full")));
}

#[tokio::test]
async fn test_permission_denial_leaves_nothing_acquired() {
    let backend = ScriptedBackend::denying();
    let uploader = Arc::new(FlakyUploader::new(false));

    let mut media = MediaSession::new(Box::new(backend), uploader, RecordingFormat::default());

    let err = media.request_access(&selection()).await.unwrap_err();
    assert!(matches!(err, MediaError::Permission(_)));
    assert!(!media.is_recording());

    // The recorder cannot start without access
    assert!(media.start().is_err());
}

#[tokio::test]
async fn test_empty_selection_fails_fast() {
    let (backend, _) = ScriptedBackend::new(vec![]);
    let uploader = Arc::new(FlakyUploader::new(false));

    let mut media = MediaSession::new(Box::new(backend), uploader, RecordingFormat::default());

    let err = media
        .request_access(&DeviceSelection::default())
        .await
        .unwrap_err();
    assert!(matches!(err, MediaError::NoDeviceSelected));
}

#[tokio::test]
async fn test_preview_mirrors_frames() {
    let (backend, _) = ScriptedBackend::new(vec![frame(0), frame(100)]);
    let uploader = Arc::new(FlakyUploader::new(false));

    let mut media = MediaSession::new(Box::new(backend), uploader, RecordingFormat::default());
    media.request_access(&selection()).await.unwrap();

    let (preview_tx, mut preview_rx) = mpsc::channel(16);
    media.set_preview_sink(preview_tx);
    media.start().unwrap();

    media.stop().await.unwrap();

    let mut previewed = 0;
    while preview_rx.try_recv().is_ok() {
        previewed += 1;
    }
    assert_eq!(previewed, 2);
}
