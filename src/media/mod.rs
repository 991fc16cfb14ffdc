pub mod backend;
pub mod devices;
pub mod microphone;
pub mod session;
pub mod upload;

pub use backend::{CaptureBackend, CaptureFrame};
pub use devices::{
    CpalDeviceRegistry, DeviceDescriptor, DeviceKind, DeviceList, DeviceRegistry, DeviceSelection,
};
pub use microphone::MicrophoneBackend;
pub use session::{MediaSession, RecordingArtifact, RecordingFormat};
pub use upload::{HttpUploader, RecordingUploader, UploadResponse};

/// Errors raised by the capture/recording pipeline
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// The platform refused device enumeration (distinct from a capture
    /// permission denial — the user may retry)
    #[error("device enumeration failed: {0}")]
    DeviceQuery(String),

    /// Capture was denied; the message is user-facing
    #[error("{0}")]
    Permission(String),

    /// Neither a camera nor a microphone was selected
    #[error("no capture device selected")]
    NoDeviceSelected,

    /// Recorder lifecycle or assembly fault
    #[error("recorder fault: {0}")]
    Recorder(String),

    /// The finished recording could not be persisted; feedback dispatch
    /// must be withheld
    #[error("recording upload failed: {0}")]
    Upload(String),
}
