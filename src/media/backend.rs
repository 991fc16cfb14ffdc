use tokio::sync::mpsc;

use super::devices::DeviceSelection;
use super::MediaError;

/// One buffer of captured media as delivered by the platform callback
/// (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct CaptureFrame {
    /// Raw samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels
    pub channels: u16,

    /// Milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Platform capture boundary.
///
/// `open` doubles as the permission request: a denial surfaces as
/// [`MediaError::Permission`] with a user-facing message, and the caller
/// stays in device selection so the user may retry. The returned receiver
/// is the live stream; the recorder is bound to it but not started.
///
/// Implementations own the underlying tracks and must release them in
/// `stop`, which is safe to call more than once.
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Request capture access constrained to the selected devices.
    ///
    /// A fully empty selection is a configuration error
    /// ([`MediaError::NoDeviceSelected`]); a single unset slot falls back
    /// to the platform default for that slot only.
    async fn open(
        &mut self,
        selection: &DeviceSelection,
    ) -> Result<mpsc::Receiver<CaptureFrame>, MediaError>;

    /// Stop the capture tracks. A no-op once the tracks are stopped.
    async fn stop(&mut self) -> Result<(), MediaError>;

    /// Whether the tracks are currently live
    fn is_capturing(&self) -> bool;

    /// Backend name for logging
    fn name(&self) -> &str;
}
