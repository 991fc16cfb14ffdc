use cpal::traits::{DeviceTrait, HostTrait};
use serde::{Deserialize, Serialize};

use super::MediaError;

/// Capture device category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Camera,
    Microphone,
}

/// One enumerated capture device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Opaque identifier accepted by the capture backend
    pub id: String,

    /// Human-readable name for the selection UI
    pub label: String,

    pub kind: DeviceKind,
}

/// Result of a device enumeration query
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceList {
    pub cameras: Vec<DeviceDescriptor>,
    pub microphones: Vec<DeviceDescriptor>,
}

impl DeviceList {
    /// Default selection policy: first entry of each list if present,
    /// otherwise that slot stays unselected.
    pub fn default_selection(&self) -> DeviceSelection {
        DeviceSelection {
            camera_id: self.cameras.first().map(|d| d.id.clone()),
            microphone_id: self.microphones.first().map(|d| d.id.clone()),
        }
    }
}

/// Devices chosen for a session; mutable until recording starts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSelection {
    pub camera_id: Option<String>,
    pub microphone_id: Option<String>,
}

impl DeviceSelection {
    /// True when no device was selected at all; capture must then fail
    /// fast instead of defaulting to "any device"
    pub fn is_empty(&self) -> bool {
        self.camera_id.is_none() && self.microphone_id.is_none()
    }
}

/// Platform media-device registry boundary.
///
/// Pure query: no state is retained beyond the returned list.
#[async_trait::async_trait]
pub trait DeviceRegistry: Send + Sync {
    async fn enumerate(&self) -> Result<DeviceList, MediaError>;
}

/// Registry backed by the cpal audio host.
///
/// Only audio inputs are enumerable here; camera discovery belongs to a
/// platform-specific video backend and yields an empty list on this one.
pub struct CpalDeviceRegistry;

#[async_trait::async_trait]
impl DeviceRegistry for CpalDeviceRegistry {
    async fn enumerate(&self) -> Result<DeviceList, MediaError> {
        let host = cpal::default_host();

        let inputs = host
            .input_devices()
            .map_err(|e| MediaError::DeviceQuery(e.to_string()))?;

        let mut microphones = Vec::new();
        for device in inputs {
            // cpal exposes no stable identifier; the device name serves as
            // both id and label
            let name = device
                .name()
                .map_err(|e| MediaError::DeviceQuery(e.to_string()))?;
            microphones.push(DeviceDescriptor {
                id: name.clone(),
                label: name,
                kind: DeviceKind::Microphone,
            });
        }

        Ok(DeviceList {
            cameras: Vec::new(),
            microphones,
        })
    }
}
