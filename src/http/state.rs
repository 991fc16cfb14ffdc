use std::path::PathBuf;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Directory uploaded recordings are written to (served at
    /// /recordings)
    pub recordings_dir: PathBuf,
}

impl AppState {
    pub fn new(recordings_dir: impl Into<PathBuf>) -> Self {
        Self {
            recordings_dir: recordings_dir.into(),
        }
    }
}
