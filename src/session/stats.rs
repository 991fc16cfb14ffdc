use chrono::{DateTime, Utc};
use serde::Serialize;

use super::state::CallState;

/// Read-only snapshot of a running session, for status display
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    /// Current call state
    pub state: CallState,

    /// When the session was created
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Final transcript entries accumulated so far
    pub transcript_entries: usize,

    /// Attempted-question count, present once the post-call analysis ran
    pub attempted_count: Option<usize>,

    /// Whether the recording upload has resolved successfully
    pub recording_available: bool,
}
