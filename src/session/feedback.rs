use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::{BackendError, FeedbackSink};
use crate::transcript::TranscriptEntry;

/// The exact contract handed to the external feedback persistence
/// collaborator. Constructed once, at session end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackPayload {
    pub interview_id: String,

    pub user_id: String,

    /// The full, final transcript in conversation order
    pub transcript: Vec<TranscriptEntry>,

    /// Present when retaking an interview updates existing feedback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_id: Option<String>,

    /// Where the persistence collaborator can retrieve the recording
    pub recording_url: String,

    pub attempted_count: usize,
}

/// Hands the finished session to the feedback persistence collaborator.
pub struct FeedbackDispatcher {
    sink: Arc<dyn FeedbackSink>,
}

impl FeedbackDispatcher {
    pub fn new(sink: Arc<dyn FeedbackSink>) -> Self {
        Self { sink }
    }

    /// Persist the payload. On success returns the feedback id the caller
    /// navigates to; on failure the caller falls back to home rather than
    /// leaving the session stuck.
    pub async fn dispatch(&self, payload: &FeedbackPayload) -> Result<String, BackendError> {
        let ack = self.sink.create_feedback(payload).await?;

        match (ack.success, ack.feedback_id) {
            (true, Some(feedback_id)) => {
                info!("Feedback saved: {}", feedback_id);
                Ok(feedback_id)
            }
            _ => Err(BackendError::Dispatch(
                "persistence collaborator rejected the feedback".to_string(),
            )),
        }
    }
}
