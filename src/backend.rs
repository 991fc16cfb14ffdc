use serde::{Deserialize, Serialize};

use crate::session::FeedbackPayload;

/// Faults at the persistence/read collaborator boundary
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Feedback persistence failed; the caller redirects to a safe
    /// fallback instead of leaving the session stuck
    #[error("feedback dispatch failed: {0}")]
    Dispatch(String),

    #[error("read failed: {0}")]
    Read(String),
}

/// An interview as served by the read collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: String,
    pub role: String,
    pub user_id: String,

    /// The fixed, ordered question list driving the session
    pub questions: Vec<String>,
}

/// The signed-in candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

/// Acknowledgement from the feedback persistence collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackAck {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_id: Option<String>,
}

/// External feedback persistence. This core hands over a finished
/// transcript, recording reference, and attempted count — it never
/// persists anything itself.
#[async_trait::async_trait]
pub trait FeedbackSink: Send + Sync {
    async fn create_feedback(&self, payload: &FeedbackPayload) -> Result<FeedbackAck, BackendError>;
}

/// Read-only access to interviews and the current user, used to seed a
/// session with its question list and identity.
#[async_trait::async_trait]
pub trait InterviewReader: Send + Sync {
    async fn interview_by_id(&self, id: &str) -> Result<Option<Interview>, BackendError>;

    async fn current_user(&self) -> Result<Option<User>, BackendError>;
}
