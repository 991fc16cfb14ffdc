use crate::agent::AgentError;
use crate::backend::BackendError;
use crate::media::MediaError;
use crate::session::StateError;

/// Umbrella error for a running interview session.
///
/// Every variant is session-local and recoverable by restarting the flow
/// from the inactive state; nothing here is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Session bootstrap could not resolve the interview or user
    #[error("session setup failed: {0}")]
    Setup(String),
}
