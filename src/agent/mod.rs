pub mod client;
pub mod events;
pub mod gateway;

pub use client::{NatsAgentClient, VoiceAgentClient};
pub use events::{
    format_questions, AgentEvent, AgentMessage, AssistantOverrides, MessageKind, TranscriptType,
    VariableValues,
};
pub use gateway::{GatewayEvent, VoiceAgentGateway};

/// Faults at the voice agent boundary.
///
/// Gateway faults are non-fatal to the session by default: they are logged
/// and forwarded, and the agent is assumed to recover or to emit its own
/// call-end.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("agent connection failed: {0}")]
    Connect(String),

    #[error("agent command failed: {0}")]
    Command(String),

    #[error("agent subscription failed: {0}")]
    Subscribe(String),
}
