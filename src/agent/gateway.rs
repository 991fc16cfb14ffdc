use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use super::client::VoiceAgentClient;
use super::events::{format_questions, AgentEvent, AssistantOverrides, MessageKind, TranscriptType, VariableValues};
use super::AgentError;
use crate::transcript::TranscriptEntry;

const GATEWAY_CHANNEL_CAPACITY: usize = 64;

/// Session-local view of the agent's event stream
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    CallStarted,
    CallEnded,
    SpeechStarted,
    SpeechEnded,

    /// A final transcript, forwarded exactly once in arrival order; the
    /// orchestrator appends it to the session transcript
    FinalTranscript(TranscriptEntry),

    /// Interim fragment for ephemeral "last heard" display only — never
    /// persisted to the transcript
    InterimTranscript(String),

    /// Agent fault: logged and forwarded, forces no state transition
    Fault(String),
}

/// Adapter between the external agent and the session orchestrator.
///
/// Constructed explicitly and injected into the session; the forwarding
/// task's lifetime is tied to this instance, not to any UI lifecycle.
/// The gateway performs no buffering of its own.
pub struct VoiceAgentGateway {
    client: Arc<dyn VoiceAgentClient>,
    forward_task: Option<JoinHandle<()>>,
}

impl VoiceAgentGateway {
    pub fn new(client: Arc<dyn VoiceAgentClient>) -> Self {
        Self {
            client,
            forward_task: None,
        }
    }

    /// Open the event stream and translate agent events into
    /// [`GatewayEvent`]s until unsubscribed.
    pub async fn subscribe(&mut self) -> Result<mpsc::Receiver<GatewayEvent>, AgentError> {
        let mut raw = self.client.subscribe().await?;
        let (tx, rx) = mpsc::channel(GATEWAY_CHANNEL_CAPACITY);

        self.forward_task = Some(tokio::spawn(async move {
            while let Some(event) = raw.recv().await {
                let mapped = translate(event);

                if let Some(event) = mapped {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
            }
        }));

        Ok(rx)
    }

    /// Ask the agent to begin the call, parameterized with the session's
    /// question list.
    pub async fn start(&self, questions: &[String]) -> Result<(), AgentError> {
        let overrides = AssistantOverrides {
            variable_values: VariableValues {
                questions: format_questions(questions),
            },
        };

        self.client.start(overrides).await
    }

    /// Ask the agent to end the call. Fire-and-forget from the session's
    /// perspective — this never blocks the teardown critical path.
    pub async fn stop(&self) -> Result<(), AgentError> {
        self.client.stop().await
    }

    /// Detach from the event stream. Called when the session ends or is
    /// torn down.
    pub fn unsubscribe(&mut self) {
        if let Some(task) = self.forward_task.take() {
            task.abort();
        }
    }
}

impl Drop for VoiceAgentGateway {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

fn translate(event: AgentEvent) -> Option<GatewayEvent> {
    match event {
        AgentEvent::CallStart => Some(GatewayEvent::CallStarted),
        AgentEvent::CallEnd => Some(GatewayEvent::CallEnded),
        AgentEvent::SpeechStart => Some(GatewayEvent::SpeechStarted),
        AgentEvent::SpeechEnd => Some(GatewayEvent::SpeechEnded),
        AgentEvent::Message(msg) => match (msg.kind, msg.transcript_type) {
            (MessageKind::Transcript, TranscriptType::Final) => Some(GatewayEvent::FinalTranscript(
                TranscriptEntry::new(msg.role, msg.transcript),
            )),
            (MessageKind::Transcript, TranscriptType::Partial) => {
                Some(GatewayEvent::InterimTranscript(msg.transcript))
            }
            _ => None,
        },
        AgentEvent::Error { message } => {
            warn!("Voice agent error (non-fatal): {}", message);
            Some(GatewayEvent::Fault(message))
        }
    }
}
