use async_nats::Client;
use futures::stream::StreamExt;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::events::{AgentEvent, AssistantOverrides};
use super::AgentError;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Command/event boundary to the external conversational agent.
///
/// The core never implements the agent's dialogue logic; this is an opaque
/// bidirectional channel carrying `start`/`stop` commands one way and the
/// call event stream the other.
#[async_trait::async_trait]
pub trait VoiceAgentClient: Send + Sync {
    async fn start(&self, overrides: AssistantOverrides) -> Result<(), AgentError>;

    async fn stop(&self) -> Result<(), AgentError>;

    /// Open the event stream for this session's call
    async fn subscribe(&self) -> Result<mpsc::Receiver<AgentEvent>, AgentError>;
}

/// Agent client over NATS subjects
pub struct NatsAgentClient {
    client: Client,
    session_id: String,
}

impl NatsAgentClient {
    /// Connect to the NATS server carrying the agent channel
    pub async fn connect(url: &str, session_id: String) -> Result<Self, AgentError> {
        info!("Connecting to voice agent channel at {}", url);

        let client = async_nats::connect(url)
            .await
            .map_err(|e| AgentError::Connect(e.to_string()))?;

        info!("Connected to voice agent channel");

        Ok(Self { client, session_id })
    }

    fn command_subject(&self, command: &str) -> String {
        format!("agent.call.{}.{}", command, self.session_id)
    }

    fn events_subject(&self) -> String {
        format!("agent.events.{}", self.session_id)
    }
}

#[async_trait::async_trait]
impl VoiceAgentClient for NatsAgentClient {
    async fn start(&self, overrides: AssistantOverrides) -> Result<(), AgentError> {
        let payload =
            serde_json::to_vec(&overrides).map_err(|e| AgentError::Command(e.to_string()))?;

        self.client
            .publish(self.command_subject("start"), payload.into())
            .await
            .map_err(|e| AgentError::Command(e.to_string()))?;

        info!("Agent start command published");

        Ok(())
    }

    async fn stop(&self) -> Result<(), AgentError> {
        self.client
            .publish(self.command_subject("stop"), Vec::new().into())
            .await
            .map_err(|e| AgentError::Command(e.to_string()))?;

        info!("Agent stop command published");

        Ok(())
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<AgentEvent>, AgentError> {
        let subject = self.events_subject();

        info!("Subscribing to agent events on {}", subject);

        let mut subscriber = self
            .client
            .subscribe(subject)
            .await
            .map_err(|e| AgentError::Subscribe(e.to_string()))?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            while let Some(msg) = subscriber.next().await {
                match serde_json::from_slice::<AgentEvent>(&msg.payload) {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to parse agent event: {}", e);
                    }
                }
            }
        });

        Ok(rx)
    }
}
