use serde::{Deserialize, Serialize};

use crate::transcript::Role;

/// Event stream delivered by the external conversational agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum AgentEvent {
    CallStart,
    CallEnd,
    SpeechStart,
    SpeechEnd,
    Message(AgentMessage),
    Error { message: String },
}

/// Payload of a `message` event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,

    pub transcript_type: TranscriptType,

    pub role: Role,

    pub transcript: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Transcript,

    /// Forward-compatible catch-all; anything but final transcripts is
    /// ignored by the gateway
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptType {
    Partial,
    Final,
}

/// Start command payload: the assistant template is parameterized with the
/// formatted question list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantOverrides {
    pub variable_values: VariableValues,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableValues {
    pub questions: String,
}

/// Render the fixed question list the way the assistant template expects:
/// one `- question` line per entry.
pub fn format_questions(questions: &[String]) -> String {
    questions
        .iter()
        .map(|q| format!("- {}", q))
        .collect::<Vec<_>>()
        .join("\n")
}
