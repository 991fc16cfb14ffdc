use serde::{Deserialize, Serialize};

/// Speaker attribution for a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One attributed utterance in conversation order
///
/// The session transcript is append-only: entries are pushed strictly in the
/// order the gateway delivers them, and the analyzer depends on that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Who said it
    pub role: Role,

    /// What was said (final transcript text, never interim fragments)
    pub content: String,
}

impl TranscriptEntry {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}
