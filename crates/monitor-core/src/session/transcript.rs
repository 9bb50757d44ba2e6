use serde::{Deserialize, Serialize};

use super::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Agent,
    User,
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "agent" => Role::Agent,
            "user" => Role::User,
            _ => Role::Unknown,
        }
    }
}

/// One utterance of a conversation. `timestamp` is milliseconds since the epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub text: String,
    pub role: Role,
    pub timestamp: i64,
}

impl TranscriptEntry {
    pub fn new<S: Into<String>>(role: Role, text: S, timestamp: i64) -> Self {
        Self { text: text.into(), role, timestamp }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub session_id: SessionId,
    pub entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new(session_id: SessionId, entries: Vec<TranscriptEntry>) -> Self {
        Self { session_id, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn user_turns(&self) -> usize {
        self.entries.iter().filter(|e| e.role == Role::User).count()
    }

    /// At least one user turn and two entries overall.
    pub fn has_meaningful_content(&self) -> bool {
        self.user_turns() >= 1 && self.entries.len() >= 2
    }

    pub fn to_conversation_text(&self) -> String {
        self.entries
            .iter()
            .map(|entry| {
                let speaker = match entry.role {
                    Role::Agent => "AI Assistant",
                    _ => "User",
                };
                format!("{}: {}", speaker, entry.text)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn first_timestamp(&self) -> Option<i64> {
        self.entries.first().map(|e| e.timestamp)
    }
}
