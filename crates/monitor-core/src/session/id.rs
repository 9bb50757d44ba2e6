use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of characters kept when a session id is shown in logs.
pub const SHORT_ID_LEN: usize = 20;

/// Opaque identifier of one recorded conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Truncated form for log lines. Keys and comparisons always use the full id.
    pub fn short(&self) -> String {
        if self.0.chars().count() <= SHORT_ID_LEN {
            return self.0.clone();
        }
        let head: String = self.0.chars().take(SHORT_ID_LEN).collect();
        format!("{}...", head)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
