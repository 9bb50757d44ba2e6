use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SessionId;

/// Structured analysis of one employee workflow interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub session_id: SessionId,
    #[serde(default)]
    pub employee_profile: Value,
    #[serde(default)]
    pub workflow_analysis: Value,
    #[serde(default)]
    pub conversation_quality: Value,
    #[serde(default)]
    pub key_insights: Vec<String>,
    #[serde(default)]
    pub suggested_actions: Vec<String>,
    #[serde(default)]
    pub overall_summary: String,
}

impl ConversationSummary {
    pub fn new(session_id: SessionId, overall_summary: impl Into<String>) -> Self {
        Self {
            session_id,
            employee_profile: Value::Object(Default::default()),
            workflow_analysis: Value::Object(Default::default()),
            conversation_quality: Value::Object(Default::default()),
            key_insights: Vec::new(),
            suggested_actions: Vec::new(),
            overall_summary: overall_summary.into(),
        }
    }
}
