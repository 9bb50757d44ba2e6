use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::session::{ConversationSummary, Transcript};

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// `Ok(None)` when the transcript is declined (too little content).
    async fn summarize(&self, transcript: &Transcript) -> Result<Option<ConversationSummary>>;
}

#[async_trait]
pub trait SkillSynthesizer: Send + Sync {
    /// Only called when at least one of `summary` / `workflows` is present.
    async fn synthesize(
        &self,
        summary: Option<&ConversationSummary>,
        workflows: &[Value],
    ) -> Result<Option<String>>;
}
