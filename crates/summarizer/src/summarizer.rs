use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use monitor_core::ports::Summarizer;
use monitor_core::{ConversationSummary, Transcript};

use crate::extractors::json::parse_summary;
use crate::prompts::summary_prompt;
use crate::traits::TextModel;

/// Summarizes interview transcripts with a generative model.
pub struct GeminiSummarizer {
    model: Arc<dyn TextModel>,
}

impl GeminiSummarizer {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        info!(model = model.name(), "summarizer ready");
        Self { model }
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, transcript: &Transcript) -> Result<Option<ConversationSummary>> {
        let id = &transcript.session_id;
        if !transcript.has_meaningful_content() {
            warn!(session = %id.short(), entries = transcript.len(), "insufficient content, skipping summary");
            return Ok(None);
        }

        let prompt = summary_prompt(&transcript.to_conversation_text());
        let reply = self.model.generate(&prompt, true).await?;
        let summary = parse_summary(id, &reply).inspect_err(|_| {
            let preview: String = reply.chars().take(500).collect();
            debug!(session = %id.short(), response = %preview, "unparseable summary response");
        })?;

        info!(session = %id.short(), "summarized session");
        Ok(Some(summary))
    }
}
