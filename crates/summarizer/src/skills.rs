use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use monitor_core::ports::SkillSynthesizer;
use monitor_core::ConversationSummary;

use crate::extractors::json::strip_markdown_fences;
use crate::prompts::skill_prompt;
use crate::traits::TextModel;

/// Turns an interview summary and recorded workflows into a Markdown skill file.
pub struct SkillGenerator {
    model: Arc<dyn TextModel>,
}

impl SkillGenerator {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        info!(model = model.name(), "skill generator ready");
        Self { model }
    }
}

#[async_trait]
impl SkillSynthesizer for SkillGenerator {
    async fn synthesize(
        &self,
        summary: Option<&ConversationSummary>,
        workflows: &[Value],
    ) -> Result<Option<String>> {
        if summary.is_none() && workflows.is_empty() {
            warn!("no summary or workflows provided, skipping skill generation");
            return Ok(None);
        }

        let summary_text = match summary {
            Some(s) => serde_json::to_string_pretty(s).context("failed to encode summary")?,
            None => "No summary available".to_string(),
        };
        let workflows_text = if workflows.is_empty() {
            "No workflows identified".to_string()
        } else {
            serde_json::to_string_pretty(workflows).context("failed to encode workflows")?
        };

        let reply = self.model.generate(&skill_prompt(&summary_text, &workflows_text), false).await?;
        let content = strip_markdown_fences(&reply);
        if content.is_empty() {
            warn!("model returned an empty skill file");
            return Ok(None);
        }
        info!(bytes = content.len(), "generated skill file");
        Ok(Some(content))
    }
}
