use anyhow::Result;
use async_trait::async_trait;

/// A generative model that turns one prompt into text.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// `json` asks the model for a bare JSON object.
    async fn generate(&self, prompt: &str, json: bool) -> Result<String>;

    /// Model name for log lines.
    fn name(&self) -> &str;
}
