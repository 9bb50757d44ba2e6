use anyhow::Result;
use async_trait::async_trait;

use crate::traits::TextModel;

#[async_trait]
impl TextModel for llm::Client {
    async fn generate(&self, prompt: &str, json: bool) -> Result<String> {
        let messages = vec![llm::ChatMessage {
            role: llm::Role::User,
            content: prompt.to_string(),
        }];
        let opts = llm::ChatOptions { temperature: Some(0.2), json_object: json };
        self.chat(&messages, opts).await
    }

    fn name(&self) -> &str {
        self.model()
    }
}
