use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Mutex;

use crate::traits::TextModel;

/// Mock model for testing: replays queued replies and records prompts.
pub struct MockModel {
    replies: Mutex<Vec<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockModel {
    pub fn new() -> Self {
        Self { replies: Mutex::new(Vec::new()), prompts: Mutex::new(Vec::new()) }
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push(Ok(text.to_string()));
        self
    }

    pub fn fail(self, error: &str) -> Self {
        self.replies.lock().unwrap().push(Err(error.to_string()));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextModel for MockModel {
    async fn generate(&self, prompt: &str, _json: bool) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(anyhow!("mock model has no reply queued"));
        }
        replies.remove(0).map_err(|e| anyhow!(e))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
