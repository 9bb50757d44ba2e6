use anyhow::{Context, Result, anyhow};
use reqwest::Client as Http;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Clone, Debug)]
pub enum Provider {
    Gemini,
}

#[derive(Clone, Debug)]
pub struct Client {
    http: Http,
    provider: Provider,
    api_key: String,
    model: String,
    base_url: String, // provider-specific default, overridable for tests/proxies
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role { System, User, Assistant }

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Clone, Debug, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    /// If true, ask for `application/json` output.
    pub json_object: bool,
}

impl Client {
    pub fn new(provider: Provider, api_key: String, model: String, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(anyhow!("generative model API key is empty"));
        }
        let base_url = match provider {
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta".to_string(),
        };
        Ok(Self {
            http: Http::builder().pool_max_idle_per_host(8).timeout(timeout).build()?,
            provider, api_key, model, base_url,
        })
    }

    /// Convenience: pick up GEMINI_API_KEY from env.
    pub fn from_env_gemini(model: &str) -> Result<Self> {
        let key = std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY not set")?;
        Self::new(Provider::Gemini, key, model.to_string(), Duration::from_secs(60))
    }

    /// Point at a proxy or local stub instead of the public endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn chat(&self, messages: &[ChatMessage], opts: ChatOptions) -> Result<String> {
        match self.provider {
            Provider::Gemini => self.chat_gemini(messages, opts).await,
        }
    }

    async fn chat_gemini(&self, messages: &[ChatMessage], opts: ChatOptions) -> Result<String> {
        let url = self.generate_url();
        let body = gemini_request_body(messages, &opts);

        let resp = self.http.post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send().await
            .context("request failed")?;

        if !resp.status().is_success() {
            return Err(anyhow!("gemini {}: {}", resp.status(), resp.text().await.unwrap_or_default()));
        }

        let v: Value = resp.json().await.context("invalid json")?;
        tracing::debug!(model = %self.model, "gemini response received");
        gemini_response_text(&v)
    }

    /// Simple helper for one-shot prompts.
    pub async fn simple(&self, prompt: &str) -> Result<String> {
        let msgs = vec![ChatMessage{ role: Role::User, content: prompt.to_string() }];
        self.chat(&msgs, ChatOptions::default()).await
    }
}

/// System messages become `systemInstruction`; assistant turns use the `model` role.
pub fn gemini_request_body(messages: &[ChatMessage], opts: &ChatOptions) -> Value {
    let system: Vec<Value> = messages.iter()
        .filter(|m| m.role == Role::System)
        .map(|m| json!({ "text": m.content }))
        .collect();

    let contents: Vec<Value> = messages.iter()
        .filter(|m| m.role != Role::System)
        .map(|m| {
            let role = match m.role { Role::Assistant => "model", _ => "user" };
            json!({ "role": role, "parts": [{ "text": m.content }] })
        })
        .collect();

    let mut generation = json!({ "temperature": opts.temperature.unwrap_or(0.2) });
    if opts.json_object {
        generation["responseMimeType"] = json!("application/json");
    }

    let mut body = json!({
        "contents": contents,
        "generationConfig": generation,
    });
    if !system.is_empty() {
        body["systemInstruction"] = json!({ "parts": system });
    }
    body
}

/// Concatenates the text parts of the first candidate.
pub fn gemini_response_text(v: &Value) -> Result<String> {
    let parts = v.pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| {
            let reason = v.pointer("/promptFeedback/blockReason")
                .and_then(|r| r.as_str())
                .unwrap_or("no candidates");
            anyhow!("missing candidates[0].content.parts ({})", reason)
        })?;
    let text: String = parts.iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();
    if text.is_empty() {
        return Err(anyhow!("empty model response"));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_moves_to_system_instruction() {
        let msgs = vec![
            ChatMessage { role: Role::System, content: "be brief".into() },
            ChatMessage { role: Role::User, content: "hi".into() },
            ChatMessage { role: Role::Assistant, content: "hello".into() },
        ];
        let body = gemini_request_body(&msgs, &ChatOptions { temperature: None, json_object: true });

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(body["contents"].as_array().unwrap().len(), 2);
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn plain_prompt_has_no_system_instruction() {
        let msgs = vec![ChatMessage { role: Role::User, content: "hi".into() }];
        let body = gemini_request_body(&msgs, &ChatOptions::default());
        assert!(body.get("systemInstruction").is_none());
        assert!(body["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn response_text_joins_parts() {
        let v = json!({"candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": "1}"}]}}]});
        assert_eq!(gemini_response_text(&v).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn blocked_prompt_is_an_error() {
        let v = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let err = gemini_response_text(&v).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn base_url_can_be_overridden() {
        let client = Client::new(Provider::Gemini, "k".into(), DEFAULT_MODEL.into(), Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );

        let client = client.with_base_url("http://localhost:9090/v1beta/");
        assert_eq!(client.generate_url(), "http://localhost:9090/v1beta/models/gemini-2.5-flash:generateContent");
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(Client::new(Provider::Gemini, " ".into(), DEFAULT_MODEL.into(), Duration::from_secs(5)).is_err());
    }
}
