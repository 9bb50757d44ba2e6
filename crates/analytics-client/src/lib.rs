//! Client for the Spaces analytics endpoints that expose interview sessions.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use monitor_core::ports::SessionSource;
use monitor_core::{Role, SessionId, Transcript, TranscriptEntry};

pub const DEFAULT_BASE_URL: &str = "https://spaces-api.napsterai.dev/v1/experiences";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionsResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    session_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    #[serde(default)]
    success: bool,
    transcript: Option<Vec<RawEntry>>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    text: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    timestamp: i64,
}

#[derive(Clone)]
pub struct SpacesClient {
    http: reqwest::Client,
    base_url: String,
    experience_id: String,
}

impl SpacesClient {
    pub fn new(api_key: &str, experience_id: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key).context("API key is not a valid header value")?;
        key.set_sensitive(true);
        headers.insert("X-API-Key", key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            experience_id: experience_id.into(),
        })
    }

    fn sessions_url(&self) -> String {
        format!("{}/{}/analytics/sessions", self.base_url, self.experience_id)
    }

    fn transcript_url(&self, id: &SessionId) -> String {
        format!("{}/{}/analytics/transcripts/{}", self.base_url, self.experience_id, id.as_str())
    }

    async fn get_json(&self, url: String) -> Result<serde_json::Value> {
        let resp = self.http.get(&url).send().await.context("request failed")?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("analytics API {}: {}", status, resp.text().await.unwrap_or_default()));
        }
        resp.json().await.context("invalid json")
    }
}

/// `{"success": true, "sessionIds": [...]}`. An unsuccessful body is an error.
pub fn parse_sessions(body: serde_json::Value) -> Result<Vec<SessionId>> {
    let resp: SessionsResponse = serde_json::from_value(body.clone()).context("unexpected sessions payload")?;
    if !resp.success {
        return Err(anyhow!("API returned unsuccessful response: {}", body));
    }
    Ok(resp.session_ids.into_iter().map(SessionId::from).collect())
}

/// `{"success": true, "transcript": [{text, role, timestamp}]}`. Anything else means
/// the transcript is not available yet.
pub fn parse_transcript(id: &SessionId, body: serde_json::Value) -> Result<Option<Transcript>> {
    let resp: TranscriptResponse = serde_json::from_value(body).context("unexpected transcript payload")?;
    let raw = match (resp.success, resp.transcript) {
        (true, Some(raw)) => raw,
        _ => return Ok(None),
    };
    let entries = raw
        .into_iter()
        .map(|e| TranscriptEntry::new(Role::parse(&e.role), e.text, e.timestamp))
        .collect();
    Ok(Some(Transcript::new(id.clone(), entries)))
}

#[async_trait]
impl SessionSource for SpacesClient {
    async fn list_session_ids(&self) -> Result<Vec<SessionId>> {
        let body = self.get_json(self.sessions_url()).await.context("failed to get sessions")?;
        let ids = parse_sessions(body)?;
        info!(count = ids.len(), "retrieved sessions");
        Ok(ids)
    }

    async fn get_transcript(&self, id: &SessionId) -> Result<Option<Transcript>> {
        let body = self
            .get_json(self.transcript_url(id))
            .await
            .with_context(|| format!("failed to get transcript for {}", id.short()))?;
        let transcript = parse_transcript(id, body)?;
        match &transcript {
            Some(t) => info!(session = %id.short(), entries = t.len(), "retrieved transcript"),
            None => warn!(session = %id.short(), "no transcript available"),
        }
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_session_list() {
        let ids = parse_sessions(json!({"success": true, "sessionIds": ["a", "b"]})).unwrap();
        assert_eq!(ids, vec![SessionId::new("a"), SessionId::new("b")]);
    }

    #[test]
    fn unsuccessful_session_list_is_an_error() {
        assert!(parse_sessions(json!({"success": false, "error": "bad key"})).is_err());
        assert!(parse_sessions(json!({"sessionIds": ["a"]})).is_err());
    }

    #[test]
    fn parses_transcript_entries_with_defaults() {
        let id = SessionId::new("s1");
        let body = json!({
            "success": true,
            "transcript": [
                {"text": "Tell me about your day", "role": "agent", "timestamp": 1000},
                {"text": "I reconcile invoices", "role": "user", "timestamp": 2000},
                {"role": "user"}
            ]
        });
        let t = parse_transcript(&id, body).unwrap().unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.entries[0].role, Role::Agent);
        assert_eq!(t.entries[1].text, "I reconcile invoices");
        assert_eq!(t.entries[2].text, "");
        assert_eq!(t.entries[2].timestamp, 0);
        assert_eq!(t.first_timestamp(), Some(1000));
    }

    #[test]
    fn missing_transcript_is_absent_not_error() {
        let id = SessionId::new("s1");
        assert!(parse_transcript(&id, json!({"success": true})).unwrap().is_none());
        assert!(parse_transcript(&id, json!({"success": false, "transcript": []})).unwrap().is_none());
    }

    #[test]
    fn urls_include_experience() {
        let client = SpacesClient::new("key", "exp-1", "https://example.test/v1/experiences/").unwrap();
        assert_eq!(client.sessions_url(), "https://example.test/v1/experiences/exp-1/analytics/sessions");
        assert_eq!(
            client.transcript_url(&SessionId::new("s1")),
            "https://example.test/v1/experiences/exp-1/analytics/transcripts/s1"
        );
    }
}
