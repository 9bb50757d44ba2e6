use anyhow::{Context, Result, anyhow};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use monitor_core::state::DEFAULT_STATE_BLOB;

pub const DEFAULT_EXPERIENCE_ID: &str =
    "YWIzZGI5ZWItMWIxOC00MzVlLTkxN2UtYTgzZjJiNDVmM2I1OjFiY2FiMGFkLTA4NDktNDdlMS04MjM0LTFhNDFhYTZmYzQ1Zg==";
pub const DEFAULT_BUCKET: &str = "ai-interviewer-sessions";
pub const DEFAULT_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_STATE_FILE: &str = "/tmp/processed_sessions.json";
pub const DEFAULT_BLOB_DIR: &str = "./session-data";

/// API credentials. Never printed.
#[derive(Clone)]
pub struct Secrets {
    pub analytics_api_key: String,
    pub model_api_key: String,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |s: &str| if s.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("Secrets")
            .field("analytics_api_key", &mask(&self.analytics_api_key))
            .field("model_api_key", &mask(&self.model_api_key))
            .finish()
    }
}

/// Everything the service needs, resolved once at startup and handed to constructors.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub secrets: Secrets,
    pub experience_id: String,
    pub analytics_base_url: String,
    pub check_interval: Duration,
    pub state_file: PathBuf,
    /// `None` keeps everything on the local filesystem.
    pub gcs_bucket: Option<String>,
    pub gcs_state_blob: String,
    /// Static bearer token for Cloud Storage; the metadata server is used otherwise.
    pub gcs_access_token: Option<String>,
    pub local_blob_dir: PathBuf,
    pub model: String,
    pub http_timeout: Duration,
}

impl MonitorConfig {
    /// Reads the process environment (after `.env`, if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let model_api_key = get("GEMINI_API_KEY").ok_or_else(|| {
            anyhow!("Gemini API key is required. Set GEMINI_API_KEY in the environment or .env")
        })?;
        let analytics_api_key = get("NAPSTER_API_KEY").unwrap_or_default();
        if analytics_api_key.is_empty() {
            tracing::warn!("NAPSTER_API_KEY is not set; analytics requests will be rejected");
        }

        let check_interval = match get("CHECK_INTERVAL_SECONDS") {
            Some(raw) => raw.parse::<u64>().context("CHECK_INTERVAL_SECONDS must be a whole number")?,
            None => DEFAULT_INTERVAL_SECS,
        };
        let http_timeout = match get("HTTP_TIMEOUT_SECONDS") {
            Some(raw) => raw.parse::<u64>().context("HTTP_TIMEOUT_SECONDS must be a whole number")?,
            None => 60,
        };

        // An explicitly empty GCS_BUCKET disables the durable store.
        let gcs_bucket = match lookup("GCS_BUCKET") {
            Some(raw) => Some(raw.trim().to_string()).filter(|b| !b.is_empty()),
            None => Some(DEFAULT_BUCKET.to_string()),
        };

        Ok(Self {
            secrets: Secrets { analytics_api_key, model_api_key },
            experience_id: get("EXPERIENCE_ID").unwrap_or_else(|| DEFAULT_EXPERIENCE_ID.to_string()),
            analytics_base_url: get("NAPSTER_API_BASE_URL")
                .unwrap_or_else(|| analytics_client::DEFAULT_BASE_URL.to_string()),
            check_interval: Duration::from_secs(check_interval),
            state_file: get("PROCESSED_SESSIONS_FILE")
                .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string())
                .into(),
            gcs_bucket,
            gcs_state_blob: get("GCS_STATE_BLOB").unwrap_or_else(|| DEFAULT_STATE_BLOB.to_string()),
            gcs_access_token: get("GCS_ACCESS_TOKEN"),
            local_blob_dir: get("LOCAL_BLOB_DIR").unwrap_or_else(|| DEFAULT_BLOB_DIR.to_string()).into(),
            model: get("GEMINI_MODEL").unwrap_or_else(|| llm::DEFAULT_MODEL.to_string()),
            http_timeout: Duration::from_secs(http_timeout),
        })
    }
}
