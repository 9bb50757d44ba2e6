use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Refresh this long before the metadata server says the token expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: u64,
}

/// Where Cloud Storage bearer tokens come from.
pub enum TokenSource {
    /// Fixed token, e.g. from `gcloud auth print-access-token`.
    Static(String),
    /// Service-account token from the GCE/Cloud Run metadata server, cached until near expiry.
    Metadata {
        http: reqwest::Client,
        cached: Mutex<Option<(String, Instant)>>,
    },
}

impl TokenSource {
    pub fn fixed(token: impl Into<String>) -> Self {
        TokenSource::Static(token.into())
    }

    pub fn metadata(http: reqwest::Client) -> Self {
        TokenSource::Metadata { http, cached: Mutex::new(None) }
    }

    /// Metadata-server source with its own client.
    pub fn metadata_with_timeout(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::metadata(http))
    }

    pub async fn token(&self) -> Result<String> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::Metadata { http, cached } => {
                let mut guard = cached.lock().await;
                if let Some((token, valid_until)) = guard.as_ref() {
                    if Instant::now() < *valid_until {
                        return Ok(token.clone());
                    }
                }
                let fresh = fetch_metadata_token(http).await?;
                let lifetime = Duration::from_secs(fresh.expires_in).saturating_sub(EXPIRY_MARGIN);
                *guard = Some((fresh.access_token.clone(), Instant::now() + lifetime));
                Ok(fresh.access_token)
            }
        }
    }
}

async fn fetch_metadata_token(http: &reqwest::Client) -> Result<MetadataToken> {
    let resp = http
        .get(METADATA_TOKEN_URL)
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .context("metadata server unreachable")?;
    if !resp.status().is_success() {
        return Err(anyhow!("metadata server returned {}", resp.status()));
    }
    resp.json().await.context("invalid metadata token response")
}
