use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;
use url::Url;

use monitor_core::ports::BlobStore;

use crate::token::TokenSource;

const API_ROOT: &str = "https://storage.googleapis.com";

/// Google Cloud Storage bucket accessed through the JSON API.
pub struct GcsBlobStore {
    http: reqwest::Client,
    bucket: String,
    api_root: String,
    tokens: TokenSource,
}

impl GcsBlobStore {
    pub fn new(bucket: impl Into<String>, tokens: TokenSource, timeout: Duration) -> Result<Self> {
        let bucket = bucket.into();
        if bucket.trim().is_empty() {
            return Err(anyhow!("bucket name is empty"));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, bucket, api_root: API_ROOT.to_string(), tokens })
    }

    /// Point at an emulator or proxy instead of the public endpoint.
    pub fn with_api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = api_root.into().trim_end_matches('/').to_string();
        self
    }

    /// `{root}/storage/v1/b/{bucket}/o/{object}` with the object name as one encoded segment.
    pub fn object_url(&self, path: &str) -> Result<Url> {
        let mut url = Url::parse(&self.api_root).context("invalid storage API root")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("storage API root cannot be a base URL"))?
            .pop_if_empty()
            .extend(["storage", "v1", "b", self.bucket.as_str(), "o", path]);
        Ok(url)
    }

    /// `{root}/upload/storage/v1/b/{bucket}/o?uploadType=media&name={object}`.
    pub fn upload_url(&self, path: &str) -> Result<Url> {
        let mut url = Url::parse(&self.api_root).context("invalid storage API root")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("storage API root cannot be a base URL"))?
            .pop_if_empty()
            .extend(["upload", "storage", "v1", "b", self.bucket.as_str(), "o"]);
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", path);
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response> {
        let token = self.tokens.token().await.context("no storage credentials")?;
        self.http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .context("storage request failed")
    }
}

#[async_trait]
impl BlobStore for GcsBlobStore {
    async fn write(&self, path: &str, payload: Vec<u8>) -> Result<()> {
        let token = self.tokens.token().await.context("no storage credentials")?;
        let resp = self
            .http
            .post(self.upload_url(path)?)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .context("storage upload failed")?;
        if !resp.status().is_success() {
            return Err(anyhow!("upload of gs://{}/{} returned {}: {}",
                self.bucket, path, resp.status(), resp.text().await.unwrap_or_default()));
        }
        debug!(bucket = %self.bucket, path, "uploaded object");
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let resp = self.get(self.object_url(path)?).await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            s => Err(anyhow!("metadata lookup of gs://{}/{} returned {}", self.bucket, path, s)),
        }
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let mut url = self.object_url(path)?;
        url.query_pairs_mut().append_pair("alt", "media");
        let resp = self.get(url).await?;
        if !resp.status().is_success() {
            return Err(anyhow!("download of gs://{}/{} returned {}", self.bucket, path, resp.status()));
        }
        Ok(resp.bytes().await.context("failed to read object body")?.to_vec())
    }

    fn describe(&self) -> String {
        format!("gs://{}", self.bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> GcsBlobStore {
        GcsBlobStore::new("ai-interviewer-sessions", TokenSource::fixed("t"), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn object_name_is_a_single_encoded_segment() {
        let url = store().object_url("session_monitor/processed_sessions.json").unwrap();
        assert_eq!(
            url.as_str(),
            "https://storage.googleapis.com/storage/v1/b/ai-interviewer-sessions/o/session_monitor%2Fprocessed_sessions.json"
        );
    }

    #[test]
    fn upload_url_carries_name_in_query() {
        let url = store().upload_url("skills/s1.json").unwrap();
        assert_eq!(url.path(), "/upload/storage/v1/b/ai-interviewer-sessions/o");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("uploadType".into(), "media".into())));
        assert!(pairs.contains(&("name".into(), "skills/s1.json".into())));
    }

    #[test]
    fn api_root_can_point_at_an_emulator() {
        let url = store().with_api_root("http://localhost:4443/").object_url("a.json").unwrap();
        assert_eq!(url.as_str(), "http://localhost:4443/storage/v1/b/ai-interviewer-sessions/o/a.json");
        assert_eq!(store().describe(), "gs://ai-interviewer-sessions");
    }

    #[test]
    fn empty_bucket_is_rejected() {
        assert!(GcsBlobStore::new(" ", TokenSource::fixed("t"), Duration::from_secs(5)).is_err());
    }
}
