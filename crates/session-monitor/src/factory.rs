use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use analytics_client::SpacesClient;
use llm::{Client, Provider};
use monitor_core::ports::{BlobStore, SessionSource};
use monitor_core::state::{BlobStateBackend, FileStateBackend, StateBackend};
use monitor_core::workflows::BlobWorkflowStore;
use monitor_core::{MonitorPorts, SessionMonitor, StateTracker};
use storage::{FsBlobStore, GcsBlobStore, TokenSource};
use summarizer::{GeminiSummarizer, SkillGenerator, TextModel};

/// Wire the production collaborators described by `config`.
pub fn build_monitor(config: &crate::MonitorConfig) -> Result<SessionMonitor> {
    let model: Arc<dyn TextModel> = Arc::new(
        Client::new(
            Provider::Gemini,
            config.secrets.model_api_key.clone(),
            config.model.clone(),
            config.http_timeout,
        )
        .context("failed to build model client")?,
    );
    let source: Arc<dyn SessionSource> = Arc::new(SpacesClient::new(
        &config.secrets.analytics_api_key,
        config.experience_id.clone(),
        config.analytics_base_url.clone(),
    )?);
    let blobs = build_blob_store(config)?;
    let tracker = build_state_tracker(config, blobs.clone());

    info!(
        model = %config.model,
        blobs = %blobs.describe(),
        state = ?tracker.backend_names(),
        "session monitor configured"
    );

    let ports = MonitorPorts {
        source,
        summarizer: Arc::new(GeminiSummarizer::new(model.clone())),
        skills: Arc::new(SkillGenerator::new(model)),
        workflows: Arc::new(BlobWorkflowStore::new(blobs.clone())),
        blobs,
    };
    Ok(SessionMonitor::new(ports, tracker))
}

/// Cloud Storage when a bucket is configured, otherwise a local directory.
pub fn build_blob_store(config: &crate::MonitorConfig) -> Result<Arc<dyn BlobStore>> {
    match &config.gcs_bucket {
        Some(bucket) => {
            let tokens = match &config.gcs_access_token {
                Some(token) => TokenSource::fixed(token.clone()),
                None => TokenSource::metadata_with_timeout(config.http_timeout)
                    .context("failed to build metadata client")?,
            };
            Ok(Arc::new(GcsBlobStore::new(bucket.clone(), tokens, config.http_timeout)?))
        }
        None => Ok(Arc::new(FsBlobStore::new(config.local_blob_dir.clone()))),
    }
}

/// Durable copy first, local file second. Without a bucket only the file is used,
/// since the local blob directory would just duplicate it.
pub fn build_state_tracker(config: &crate::MonitorConfig, blobs: Arc<dyn BlobStore>) -> StateTracker {
    let mut backends: Vec<Arc<dyn StateBackend>> = Vec::new();
    if config.gcs_bucket.is_some() {
        backends.push(Arc::new(BlobStateBackend::new(blobs, config.gcs_state_blob.clone())));
    }
    backends.push(Arc::new(FileStateBackend::new(config.state_file.clone())));
    StateTracker::new(backends)
}
