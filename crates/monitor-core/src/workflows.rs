use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::paths;
use crate::ports::{BlobStore, WorkflowStore};
use crate::session::SessionId;

/// Reads `workflows/{id}.json` (`{"workflows": [...]}`) from a blob store.
pub struct BlobWorkflowStore {
    store: Arc<dyn BlobStore>,
}

impl BlobWorkflowStore {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl WorkflowStore for BlobWorkflowStore {
    async fn load_workflows(&self, id: &SessionId) -> Result<Vec<Value>> {
        let path = paths::workflows(id);
        if !self.store.exists(&path).await? {
            return Ok(Vec::new());
        }
        let raw = self.store.read(&path).await?;
        let doc: Value = serde_json::from_slice(&raw)
            .with_context(|| format!("invalid workflow document {}", path))?;
        let workflows = doc
            .get("workflows")
            .and_then(|w| w.as_array())
            .cloned()
            .unwrap_or_default();
        Ok(workflows)
    }
}

/// Used when no workflow source is configured.
pub struct NoWorkflows;

#[async_trait]
impl WorkflowStore for NoWorkflows {
    async fn load_workflows(&self, _id: &SessionId) -> Result<Vec<Value>> {
        Ok(Vec::new())
    }
}
