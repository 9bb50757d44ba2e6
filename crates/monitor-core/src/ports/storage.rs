use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::session::SessionId;

/// Path-keyed object storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn write(&self, path: &str, payload: Vec<u8>) -> Result<()>;

    async fn exists(&self, path: &str) -> Result<bool>;

    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Short backend label for log lines.
    fn describe(&self) -> String;
}

/// Previously recorded workflows for a session. Empty when there are none.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn load_workflows(&self, id: &SessionId) -> Result<Vec<Value>>;
}
