use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use super::PersistedState;
use crate::ports::BlobStore;

/// One place the processed-session document can live.
///
/// `load` returns `Ok(None)` when the document does not exist, and `Err` when the
/// backend is unreachable or the document cannot be decoded.
#[async_trait]
pub trait StateBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn load(&self) -> Result<Option<PersistedState>>;

    async fn save(&self, state: &PersistedState) -> Result<()>;
}

/// State document stored as an object in the durable blob store.
pub struct BlobStateBackend {
    store: Arc<dyn BlobStore>,
    path: String,
    name: String,
}

impl BlobStateBackend {
    pub fn new(store: Arc<dyn BlobStore>, path: impl Into<String>) -> Self {
        let path = path.into();
        let name = format!("{}/{}", store.describe(), path);
        Self { store, path, name }
    }
}

#[async_trait]
impl StateBackend for BlobStateBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<Option<PersistedState>> {
        if !self.store.exists(&self.path).await? {
            return Ok(None);
        }
        let raw = self.store.read(&self.path).await?;
        let state = PersistedState::decode(&raw)
            .with_context(|| format!("malformed state document at {}", self.name))?;
        Ok(Some(state))
    }

    async fn save(&self, state: &PersistedState) -> Result<()> {
        self.store.write(&self.path, state.encode()?).await
    }
}

/// State document kept on the local filesystem.
pub struct FileStateBackend {
    path: PathBuf,
    name: String,
}

impl FileStateBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("file:{}", path.display());
        Self { path, name }
    }
}

#[async_trait]
impl StateBackend for FileStateBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<Option<PersistedState>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("failed to read {}", self.path.display())),
        };
        let state = PersistedState::decode(&raw)
            .with_context(|| format!("malformed state document at {}", self.path.display()))?;
        Ok(Some(state))
    }

    async fn save(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        // Write beside the target and rename so a crash never leaves a torn document.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, state.encode()?)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}
