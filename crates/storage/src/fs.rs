use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use monitor_core::ports::BlobStore;

/// Blob store rooted at a local directory; blob paths map to relative file paths.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let rel = Path::new(path);
        let clean = rel.components().all(|c| matches!(c, Component::Normal(_)));
        if path.is_empty() || !clean {
            return Err(anyhow!("invalid blob path: {:?}", path));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn write(&self, path: &str, payload: Vec<u8>) -> Result<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&target, payload)
            .await
            .with_context(|| format!("failed to write {}", target.display()))
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let target = self.resolve(path)?;
        match tokio::fs::metadata(&target).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("failed to stat {}", target.display())),
        }
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let target = self.resolve(path)?;
        tokio::fs::read(&target)
            .await
            .with_context(|| format!("failed to read {}", target.display()))
    }

    fn describe(&self) -> String {
        format!("file://{}", self.root.display())
    }
}
