pub mod storage;
pub mod summarizer;

pub use storage::{BlobStore, WorkflowStore};
pub use summarizer::{Summarizer, SkillSynthesizer};

use anyhow::Result;
use async_trait::async_trait;

use crate::session::{SessionId, Transcript};

/// Upstream analytics API: which sessions exist and what was said in them.
#[async_trait]
pub trait SessionSource: Send + Sync {
    async fn list_session_ids(&self) -> Result<Vec<SessionId>>;

    /// `Ok(None)` when the upstream has no transcript for the session yet.
    async fn get_transcript(&self, id: &SessionId) -> Result<Option<Transcript>>;
}
