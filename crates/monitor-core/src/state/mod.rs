//! Durable record of which sessions have been handled.
//!
//! The processed set is stored as one JSON document in an ordered list of
//! backends. Reads walk the list and take the first non-empty set; writes
//! overwrite the whole document in every backend. There is no cross-process
//! locking: only one driver may run against a given state location.

pub mod backend;

pub use backend::{BlobStateBackend, FileStateBackend, StateBackend};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::session::SessionId;

/// Default object path of the state document in the durable store.
pub const DEFAULT_STATE_BLOB: &str = "session_monitor/processed_sessions.json";

/// On-disk form: `{"processed_sessions": [...], "last_updated": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub processed_sessions: Vec<SessionId>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl PersistedState {
    pub fn decode(raw: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw).context("invalid processed-sessions JSON")
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).context("failed to encode processed-sessions state")
    }
}

/// Sessions that have reached mark-processed. Membership only grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedSet(BTreeSet<SessionId>);

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.0.contains(id)
    }

    /// Returns false if the id was already present.
    pub fn insert(&mut self, id: SessionId) -> bool {
        self.0.insert(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionId> {
        self.0.iter()
    }

    pub fn to_state(&self) -> PersistedState {
        PersistedState {
            processed_sessions: self.0.iter().cloned().collect(),
            last_updated: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        }
    }
}

impl From<PersistedState> for ProcessedSet {
    fn from(state: PersistedState) -> Self {
        state.processed_sessions.into_iter().collect()
    }
}

impl FromIterator<SessionId> for ProcessedSet {
    fn from_iter<I: IntoIterator<Item = SessionId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

pub struct StateTracker {
    backends: Vec<Arc<dyn StateBackend>>,
}

impl StateTracker {
    /// `backends` are consulted in order on load; the first is the authoritative one.
    pub fn new(backends: Vec<Arc<dyn StateBackend>>) -> Self {
        Self { backends }
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Never fails. Unreachable, absent, malformed and empty documents are all
    /// skipped, so the worst case is an empty set and some reprocessing.
    pub async fn load(&self) -> ProcessedSet {
        for backend in &self.backends {
            match backend.load().await {
                Ok(Some(state)) => {
                    let set = ProcessedSet::from(state);
                    if set.is_empty() {
                        debug!(backend = backend.name(), "state document is empty, trying next backend");
                        continue;
                    }
                    info!(backend = backend.name(), count = set.len(), "loaded processed sessions");
                    return set;
                }
                Ok(None) => {
                    debug!(backend = backend.name(), "no state document");
                }
                Err(e) => {
                    warn!(backend = backend.name(), error = %format!("{:#}", e), "failed to load state");
                }
            }
        }
        ProcessedSet::new()
    }

    /// Overwrites the document in every backend concurrently. Returns how many
    /// backends accepted the write; failures are logged only.
    pub async fn save(&self, set: &ProcessedSet) -> usize {
        let state = set.to_state();
        let writes = self.backends.iter().map(|backend| {
            let state = &state;
            async move {
                match backend.save(state).await {
                    Ok(()) => {
                        info!(backend = backend.name(), count = state.processed_sessions.len(), "saved state");
                        true
                    }
                    Err(e) => {
                        error!(backend = backend.name(), error = %format!("{:#}", e), "failed to save state");
                        false
                    }
                }
            }
        });
        let written = join_all(writes).await.into_iter().filter(|ok| *ok).count();
        if written == 0 && !self.backends.is_empty() {
            error!("processed-session state was not persisted to any backend");
        }
        written
    }

    /// Read-modify-write of a single id. Not atomic across processes.
    pub async fn mark_processed(&self, id: &SessionId) -> ProcessedSet {
        let mut set = self.load().await;
        set.insert(id.clone());
        self.save(&set).await;
        set
    }
}
