use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::ports::{BlobStore, SessionSource, SkillSynthesizer, Summarizer, WorkflowStore};
use crate::session::{ConversationSummary, Role, SessionId, Transcript, TranscriptEntry};
use crate::state::{PersistedState, StateBackend};

/// Builds a transcript with `users` user turns and `agents` agent turns, agent first.
pub fn transcript_with(id: &str, users: usize, agents: usize) -> Transcript {
    let mut entries = Vec::new();
    let mut ts = 1_700_000_000_000i64;
    for i in 0..users.max(agents) {
        if i < agents {
            entries.push(TranscriptEntry::new(Role::Agent, format!("question {}", i), ts));
            ts += 1000;
        }
        if i < users {
            entries.push(TranscriptEntry::new(Role::User, format!("answer {}", i), ts));
            ts += 1000;
        }
    }
    Transcript::new(SessionId::new(id), entries)
}

/// Session source backed by fixed data. Counts transcript fetches per id.
#[derive(Default)]
pub struct StaticSource {
    ids: Mutex<Vec<SessionId>>,
    transcripts: Mutex<HashMap<SessionId, Transcript>>,
    failing: Mutex<HashSet<SessionId>>,
    unreachable: Mutex<bool>,
    panicking_lists: AtomicUsize,
    list_calls: AtomicUsize,
    fetches: Mutex<HashMap<SessionId, usize>>,
}

impl StaticSource {
    pub fn new(ids: &[&str]) -> Self {
        let source = Self::default();
        source.set_ids(ids);
        source
    }

    pub fn set_ids(&self, ids: &[&str]) {
        *self.ids.lock().unwrap() = ids.iter().map(|s| SessionId::new(*s)).collect();
    }

    pub fn with_transcript(self, transcript: Transcript) -> Self {
        self.add_transcript(transcript);
        self
    }

    pub fn add_transcript(&self, transcript: Transcript) {
        self.transcripts.lock().unwrap().insert(transcript.session_id.clone(), transcript);
    }

    pub fn fail_transcript(&self, id: &str) {
        self.failing.lock().unwrap().insert(SessionId::new(id));
    }

    pub fn set_unreachable(&self, down: bool) {
        *self.unreachable.lock().unwrap() = down;
    }

    /// The next `n` listings panic instead of returning.
    pub fn panic_on_next_lists(&self, n: usize) {
        self.panicking_lists.store(n, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self, id: &str) -> usize {
        self.fetches.lock().unwrap().get(&SessionId::new(id)).copied().unwrap_or(0)
    }
}

#[async_trait]
impl SessionSource for StaticSource {
    async fn list_session_ids(&self) -> Result<Vec<SessionId>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.panicking_lists.load(Ordering::SeqCst);
        if remaining > 0 {
            self.panicking_lists.store(remaining - 1, Ordering::SeqCst);
            panic!("session listing panicked");
        }
        if *self.unreachable.lock().unwrap() {
            return Err(anyhow!("analytics API unreachable"));
        }
        Ok(self.ids.lock().unwrap().clone())
    }

    async fn get_transcript(&self, id: &SessionId) -> Result<Option<Transcript>> {
        *self.fetches.lock().unwrap().entry(id.clone()).or_insert(0) += 1;
        if self.failing.lock().unwrap().contains(id) {
            return Err(anyhow!("transcript request for {} timed out", id.short()));
        }
        Ok(self.transcripts.lock().unwrap().get(id).cloned())
    }
}

/// Summarizes every transcript it sees, except ids told to fail or decline.
#[derive(Default)]
pub struct ScriptedSummarizer {
    failing: Mutex<HashSet<SessionId>>,
    declining: Mutex<HashSet<SessionId>>,
    panicking: Mutex<HashSet<SessionId>>,
    calls: Mutex<Vec<SessionId>>,
}

impl ScriptedSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(self, id: &str) -> Self {
        self.failing.lock().unwrap().insert(SessionId::new(id));
        self
    }

    pub fn panic_on(self, id: &str) -> Self {
        self.panicking.lock().unwrap().insert(SessionId::new(id));
        self
    }

    pub fn decline(self, id: &str) -> Self {
        self.declining.lock().unwrap().insert(SessionId::new(id));
        self
    }

    pub fn calls(&self) -> Vec<SessionId> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for ScriptedSummarizer {
    async fn summarize(&self, transcript: &Transcript) -> Result<Option<ConversationSummary>> {
        let id = transcript.session_id.clone();
        self.calls.lock().unwrap().push(id.clone());
        if self.panicking.lock().unwrap().contains(&id) {
            panic!("summarizer crashed on {}", id.as_str());
        }
        if self.failing.lock().unwrap().contains(&id) {
            return Err(anyhow!("model returned invalid JSON"));
        }
        if self.declining.lock().unwrap().contains(&id) || !transcript.has_meaningful_content() {
            return Ok(None);
        }
        let mut summary = ConversationSummary::new(id, format!("{} entries discussed", transcript.len()));
        summary.key_insights.push("reports are compiled by hand".into());
        Ok(Some(summary))
    }
}

/// Returns a fixed skill document, or nothing when built with `silent()`.
pub struct FixedSkills {
    content: Option<String>,
    calls: AtomicUsize,
}

impl FixedSkills {
    pub fn new(content: &str) -> Self {
        Self { content: Some(content.to_string()), calls: AtomicUsize::new(0) }
    }

    pub fn silent() -> Self {
        Self { content: None, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SkillSynthesizer for FixedSkills {
    async fn synthesize(&self, _summary: Option<&ConversationSummary>, _workflows: &[Value]) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.content.clone())
    }
}

#[derive(Default)]
pub struct FixedWorkflows {
    by_session: HashMap<SessionId, Vec<Value>>,
}

impl FixedWorkflows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: &str, workflows: Vec<Value>) -> Self {
        self.by_session.insert(SessionId::new(id), workflows);
        self
    }
}

#[async_trait]
impl WorkflowStore for FixedWorkflows {
    async fn load_workflows(&self, id: &SessionId) -> Result<Vec<Value>> {
        Ok(self.by_session.get(id).cloned().unwrap_or_default())
    }
}

/// In-memory blob store. Writes to paths under a failing prefix return errors.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<String, Vec<u8>>>,
    failing_prefixes: Mutex<Vec<String>>,
    unreachable: Mutex<bool>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes_under(&self, prefix: &str) {
        self.failing_prefixes.lock().unwrap().push(prefix.to_string());
    }

    pub fn set_unreachable(&self, down: bool) {
        *self.unreachable.lock().unwrap() = down;
    }

    pub fn insert(&self, path: &str, payload: &[u8]) {
        self.blobs.lock().unwrap().insert(path.to_string(), payload.to_vec());
    }

    pub fn paths(&self) -> Vec<String> {
        self.blobs.lock().unwrap().keys().cloned().collect()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(path)
    }

    pub fn json(&self, path: &str) -> Option<Value> {
        let blobs = self.blobs.lock().unwrap();
        blobs.get(path).and_then(|raw| serde_json::from_slice(raw).ok())
    }

    fn check_reachable(&self) -> Result<()> {
        if *self.unreachable.lock().unwrap() {
            return Err(anyhow!("blob store unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn write(&self, path: &str, payload: Vec<u8>) -> Result<()> {
        self.check_reachable()?;
        if self.failing_prefixes.lock().unwrap().iter().any(|p| path.starts_with(p.as_str())) {
            return Err(anyhow!("write rejected for {}", path));
        }
        self.blobs.lock().unwrap().insert(path.to_string(), payload);
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        self.check_reachable()?;
        Ok(self.blobs.lock().unwrap().contains_key(path))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.check_reachable()?;
        self.blobs
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("no such blob: {}", path))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// State backend held in memory; can be switched to unreachable.
#[derive(Default)]
pub struct MemoryStateBackend {
    doc: Mutex<Option<PersistedState>>,
    unreachable: Mutex<bool>,
    saves: AtomicUsize,
}

impl MemoryStateBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sessions(ids: &[&str]) -> Self {
        let backend = Self::default();
        *backend.doc.lock().unwrap() = Some(PersistedState {
            processed_sessions: ids.iter().map(|s| SessionId::new(*s)).collect(),
            last_updated: None,
        });
        backend
    }

    pub fn set_unreachable(&self, down: bool) {
        *self.unreachable.lock().unwrap() = down;
    }

    pub fn document(&self) -> Option<PersistedState> {
        self.doc.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateBackend for MemoryStateBackend {
    fn name(&self) -> &str {
        "memory-state"
    }

    async fn load(&self) -> Result<Option<PersistedState>> {
        if *self.unreachable.lock().unwrap() {
            return Err(anyhow!("state backend unreachable"));
        }
        Ok(self.doc.lock().unwrap().clone())
    }

    async fn save(&self, state: &PersistedState) -> Result<()> {
        if *self.unreachable.lock().unwrap() {
            return Err(anyhow!("state backend unreachable"));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.doc.lock().unwrap() = Some(state.clone());
        Ok(())
    }
}
