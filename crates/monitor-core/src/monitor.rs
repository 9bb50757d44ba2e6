use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use futures_util::FutureExt;
use serde_json::json;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::paths;
use crate::ports::{BlobStore, SessionSource, SkillSynthesizer, Summarizer, WorkflowStore};
use crate::session::{ConversationSummary, SessionId, Transcript};
use crate::state::StateTracker;

/// Collaborators the driver talks to.
#[derive(Clone)]
pub struct MonitorPorts {
    pub source: Arc<dyn SessionSource>,
    pub summarizer: Arc<dyn Summarizer>,
    pub skills: Arc<dyn SkillSynthesizer>,
    pub workflows: Arc<dyn WorkflowStore>,
    pub blobs: Arc<dyn BlobStore>,
}

/// What happened to one new session during a pass.
#[derive(Debug)]
pub enum SessionOutcome {
    /// Transcript found and the session was marked processed.
    Processed { summarized: bool, skill_generated: bool },
    /// No transcript upstream yet; stays eligible for the next pass.
    Skipped,
    /// Pipeline error before mark-processed; stays eligible for the next pass.
    Failed(anyhow::Error),
}

impl SessionOutcome {
    pub fn is_processed(&self) -> bool {
        matches!(self, SessionOutcome::Processed { .. })
    }
}

#[derive(Debug, Default)]
pub struct PassReport {
    /// Ids returned by the source.
    pub listed: usize,
    /// Size of the processed set loaded at the start of the pass.
    pub already_processed: usize,
    pub outcomes: Vec<(SessionId, SessionOutcome)>,
}

impl PassReport {
    pub fn processed_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_processed()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| matches!(o, SessionOutcome::Skipped)).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| matches!(o, SessionOutcome::Failed(_))).count()
    }

    pub fn outcome(&self, id: &SessionId) -> Option<&SessionOutcome> {
        self.outcomes.iter().find(|(sid, _)| sid == id).map(|(_, o)| o)
    }
}

/// Finds new sessions and runs each one through
/// transcript → summary → skill → persist → mark-processed.
pub struct SessionMonitor {
    ports: MonitorPorts,
    tracker: StateTracker,
}

impl SessionMonitor {
    pub fn new(ports: MonitorPorts, tracker: StateTracker) -> Self {
        Self { ports, tracker }
    }

    pub fn tracker(&self) -> &StateTracker {
        &self.tracker
    }

    /// Run one pass and return how many sessions reached mark-processed.
    pub async fn check_and_process(&self) -> usize {
        self.run_pass().await.processed_count()
    }

    pub async fn run_pass(&self) -> PassReport {
        info!("checking for new sessions");
        let mut report = PassReport::default();

        let all_ids = match self.ports.source.list_session_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %format!("{:#}", e), "failed to list sessions");
                return report;
            }
        };
        report.listed = all_ids.len();
        if all_ids.is_empty() {
            info!("no sessions found");
            return report;
        }

        let processed = self.tracker.load().await;
        report.already_processed = processed.len();

        let mut seen = HashSet::new();
        let new_ids: Vec<SessionId> = all_ids
            .into_iter()
            .filter(|id| !processed.contains(id))
            .filter(|id| seen.insert(id.clone()))
            .collect();

        if new_ids.is_empty() {
            info!(total = report.listed, processed = report.already_processed, "no new sessions to process");
            return report;
        }
        info!(count = new_ids.len(), "found new sessions to process");

        for id in new_ids {
            let outcome = match AssertUnwindSafe(self.process_session(&id)).catch_unwind().await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) => {
                    error!(session = %id.short(), error = %format!("{:#}", e), "error processing session");
                    SessionOutcome::Failed(e)
                }
                Err(panic) => {
                    let message = panic_message(&panic);
                    error!(session = %id.short(), error = %message, "session processing panicked");
                    SessionOutcome::Failed(anyhow!(message))
                }
            };
            report.outcomes.push((id, outcome));
        }

        info!(
            processed = report.processed_count(),
            skipped = report.skipped_count(),
            failed = report.failed_count(),
            "pass complete"
        );
        report
    }

    async fn process_session(&self, id: &SessionId) -> Result<SessionOutcome> {
        info!(session = %id.short(), "processing session");

        let transcript = match self.ports.source.get_transcript(id).await? {
            Some(t) => t,
            None => {
                warn!(session = %id.short(), "no transcript available, skipping");
                return Ok(SessionOutcome::Skipped);
            }
        };

        self.write_json(&paths::transcript(id), &transcript_document(&transcript)).await?;

        let summary = match self.ports.summarizer.summarize(&transcript).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(session = %id.short(), error = %format!("{:#}", e), "summarizer failed");
                None
            }
        };
        match &summary {
            Some(summary) => {
                self.write_json(&paths::summary(id), &summary_document(summary)?).await?;
                info!(session = %id.short(), "saved summary");
            }
            None => warn!(session = %id.short(), "no summary generated"),
        }

        let workflows = match self.ports.workflows.load_workflows(id).await {
            Ok(w) => w,
            Err(e) => {
                debug!(session = %id.short(), error = %format!("{:#}", e), "no workflows loaded");
                Vec::new()
            }
        };

        let mut skill_generated = false;
        if summary.is_some() || !workflows.is_empty() {
            match self.ports.skills.synthesize(summary.as_ref(), &workflows).await {
                Ok(Some(content)) => {
                    let doc = json!({
                        "session_id": id,
                        "skill_content": content,
                        "generated_at": timestamp(),
                    });
                    self.write_json(&paths::skill(id), &doc).await?;
                    skill_generated = true;
                    info!(session = %id.short(), "saved skill file");
                }
                Ok(None) => debug!(session = %id.short(), "skill synthesizer produced nothing"),
                Err(e) => warn!(session = %id.short(), error = %format!("{:#}", e), "skill synthesis failed"),
            }
        }

        self.tracker.mark_processed(id).await;
        Ok(SessionOutcome::Processed { summarized: summary.is_some(), skill_generated })
    }

    async fn write_json(&self, path: &str, doc: &serde_json::Value) -> Result<()> {
        let payload = serde_json::to_vec_pretty(doc).context("failed to encode document")?;
        self.ports
            .blobs
            .write(path, payload)
            .await
            .with_context(|| format!("failed to write {}", path))?;
        debug!(path, store = %self.ports.blobs.describe(), "saved blob");
        Ok(())
    }

    /// Pass, sleep, repeat until `cancel` fires. Cancellation is only observed
    /// while sleeping; a panicking pass is logged and the loop carries on.
    pub async fn run_forever(&self, interval: Duration, cancel: CancellationToken) {
        info!(interval_secs = interval.as_secs(), "starting daemon mode");
        loop {
            match AssertUnwindSafe(self.run_pass()).catch_unwind().await {
                Ok(report) => debug!(processed = report.processed_count(), "daemon pass finished"),
                Err(panic) => error!(error = %panic_message(&panic), "error in daemon loop"),
            }

            info!(secs = interval.as_secs(), "sleeping until next check");
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("daemon cancelled, exiting loop");
                    break;
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339()
}

fn transcript_document(transcript: &Transcript) -> serde_json::Value {
    json!({
        "session_id": transcript.session_id,
        "entries": transcript.entries,
        "processed_at": timestamp(),
    })
}

fn summary_document(summary: &ConversationSummary) -> Result<serde_json::Value> {
    let mut doc = serde_json::to_value(summary).context("failed to encode summary")?;
    if let Some(obj) = doc.as_object_mut() {
        obj.insert("processed_at".into(), json!(timestamp()));
    }
    Ok(doc)
}

pub fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "pass panicked".to_string()
    }
}
