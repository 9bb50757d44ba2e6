use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use monitor_core::mocks::*;
use monitor_core::ports::SessionSource;
use monitor_core::{MonitorPorts, SessionId, SessionMonitor, StateTracker, Transcript};
use processor_server::{router, AppState};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn monitor_with(source: Arc<dyn SessionSource>) -> SessionMonitor {
    let ports = MonitorPorts {
        source,
        summarizer: Arc::new(ScriptedSummarizer::new()),
        skills: Arc::new(FixedSkills::new("# Skill")),
        workflows: Arc::new(FixedWorkflows::new()),
        blobs: Arc::new(MemoryBlobStore::new()),
    };
    SessionMonitor::new(ports, StateTracker::new(vec![Arc::new(MemoryStateBackend::new())]))
}

fn app_with(source: Arc<dyn SessionSource>) -> (Router, AppState) {
    let state = AppState::new(monitor_with(source));
    (router(state.clone()), state)
}

async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

struct PanickingSource;

#[async_trait]
impl SessionSource for PanickingSource {
    async fn list_session_ids(&self) -> Result<Vec<SessionId>> {
        panic!("source exploded");
    }

    async fn get_transcript(&self, _id: &SessionId) -> Result<Option<Transcript>> {
        Ok(None)
    }
}

#[tokio::test]
async fn health_endpoints_report_service() {
    for uri in ["/", "/health"] {
        let (app, _) = app_with(Arc::new(StaticSource::new(&[])));
        let (status, body) = call(app, "GET", uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "session-processor");
    }
}

#[tokio::test]
async fn post_runs_a_pass_and_reports_count() {
    let source = StaticSource::new(&["s1", "s2"]).with_transcript(transcript_with("s1", 2, 1));
    let (app, _) = app_with(Arc::new(source));

    let (status, body) = call(app.clone(), "POST", "/process").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["processed_count"], 1);
    assert_eq!(body["message"], "Processed 1 session(s)");

    // Second trigger finds nothing new.
    let (status, body) = call(app, "POST", "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processed_count"], 0);
}

#[tokio::test]
async fn concurrent_trigger_is_rejected() {
    let (app, state) = app_with(Arc::new(StaticSource::new(&["s1"])));
    let _running = state.pass_lock.lock().await;

    let (status, body) = call(app, "POST", "/process").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn panicking_pass_returns_500() {
    let (app, state) = app_with(Arc::new(PanickingSource));

    let (status, body) = call(app.clone(), "POST", "/process").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "source exploded");

    // The lock is released and the server keeps answering.
    assert!(state.pass_lock.try_lock().is_ok());
    let (status, _) = call(app, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_path_is_404() {
    let (app, _) = app_with(Arc::new(StaticSource::new(&[])));
    let (status, body) = call(app, "GET", "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}
