//! HTTP trigger for running a monitor pass on demand (Cloud Run, cron, etc.).

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures_util::FutureExt;
use serde_json::json;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use monitor_core::{panic_message, SessionMonitor};

pub const SERVICE_NAME: &str = "session-processor";

#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<SessionMonitor>,
    /// Held for the duration of a pass; one pass at a time per process.
    pub pass_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(monitor: SessionMonitor) -> Self {
        Self { monitor: Arc::new(monitor), pass_lock: Arc::new(Mutex::new(())) }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_check).post(process))
        .route("/health", get(health_check))
        .route("/process", axum::routing::post(process))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

async fn process(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let _guard = match state.pass_lock.try_lock() {
        Ok(guard) => guard,
        Err(_) => {
            warn!("pass requested while another is running");
            return (
                StatusCode::CONFLICT,
                Json(json!({ "error": "A processing pass is already running" })),
            );
        }
    };

    info!("session processor triggered");
    match AssertUnwindSafe(state.monitor.check_and_process()).catch_unwind().await {
        Ok(count) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": format!("Processed {} session(s)", count),
                "processed_count": count,
            })),
        ),
        Err(panic) => {
            let message = panic_message(&panic);
            error!(error = %message, "error processing sessions");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message })))
        }
    }
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}
