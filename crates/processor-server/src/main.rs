use anyhow::{Context, Result};
use std::{env, net::SocketAddr};
use tracing::{error, info};

use processor_server::{router, AppState};
use session_monitor::{build_monitor, logging, signals, MonitorConfig};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing("processor_server=info,monitor_core=info,session_monitor=info,tower_http=debug");

    let config = match MonitorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %format!("{:#}", e), "invalid configuration");
            std::process::exit(1);
        }
    };

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .context("PORT must be a number")?;
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", host, port))?;

    let app = router(AppState::new(build_monitor(&config)?));

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(signals::shutdown_signal())
        .await?;

    Ok(())
}
