use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tracing::{error, info};

use session_monitor::{build_monitor, logging, signals, MonitorConfig};

#[derive(Parser, Debug)]
#[clap(name = "session-monitor")]
#[clap(about = "Summarize new interview sessions and store the results", long_about = None)]
struct Args {
    /// Keep polling instead of running a single pass
    #[clap(long)]
    daemon: bool,

    /// Seconds between passes in daemon mode (overrides CHECK_INTERVAL_SECONDS)
    #[clap(long)]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_tracing("session_monitor=info,monitor_core=info,summarizer=info,storage=info,analytics_client=info");

    let config = match MonitorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %format!("{:#}", e), "invalid configuration");
            std::process::exit(1);
        }
    };
    let monitor = build_monitor(&config)?;

    if args.daemon {
        let interval = args.interval.map(Duration::from_secs).unwrap_or(config.check_interval);
        monitor.run_forever(interval, signals::cancel_on_shutdown()).await;
        info!("session monitor stopped");
    } else {
        let count = monitor.check_and_process().await;
        info!(count, "processed {} new session(s)", count);
    }

    Ok(())
}
