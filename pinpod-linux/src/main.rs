// PinPod Linux: drives the reconciliation controller against a local node; commands on stdin.

mod commands;
mod config;
mod demo_file;
mod driver;
mod local_sdk;
mod sdk;
mod status;

use std::sync::Arc;

use pinpod_core::{Controller, NodeState};

use crate::local_sdk::LocalSdk;
use crate::sdk::Sdk;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<(), Box<dyn std::error::Error>> {
    for arg in std::env::args().skip(1) {
        if arg == "--version" || arg == "-V" {
            println!("pinpod-linux {}", VERSION);
            return Ok(());
        }
    }

    let cfg = config::load();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&cfg.log_level))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(cfg))
}

async fn run(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(version = VERSION, data_dir = %cfg.data_dir.display(), "pinpod starting");

    let demo_url = cfg.demo_file_url.clone();
    let demo_path = cfg.demo_file_path();
    tokio::spawn(async move {
        if let Err(e) = demo_file::ensure(&demo_url, &demo_path).await {
            tracing::warn!(error = %e, url = %demo_url, "demo file unavailable; pins will be skipped");
        }
    });

    let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel();
    let sdk = Arc::new(LocalSdk::new(event_tx.clone()));
    let driver = driver::Driver::new(Controller::new(cfg.controller_config()), sdk.clone());

    sdk.setup(cfg.node_setup()).await?;
    if cfg.auto_start {
        sdk.start_node().await?;
    }

    let (cmd_tx, cmd_rx) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(async move {
        if let Err(e) = commands::read_stdin(cmd_tx, event_tx).await {
            tracing::warn!(error = %e, "stdin closed with error");
        }
    });

    let last = driver
        .run(event_rx, cmd_rx, async {
            if let Err(e) = shutdown_signal().await {
                tracing::warn!(error = %e, "signal handler failed");
            }
        })
        .await;

    if last.node_state == NodeState::Started || sdk.is_running().await {
        sdk.stop_node().await?;
    }
    tracing::info!("pinpod stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM (Unix).
async fn shutdown_signal() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }
    Ok(())
}
