//! Replay of writes queued offline.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use restaurant_sync::ReplayWorker;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use super::{Context, write_output};
use crate::cli::OutputFormat;
use crate::format::{format_drain_text, format_json};

pub async fn cmd_drain(ctx: &Context) -> Result<()> {
    if !ctx.coordinator.is_online() {
        bail!("Cannot send queued writes while offline");
    }

    let report = ctx.coordinator.drain_pending().await?;

    let output = match ctx.format {
        OutputFormat::Text => format_drain_text(&report),
        OutputFormat::Json => format_json(&report)?,
    };
    write_output(&output)
}

/// Probe the API every `interval` seconds and replay the queue whenever
/// it comes back, until Ctrl-C.
pub async fn cmd_watch(ctx: &Context, interval: u64, offline: bool) -> Result<()> {
    if offline {
        bail!("watch needs the network; drop --offline");
    }

    let worker = ReplayWorker::spawn(Arc::clone(&ctx.coordinator));
    let mut reports = worker.subscribe();
    let mut ticker = tokio::time::interval(Duration::from_secs(interval));

    info!("Watching connectivity every {}s (Ctrl-C to stop)", interval);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping");
                break;
            }
            _ = ticker.tick() => {
                ctx.coordinator.check_connectivity().await;
            }
            report = reports.recv() => match report {
                Ok(report) if report.is_empty() => {}
                Ok(report) => {
                    let output = match ctx.format {
                        OutputFormat::Text => format_drain_text(&report),
                        OutputFormat::Json => serde_json::to_string(&report)? + "\n",
                    };
                    write_output(&output)?;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Missed {} drain report(s)", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    worker.shutdown().await;
    Ok(())
}
