//! Background replay of writes queued offline.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::coordinator::{DrainReport, SyncCoordinator};
use crate::gateway::RemoteGateway;

const REPORT_CHANNEL_CAPACITY: usize = 16;

/// Drains the pending queue whenever connectivity is restored or a write is
/// queued while online.
///
/// The worker drains once at start if already online. It runs until
/// [`shutdown`](Self::shutdown) or its cancellation token is cancelled.
pub struct ReplayWorker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
    reports: broadcast::Sender<DrainReport>,
}

impl ReplayWorker {
    /// Spawn the worker on the current runtime.
    pub fn spawn<G>(coordinator: Arc<SyncCoordinator<G>>) -> Self
    where
        G: RemoteGateway + 'static,
    {
        let cancel_token = CancellationToken::new();
        let (reports, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);

        let task_token = cancel_token.clone();
        let task_reports = reports.clone();
        let handle = tokio::spawn(async move {
            run(coordinator, task_token, task_reports).await;
        });

        Self {
            handle,
            cancel_token,
            reports,
        }
    }

    /// Receive a report after every drain that ran.
    pub fn subscribe(&self) -> broadcast::Receiver<DrainReport> {
        self.reports.subscribe()
    }

    /// Get a token that stops the worker when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the worker and wait for it to exit. A drain in progress
    /// finishes first.
    pub async fn shutdown(self) {
        self.cancel_token.cancel();
        if let Err(e) = self.handle.await {
            warn!("Replay worker ended abnormally: {}", e);
        }
    }
}

async fn run<G: RemoteGateway>(
    coordinator: Arc<SyncCoordinator<G>>,
    cancel_token: CancellationToken,
    reports: broadcast::Sender<DrainReport>,
) {
    let mut online_rx = coordinator.connectivity().subscribe();
    let trigger = coordinator.replay_trigger();

    info!("Replay worker started");
    if *online_rx.borrow_and_update() {
        drain(&coordinator, &reports).await;
    }

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                debug!("Replay worker cancelled, stopping");
                break;
            }
            changed = online_rx.changed() => {
                if changed.is_err() {
                    debug!("Connectivity signal closed, stopping");
                    break;
                }
                let online = *online_rx.borrow_and_update();
                if online {
                    drain(&coordinator, &reports).await;
                }
            }
            _ = trigger.notified() => {
                if coordinator.is_online() {
                    drain(&coordinator, &reports).await;
                }
            }
        }
    }
    info!("Replay worker stopped");
}

async fn drain<G: RemoteGateway>(
    coordinator: &SyncCoordinator<G>,
    reports: &broadcast::Sender<DrainReport>,
) {
    match coordinator.drain_pending().await {
        Ok(report) => {
            if report.is_empty() {
                debug!("Nothing to replay");
            }
            // No subscribers is fine.
            let _ = reports.send(report);
        }
        Err(e) => warn!("Replay failed: {}", e),
    }
}
