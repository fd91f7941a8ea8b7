//! Periodic reload of the working set.
//!
//! [`AutoRefresh`] runs `load()` every period on a tokio task and forwards each
//! [`LoadReport`] over a channel. Ticks that fire while a load or mutation is still
//! running wait on the repository's operation guard; ticks missed meanwhile are
//! skipped, not queued.

use crate::repository::{EntryRepository, LoadReport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

const REPORT_BUFFER: usize = 8;

pub struct AutoRefresh {
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl AutoRefresh {
    /// Starts the task. The first reload happens one period from now.
    pub fn spawn(
        repo: Arc<EntryRepository>,
        period: Duration,
    ) -> (Self, mpsc::Receiver<LoadReport>) {
        let (report_tx, report_rx) = mpsc::channel(REPORT_BUFFER);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let report = repo.load().await;
                        debug!(source = ?report.source, "auto-refresh tick");
                        // A full channel drops the report; the next one supersedes it.
                        if let Err(mpsc::error::TrySendError::Closed(_)) = report_tx.try_send(report) {
                            break;
                        }
                    }
                }
            }
        });

        (
            Self {
                shutdown: Some(shutdown_tx),
                handle: Some(handle),
            },
            report_rx,
        )
    }

    /// Stops the task and waits for an in-flight reload to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
