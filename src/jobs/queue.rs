use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::service::JobService;
use crate::error::AppError;

/// Sending half of the enrichment queue.
#[derive(Debug, Clone)]
pub struct WorkQueue {
    tx: mpsc::Sender<Uuid>,
}

impl WorkQueue {
    pub fn new(capacity: usize) -> (WorkQueue, mpsc::Receiver<Uuid>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (WorkQueue { tx }, rx)
    }

    /// Queue a job for enrichment without waiting. A full queue drops the id;
    /// the sweep picks the job up again while it is still `raw`.
    pub fn enqueue(&self, job_id: Uuid) -> bool {
        match self.tx.try_send(job_id) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(%job_id, "Work queue full, leaving job for the sweep");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(%job_id, "Work queue closed");
                false
            }
        }
    }
}

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Wait for every worker to exit.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Worker task panicked");
            }
        }
    }
}

/// Start `workers` tasks that drain the queue and run `process` on each id.
/// Workers stop once `shutdown` fires or every sender is gone.
pub fn spawn_workers(
    service: Arc<JobService>,
    rx: mpsc::Receiver<Uuid>,
    workers: usize,
    shutdown: CancellationToken,
) -> WorkerPool {
    let rx = Arc::new(Mutex::new(rx));
    let handles = (0..workers.max(1))
        .map(|worker| {
            let service = service.clone();
            let rx = rx.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                tracing::debug!(worker, "Worker started");
                loop {
                    let next = {
                        let mut rx = rx.lock().await;
                        tokio::select! {
                            biased;
                            _ = shutdown.cancelled() => None,
                            id = rx.recv() => id,
                        }
                    };
                    let Some(job_id) = next else {
                        break;
                    };
                    run_one(&service, job_id, &shutdown).await;
                }
                tracing::debug!(worker, "Worker stopped");
            })
        })
        .collect();

    WorkerPool { handles }
}

async fn run_one(service: &JobService, job_id: Uuid, shutdown: &CancellationToken) {
    match service.process(job_id, shutdown).await {
        Ok(()) => {}
        Err(AppError::InvalidTransition { from, .. }) => {
            tracing::debug!(%job_id, status = %from, "Job already handled, skipping");
        }
        Err(AppError::Cancelled) => {
            tracing::info!(%job_id, "Processing cancelled by shutdown");
        }
        Err(e) => {
            tracing::error!(%job_id, error = %e, "Job processing failed");
        }
    }
}

/// Periodically reap orphaned `processing` jobs and re-enqueue `raw` ones.
/// The first pass runs immediately.
pub fn spawn_sweeper(
    service: Arc<JobService>,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    match service.reap_orphaned().await {
                        Ok(0) => {}
                        Ok(n) => tracing::warn!(count = n, "Reaped orphaned jobs"),
                        Err(e) => tracing::warn!(error = %e, "Reaping orphaned jobs failed"),
                    }
                    match service.requeue_raw().await {
                        Ok(0) => {}
                        Ok(n) => tracing::info!(count = n, "Re-enqueued raw jobs"),
                        Err(e) => tracing::warn!(error = %e, "Sweep failed"),
                    }
                }
            }
        }
    })
}
