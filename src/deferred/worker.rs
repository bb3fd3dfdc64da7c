// Queue consumer: one job in, one follow-up out.

use super::{DeferredJob, FollowUpClient, JobOutcome, JobState};
use crate::handlers::{Services, dispatch};
use std::time::Duration;
use tokio::{
    sync::{mpsc, oneshot},
    task::{JoinHandle, JoinSet},
};
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct Processor {
    services: Services,
    followup: FollowUpClient,
}

impl Processor {
    pub fn new(services: Services, followup: FollowUpClient) -> Self {
        Processor { services, followup }
    }

    /// Run the command and patch the result into the original response.
    /// A failed follow-up is logged and not retried.
    pub async fn process(&self, job: DeferredJob) -> JobOutcome {
        let event = &job.payload;
        info!(command = %event.command_name, state = %JobState::Processing, "Processing job");

        let content = dispatch(event, &self.services).await;

        match self
            .followup
            .send(&event.application_id, &event.origin_token, &content)
            .await
        {
            Ok(()) => {
                info!(command = %event.command_name, state = %JobState::Delivered, "Follow-up sent");
                JobOutcome::Delivered
            }
            Err(e) => {
                error!(command = %event.command_name, state = %JobState::Dropped, "Error sending follow-up: {e}");
                JobOutcome::Dropped(e.to_string())
            }
        }
    }
}

/// How long shutdown waits for jobs already being processed.
pub const SHUTDOWN_DRAIN: Duration = Duration::from_secs(10);

/// Background task draining the in-process queue. Each job runs in its own
/// task so a slow upstream never holds up the next one; shutdown lets the
/// running ones finish, up to a drain limit.
pub struct QueueWorker {
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl QueueWorker {
    pub fn spawn(rx: mpsc::Receiver<DeferredJob>, processor: Processor) -> Self {
        Self::spawn_with_drain(rx, processor, SHUTDOWN_DRAIN)
    }

    pub fn spawn_with_drain(
        mut rx: mpsc::Receiver<DeferredJob>,
        processor: Processor,
        drain: Duration,
    ) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut jobs = JoinSet::new();
            loop {
                tokio::select! {
                    job = rx.recv() => {
                        let Some(job) = job else {
                            warn!("Job queue closed, worker exiting");
                            break;
                        };
                        let processor = processor.clone();
                        jobs.spawn(async move {
                            processor.process(job).await;
                        });
                    }

                    Some(res) = jobs.join_next(), if !jobs.is_empty() => {
                        if let Err(e) = res {
                            error!(state = %JobState::Dropped, "Job task failed: {e}");
                        }
                    }

                    _ = &mut stop_rx => {
                        break;
                    }
                }
            }
            drain_jobs(jobs, drain).await;
        });

        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

impl Drop for QueueWorker {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(h) = &self.handle {
            h.abort();
        }
    }
}

async fn drain_jobs(mut jobs: JoinSet<()>, drain: Duration) {
    if jobs.is_empty() {
        return;
    }
    info!("Waiting for {} running job(s)", jobs.len());
    let finished = tokio::time::timeout(drain, async {
        while jobs.join_next().await.is_some() {}
    })
    .await;
    if finished.is_err() {
        error!(
            state = %JobState::Dropped,
            "{} job(s) still running after {:?}, aborting",
            jobs.len(),
            drain
        );
        jobs.abort_all();
    }
}
