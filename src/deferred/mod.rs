// Two-phase interaction handling: the fast-ack route hands a job to a queue,
// a worker processes it out of band and patches the original response.

pub mod followup;
pub mod keep_alive;
pub mod worker;

pub use followup::{FollowUpClient, FollowUpError};
pub use keep_alive::{KeepAlive, KeepAliveTargets};
pub use worker::{Processor, QueueWorker};

use crate::interaction::{Inbound, InteractionEvent, decode_inbound};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

/// Bound on the best-effort hand-off in forward mode.
pub const FORWARD_TIMEOUT: Duration = Duration::from_secs(1);
pub const QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Received,
    Acked,
    Queued,
    Processing,
    Delivered,
    Dropped,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Received => "RECEIVED",
            JobState::Acked => "ACKED",
            JobState::Queued => "QUEUED",
            JobState::Processing => "PROCESSING",
            JobState::Delivered => "DELIVERED",
            JobState::Dropped => "DROPPED",
        };
        f.write_str(s)
    }
}

/// Terminal result of processing one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Delivered,
    Dropped(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DeferredJob {
    pub payload: InteractionEvent,
}

impl DeferredJob {
    pub fn new(payload: InteractionEvent) -> Self {
        DeferredJob { payload }
    }

    /// Accepts a serialized job or, for callers that forward the platform's
    /// body untouched, a raw interaction.
    pub fn decode(body: &[u8]) -> Result<Self, serde_json::Error> {
        match serde_json::from_slice::<DeferredJob>(body) {
            Ok(job) => Ok(job),
            Err(job_err) => match decode_inbound(body) {
                Ok(Inbound::Event(event)) => Ok(DeferredJob::new(event)),
                _ => Err(job_err),
            },
        }
    }
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("job queue is full")]
    Full,
    #[error("job queue is closed")]
    Closed,
    #[error("forwarding job failed: {0}")]
    Forward(#[from] reqwest::Error),
    #[error("forwarding job failed: HTTP {0}")]
    ForwardStatus(u16),
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: DeferredJob) -> Result<(), QueueError>;
}

/// In-process queue drained by a [`QueueWorker`].
#[derive(Clone)]
pub struct ChannelQueue {
    tx: mpsc::Sender<DeferredJob>,
}

impl ChannelQueue {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<DeferredJob>) {
        let (tx, rx) = mpsc::channel(capacity);
        (ChannelQueue { tx }, rx)
    }
}

#[async_trait]
impl JobQueue for ChannelQueue {
    async fn enqueue(&self, job: DeferredJob) -> Result<(), QueueError> {
        // Never wait for room: the ack has to go out now.
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })
    }
}

/// Degraded mode: POST the job to the deferred route with a short timeout.
#[derive(Clone)]
pub struct ForwardQueue {
    http: Client,
    target: url::Url,
    timeout: Duration,
}

impl ForwardQueue {
    pub fn new(http: Client, target: url::Url) -> Self {
        ForwardQueue {
            http,
            target,
            timeout: FORWARD_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl JobQueue for ForwardQueue {
    async fn enqueue(&self, job: DeferredJob) -> Result<(), QueueError> {
        debug!("Forwarding job to {}", self.target.path());
        let res = self
            .http
            .post(self.target.clone())
            .timeout(self.timeout)
            .json(&job)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(QueueError::ForwardStatus(res.status().as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::InteractionKind;
    use std::collections::BTreeMap;

    fn job(name: &str) -> DeferredJob {
        DeferredJob::new(InteractionEvent {
            kind: InteractionKind::Command,
            command_name: name.into(),
            arguments: vec![],
            resolved_attachments: BTreeMap::new(),
            origin_token: "tok".into(),
            application_id: "app".into(),
        })
    }

    #[tokio::test]
    async fn channel_queue_delivers_in_order() {
        let (queue, mut rx) = ChannelQueue::new(4);
        queue.enqueue(job("a")).await.unwrap();
        queue.enqueue(job("b")).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().payload.command_name, "a");
        assert_eq!(rx.recv().await.unwrap().payload.command_name, "b");
    }

    #[tokio::test]
    async fn channel_queue_reports_full_and_closed() {
        let (queue, rx) = ChannelQueue::new(1);
        queue.enqueue(job("a")).await.unwrap();
        assert!(matches!(queue.enqueue(job("b")).await, Err(QueueError::Full)));
        drop(rx);
        assert!(matches!(queue.enqueue(job("c")).await, Err(QueueError::Closed)));
    }

    #[test]
    fn decode_accepts_job_and_raw_interaction() {
        let original = job("hello");
        let bytes = serde_json::to_vec(&original).unwrap();
        assert_eq!(DeferredJob::decode(&bytes).unwrap(), original);

        let raw = br#"{"type":2,"application_id":"app","token":"tok","data":{"name":"hello"}}"#;
        assert_eq!(DeferredJob::decode(raw).unwrap(), original);

        assert!(DeferredJob::decode(b"{}").is_err());
    }

    #[test]
    fn states_render_upper_case() {
        assert_eq!(JobState::Processing.to_string(), "PROCESSING");
        assert_eq!(JobState::Dropped.to_string(), "DROPPED");
    }
}
