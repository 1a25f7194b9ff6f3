//! In-process refresh queue backed by a bounded tokio channel.
//!
//! The producer half implements the `SubmissionRefreshQueue` port; the worker
//! binary drains the receiver through `SubmissionRefreshWorker`. Jobs are
//! fire-and-forget: nothing survives a restart, and the next stale scan picks
//! up whatever was lost.

use async_trait::async_trait;
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};

use crate::domain::ports::{JobDispatchError, RefreshSubmissionsJob, SubmissionRefreshQueue};

/// Default number of pending jobs before `enqueue` rejects.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Producer half of the refresh channel.
#[derive(Debug, Clone)]
pub struct TokioRefreshQueue {
    sender: Sender<RefreshSubmissionsJob>,
}

impl TokioRefreshQueue {
    /// Create a queue and the receiver its consumer reads from.
    ///
    /// A zero capacity is raised to one.
    pub fn bounded(capacity: usize) -> (Self, Receiver<RefreshSubmissionsJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl SubmissionRefreshQueue for TokioRefreshQueue {
    async fn enqueue(&self, job: RefreshSubmissionsJob) -> Result<(), JobDispatchError> {
        self.sender.try_send(job).map_err(|error| match error {
            TrySendError::Full(job) => JobDispatchError::rejected(format!(
                "queue full, dropped {} submission(s)",
                job.submission_ids.len()
            )),
            TrySendError::Closed(_) => JobDispatchError::unavailable("refresh consumer stopped"),
        })
    }
}
