//! Domain port describing queue dispatch semantics for submission refreshes.
use async_trait::async_trait;

use super::define_port_error;
use crate::domain::ids::SubmissionId;

/// A batch of submissions whose status should be re-read from Chronos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSubmissionsJob {
    /// Submissions to reconcile, processed in order.
    pub submission_ids: Vec<SubmissionId>,
}

define_port_error! {
    /// Errors surfaced by the queue/dispatcher adapter.
    pub enum JobDispatchError {
        /// Queue infrastructure is unavailable.
        Unavailable { message: String } => "refresh queue is unavailable: {message}",
        /// The job could not be accepted.
        Rejected { message: String } => "refresh job was rejected: {message}",
    }
}

/// Fire-and-forget dispatch of refresh jobs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionRefreshQueue: Send + Sync {
    /// Enqueue a job for asynchronous processing.
    async fn enqueue(&self, job: RefreshSubmissionsJob) -> Result<(), JobDispatchError>;
}
