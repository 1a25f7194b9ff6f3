//! Driven port for submission records and mirrored Chronos user identities.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::define_port_error;
use crate::domain::ids::{PreprintId, SubmissionId};
use crate::domain::submission::{
    ExternalIdentity, ManuscriptReconciliation, NewSubmission, Submission,
};

define_port_error! {
    /// Persistence errors raised by submission repository adapters.
    pub enum SubmissionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "submission repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "submission repository query failed: {message}",
        /// A uniqueness rule rejected the insert.
        Duplicate { message: String } =>
            "submission already recorded: {message}",
        /// The referenced submission does not exist.
        Missing { id: String } =>
            "submission {id} not found",
    }
}

/// Port for submission persistence.
///
/// Adapters must enforce, at write time, that a preprint holds at most one
/// non-cancelled submission per journal and at most one active submission
/// overall, reporting violations as [`SubmissionRepositoryError::Duplicate`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Fetch one submission.
    async fn find_by_id(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<Submission>, SubmissionRepositoryError>;

    /// All submissions of a preprint, oldest first.
    async fn list_for_preprint(
        &self,
        preprint_id: &PreprintId,
    ) -> Result<Vec<Submission>, SubmissionRepositoryError>;

    /// Claim up to `limit` submissions neither reconciled nor claimed since
    /// `cutoff`, least recently refreshed first.
    ///
    /// Claimed rows are stamped with `claimed_at`, so they are not offered
    /// again until the cutoff passes that instant. A refresh that keeps
    /// failing therefore moves to the back of the line instead of blocking
    /// every later sweep.
    async fn claim_stale(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
        claimed_at: DateTime<Utc>,
    ) -> Result<Vec<Submission>, SubmissionRepositoryError>;

    /// Insert a submission and mirror Chronos user ids atomically.
    async fn record_submission(
        &self,
        submission: &NewSubmission,
        identities: &[ExternalIdentity],
    ) -> Result<(), SubmissionRepositoryError>;

    /// Write reconciled upstream state and return the stored record.
    async fn reconcile(
        &self,
        id: &SubmissionId,
        reconciliation: &ManuscriptReconciliation,
    ) -> Result<Submission, SubmissionRepositoryError>;
}
