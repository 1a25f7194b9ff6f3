//! Submission records tracking one manuscript inside one journal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::{ChronosUserId, JournalId, PreprintId, PublicationId, SubmissionId, UserId};

/// Chronos submission status, mirrored locally.
///
/// Transitions are owned by Chronos; the local system never advances a status
/// on its own. Codes outside the known set are preserved as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum SubmissionStatus {
    /// `1`: drafted, not yet sent to the journal.
    Draft,
    /// `2`: submitted to the journal.
    Submitted,
    /// `3`: accepted by the journal.
    Accepted,
    /// `4`: published.
    Published,
    /// `5`: cancelled by the author or the journal.
    Cancelled,
    /// Any other upstream code.
    Unknown(i32),
}

impl SubmissionStatus {
    /// Numeric Chronos code.
    pub const fn code(self) -> i32 {
        match self {
            Self::Draft => 1,
            Self::Submitted => 2,
            Self::Accepted => 3,
            Self::Published => 4,
            Self::Cancelled => 5,
            Self::Unknown(code) => code,
        }
    }

    /// Decode a numeric Chronos code.
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Draft,
            2 => Self::Submitted,
            3 => Self::Accepted,
            4 => Self::Published,
            5 => Self::Cancelled,
            other => Self::Unknown(other),
        }
    }

    /// Submitted, accepted or published: blocks submissions to other journals.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Submitted | Self::Accepted | Self::Published)
    }

    /// Cancelled submissions no longer hold the (preprint, journal) slot.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<i32> for SubmissionStatus {
    fn from(value: i32) -> Self {
        Self::from_code(value)
    }
}

impl From<SubmissionStatus> for i32 {
    fn from(value: SubmissionStatus) -> Self {
        value.code()
    }
}

/// A persisted submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Local id.
    pub id: SubmissionId,
    /// Target journal.
    pub journal_id: JournalId,
    /// Submitted preprint.
    pub preprint_id: PreprintId,
    /// User who triggered the submission.
    pub submitter_id: UserId,
    /// Chronos publication id.
    pub publication_id: PublicationId,
    /// Latest status reported by Chronos.
    pub status: SubmissionStatus,
    /// Chronos page for the submission, once known.
    pub submission_url: Option<String>,
    /// Latest upstream manuscript payload.
    pub raw_response: Value,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last reconciliation instant.
    pub modified_at: DateTime<Utc>,
}

impl Submission {
    /// True when the last reconciliation happened before `cutoff`.
    pub fn is_stale(&self, cutoff: DateTime<Utc>) -> bool {
        self.modified_at < cutoff
    }
}

/// Insert payload for a freshly accepted remote submission.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubmission {
    /// Local id to assign.
    pub id: SubmissionId,
    /// Target journal.
    pub journal_id: JournalId,
    /// Submitted preprint.
    pub preprint_id: PreprintId,
    /// Submitting user.
    pub submitter_id: UserId,
    /// Chronos publication id.
    pub publication_id: PublicationId,
    /// Status returned by Chronos.
    pub status: SubmissionStatus,
    /// Chronos page, when returned.
    pub submission_url: Option<String>,
    /// Raw submission response.
    pub raw_response: Value,
    /// Insert instant, used for both timestamps.
    pub recorded_at: DateTime<Utc>,
}

impl NewSubmission {
    /// Materialise the stored record.
    pub fn into_submission(self) -> Submission {
        Submission {
            id: self.id,
            journal_id: self.journal_id,
            preprint_id: self.preprint_id,
            submitter_id: self.submitter_id,
            publication_id: self.publication_id,
            status: self.status,
            submission_url: self.submission_url,
            raw_response: self.raw_response,
            created_at: self.recorded_at,
            modified_at: self.recorded_at,
        }
    }
}

/// A local user paired with the Chronos id learned for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    /// Local user.
    pub user_id: UserId,
    /// Chronos user id.
    pub chronos_user_id: ChronosUserId,
}

/// Fields written back after fetching or updating a manuscript.
#[derive(Debug, Clone, PartialEq)]
pub struct ManuscriptReconciliation {
    /// Status reported by Chronos.
    pub status: SubmissionStatus,
    /// New submission URL; `None` keeps the stored value.
    pub submission_url: Option<String>,
    /// Upstream payload.
    pub raw_response: Value,
    /// Reconciliation instant.
    pub reconciled_at: DateTime<Utc>,
}

impl ManuscriptReconciliation {
    /// Apply the reconciliation to an in-memory record.
    pub fn apply_to(&self, submission: &mut Submission) {
        submission.status = self.status;
        if let Some(url) = &self.submission_url {
            submission.submission_url = Some(url.clone());
        }
        submission.raw_response = self.raw_response.clone();
        submission.modified_at = self.reconciled_at;
    }
}
