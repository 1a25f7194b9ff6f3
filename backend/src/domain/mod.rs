//! Domain primitives, rules and orchestration for the Chronos integration.
//!
//! Purpose: keep the submission rules, manuscript serialization and
//! reconciliation logic free of transport and storage concerns. Everything
//! outside the process is reached through the traits in [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport agnostic error payload.
//! - ChronosSubmissionService: submission, update and sync orchestration.
//! - ManuscriptSerializer: preprint to Chronos JSON mapping.
//! - SubmissionRefreshWorker: consumer for queued refresh jobs.

pub mod error;
pub mod ids;
pub mod journal;
pub mod manuscript;
pub mod ports;
pub mod preprint;
pub mod refresh_worker;
pub mod submission;
pub mod submission_service;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{
    ChronosUserId, FileId, IdValidationError, JournalId, PreprintId, PublicationId, SubmissionId,
    UserId,
};
pub use self::journal::{Journal, JournalSyncReport};
pub use self::manuscript::{ManuscriptError, ManuscriptSerializer};
pub use self::preprint::{
    Contributor, FileNode, FileNodeKind, LocalUser, ModerationState, Preprint,
};
pub use self::refresh_worker::{RefreshOutcome, SubmissionRefreshWorker};
pub use self::submission::{
    ExternalIdentity, ManuscriptReconciliation, NewSubmission, Submission, SubmissionStatus,
};
pub use self::submission_service::{
    ChronosSubmissionConfig, ChronosSubmissionPorts, ChronosSubmissionService,
};
