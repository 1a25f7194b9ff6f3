//! Port error mapping and response translation for the submission service.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::Error;
use crate::domain::ids::ChronosUserId;
use crate::domain::journal::Journal;
use crate::domain::manuscript::ManuscriptError;
use crate::domain::ports::{
    ChronosGatewayError, JobDispatchError, JournalEntry, JournalRepositoryError,
    ManuscriptSnapshot, PreprintSourceError, SubmissionReceipt, SubmissionRepositoryError,
    UserIdentityRepositoryError,
};
use crate::domain::preprint::{LocalUser, Preprint};
use crate::domain::submission::{ExternalIdentity, ManuscriptReconciliation};

pub(super) fn map_gateway_error(error: ChronosGatewayError) -> Error {
    match error {
        ChronosGatewayError::Transport { message } => {
            Error::service_unavailable(format!("chronos unreachable: {message}"))
        }
        ChronosGatewayError::Timeout { message } => {
            Error::service_unavailable(format!("chronos timed out: {message}"))
        }
        ChronosGatewayError::Authentication { message } => {
            Error::upstream_failure(format!("chronos refused credentials: {message}"))
                .with_details(json!({ "code": "chronos_authentication" }))
        }
        ChronosGatewayError::Status { status, message } => {
            Error::upstream_failure(format!("chronos returned status {status}: {message}"))
                .with_details(json!({ "code": "chronos_status", "upstreamStatus": status }))
        }
        ChronosGatewayError::Decode { message } => {
            Error::upstream_failure(format!("chronos response unreadable: {message}"))
                .with_details(json!({ "code": "chronos_decode" }))
        }
        ChronosGatewayError::NotImplemented { operation } => {
            Error::not_implemented(format!("chronos does not support {operation}"))
        }
    }
}

pub(super) fn map_journal_repository_error(error: JournalRepositoryError) -> Error {
    match error {
        JournalRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("journal repository unavailable: {message}"))
        }
        JournalRepositoryError::Query { message } => {
            Error::internal(format!("journal repository error: {message}"))
        }
    }
}

pub(super) fn map_submission_repository_error(error: SubmissionRepositoryError) -> Error {
    match error {
        SubmissionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("submission repository unavailable: {message}"))
        }
        SubmissionRepositoryError::Query { message } => {
            Error::internal(format!("submission repository error: {message}"))
        }
        SubmissionRepositoryError::Duplicate { message } => {
            Error::conflict(format!("submission already recorded: {message}"))
                .with_details(json!({ "code": "duplicate_submission" }))
        }
        SubmissionRepositoryError::Missing { id } => {
            Error::not_found(format!("submission {id} not found"))
        }
    }
}

pub(super) fn map_identity_error(error: UserIdentityRepositoryError) -> Error {
    match error {
        UserIdentityRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("identity repository unavailable: {message}"))
        }
        UserIdentityRepositoryError::Query { message } => {
            Error::internal(format!("identity repository error: {message}"))
        }
    }
}

pub(super) fn map_preprint_source_error(error: PreprintSourceError) -> Error {
    match error {
        PreprintSourceError::Unavailable { message } => {
            Error::service_unavailable(format!("preprint source unavailable: {message}"))
        }
        PreprintSourceError::Invalid { message } => {
            Error::internal(format!("preprint record invalid: {message}"))
        }
    }
}

pub(super) fn map_manuscript_error(error: ManuscriptError) -> Error {
    match error {
        ManuscriptError::NotAFile { .. } => Error::invalid_request(error.to_string())
            .with_details(json!({ "code": "manuscript_not_a_file" })),
        ManuscriptError::MissingPrimaryFile { .. } => Error::invalid_request(error.to_string())
            .with_details(json!({ "code": "manuscript_missing_file" })),
        ManuscriptError::FileUrl(inner) => {
            Error::internal(format!("manuscript file link failed: {inner}"))
        }
    }
}

pub(super) fn map_queue_error(error: JobDispatchError) -> Error {
    Error::service_unavailable(format!("refresh dispatch failed: {error}"))
}

pub(super) fn journal_from_entry(entry: JournalEntry) -> Journal {
    Journal {
        journal_id: entry.journal_id,
        title: entry.title,
        publisher_name: entry.publisher_name,
        raw_response: entry.raw,
    }
}

pub(super) fn reconciliation_from_snapshot(
    snapshot: ManuscriptSnapshot,
    reconciled_at: DateTime<Utc>,
) -> ManuscriptReconciliation {
    ManuscriptReconciliation {
        status: snapshot.status,
        submission_url: snapshot.submission_url.filter(|url| !url.is_empty()),
        raw_response: snapshot.raw,
        reconciled_at,
    }
}

/// Pair local users with the Chronos ids returned by a submission.
///
/// The submitter takes the response's user id. Visible contributors, in
/// position order, are zipped with the response's author list; surplus
/// entries on either side and missing ids are skipped. A user appearing twice
/// keeps the first id learned.
pub(super) fn backfill_identities(
    submitter: &LocalUser,
    preprint: &Preprint,
    receipt: &SubmissionReceipt,
) -> Vec<ExternalIdentity> {
    let mut identities: Vec<ExternalIdentity> = Vec::new();
    let mut learn = |user: &LocalUser, chronos: Option<&ChronosUserId>| {
        let Some(chronos_user_id) = chronos else {
            return;
        };
        if identities.iter().any(|known| known.user_id == user.id) {
            return;
        }
        identities.push(ExternalIdentity {
            user_id: user.id,
            chronos_user_id: chronos_user_id.clone(),
        });
    };

    learn(submitter, receipt.submitter_chronos_id.as_ref());
    for (contributor, chronos) in preprint
        .visible_contributors()
        .into_iter()
        .zip(receipt.author_chronos_ids.iter())
    {
        learn(&contributor.user, chronos.as_ref());
    }
    identities
}
