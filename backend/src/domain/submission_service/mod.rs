//! Chronos submission orchestration.
//!
//! The service sequences eligibility checks, manuscript serialization, the
//! Chronos call and persistence. The network call never runs inside a
//! database transaction: a submission accepted by Chronos but lost to a
//! concurrent local insert is reported as a conflict and cannot be undone
//! remotely.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::Error;
use crate::domain::ids::{ChronosUserId, JournalId, PreprintId, SubmissionId, UserId};
use crate::domain::journal::{Journal, JournalSyncReport};
use crate::domain::manuscript::ManuscriptSerializer;
use crate::domain::ports::{
    ChronosGateway, JournalRepository, ManuscriptSnapshot, PreprintSource, RefreshSubmissionsJob,
    SubmissionRefreshQueue, SubmissionRepository, SubmissionRepositoryError,
    UserIdentityRepository,
};
use crate::domain::preprint::{LocalUser, Preprint};
use crate::domain::submission::{NewSubmission, Submission};

mod eligibility;
mod mapping;

pub use eligibility::{
    ACTIVE_SUBMISSION_EXISTS, DUPLICATE_JOURNAL_SUBMISSION, PREPRINT_NOT_ACCEPTED,
};
use mapping::{
    backfill_identities, journal_from_entry, map_gateway_error, map_identity_error,
    map_journal_repository_error, map_manuscript_error, map_preprint_source_error,
    map_queue_error, map_submission_repository_error, reconciliation_from_snapshot,
};

/// Default age after which a submission's status is re-read.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(300);

/// Port bundle required by the submission service.
pub struct ChronosSubmissionPorts {
    /// Chronos partner API.
    pub gateway: Arc<dyn ChronosGateway>,
    /// Local journal catalogue.
    pub journals: Arc<dyn JournalRepository>,
    /// Submission records.
    pub submissions: Arc<dyn SubmissionRepository>,
    /// Mirrored Chronos user ids.
    pub identities: Arc<dyn UserIdentityRepository>,
    /// Host preprint records.
    pub preprints: Arc<dyn PreprintSource>,
    /// Refresh job dispatch.
    pub refresh_queue: Arc<dyn SubmissionRefreshQueue>,
}

/// Tunables for the submission service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChronosSubmissionConfig {
    /// Submissions not reconciled for this long are refreshed.
    pub stale_after: Duration,
}

impl Default for ChronosSubmissionConfig {
    fn default() -> Self {
        Self {
            stale_after: DEFAULT_STALE_AFTER,
        }
    }
}

/// Orchestrates manuscript submissions to Chronos.
#[derive(Clone)]
pub struct ChronosSubmissionService {
    gateway: Arc<dyn ChronosGateway>,
    journals: Arc<dyn JournalRepository>,
    submissions: Arc<dyn SubmissionRepository>,
    identities: Arc<dyn UserIdentityRepository>,
    preprints: Arc<dyn PreprintSource>,
    refresh_queue: Arc<dyn SubmissionRefreshQueue>,
    serializer: ManuscriptSerializer,
    clock: Arc<dyn Clock>,
    config: ChronosSubmissionConfig,
}

impl ChronosSubmissionService {
    /// Build the service from its ports.
    pub fn new(
        ports: ChronosSubmissionPorts,
        serializer: ManuscriptSerializer,
        clock: Arc<dyn Clock>,
        config: ChronosSubmissionConfig,
    ) -> Self {
        Self {
            gateway: ports.gateway,
            journals: ports.journals,
            submissions: ports.submissions,
            identities: ports.identities,
            preprints: ports.preprints,
            refresh_queue: ports.refresh_queue,
            serializer,
            clock,
            config,
        }
    }

    /// Submit `preprint` to `journal_id` on behalf of `submitter`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::NotFound`] for an unknown journal,
    /// [`crate::domain::ErrorCode::Conflict`] when an eligibility rule or a
    /// uniqueness constraint rejects the submission, and mapped port errors
    /// otherwise.
    pub async fn submit_manuscript(
        &self,
        journal_id: &JournalId,
        preprint: &Preprint,
        submitter: &LocalUser,
    ) -> Result<Submission, Error> {
        self.require_journal(journal_id).await?;

        let existing = self
            .submissions
            .list_for_preprint(&preprint.id)
            .await
            .map_err(map_submission_repository_error)?;
        eligibility::check_eligibility(journal_id, preprint, &existing)?;

        let known = self.known_identities(preprint, Some(submitter)).await?;
        let preprint = preprint_with_identities(preprint, &known);
        let submitter = user_with_identity(submitter, &known);
        let request = self
            .serializer
            .submission_request(journal_id, &preprint, &submitter)
            .map_err(map_manuscript_error)?;
        let receipt = self
            .gateway
            .submit_manuscript(&request)
            .await
            .map_err(map_gateway_error)?;

        let identities = backfill_identities(&submitter, &preprint, &receipt);
        let record = NewSubmission {
            id: SubmissionId::random(),
            journal_id: journal_id.clone(),
            preprint_id: preprint.id,
            submitter_id: submitter.id,
            publication_id: receipt.publication_id.clone(),
            status: receipt.status,
            submission_url: receipt.submission_url.clone().filter(|url| !url.is_empty()),
            raw_response: receipt.raw.clone(),
            recorded_at: self.clock.utc(),
        };

        match self.submissions.record_submission(&record, &identities).await {
            Ok(()) => {}
            Err(SubmissionRepositoryError::Duplicate { message }) => {
                warn!(
                    preprint_id = %preprint.id,
                    journal_id = %journal_id,
                    publication_id = %receipt.publication_id,
                    "chronos accepted a submission that lost a local uniqueness race: {message}"
                );
                return Err(Error::conflict(format!(
                    "preprint {} already has a conflicting submission",
                    preprint.id
                ))
                .with_details(json!({
                    "code": "duplicate_submission",
                    "preprintId": preprint.id,
                    "journalId": journal_id,
                    "publicationId": receipt.publication_id,
                })));
            }
            Err(other) => return Err(map_submission_repository_error(other)),
        }

        info!(
            submission_id = %record.id,
            preprint_id = %preprint.id,
            journal_id = %journal_id,
            status = record.status.code(),
            backfilled = identities.len(),
            "submitted manuscript to chronos"
        );
        Ok(record.into_submission())
    }

    /// Re-send a submission's manuscript with its current status.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::NotFound`] when the submission,
    /// its preprint or its journal is missing, and mapped port errors
    /// otherwise.
    pub async fn update_manuscript(&self, id: &SubmissionId) -> Result<Submission, Error> {
        let submission = self.require_submission(id).await?;
        self.require_journal(&submission.journal_id).await?;
        let preprint = self.require_preprint(&submission.preprint_id).await?;
        let known = self.known_identities(&preprint, None).await?;
        let preprint = preprint_with_identities(&preprint, &known);

        let request = self
            .serializer
            .update_request(
                &submission.journal_id,
                &preprint,
                submission.status,
                &submission.publication_id,
            )
            .map_err(map_manuscript_error)?;
        let snapshot = self
            .gateway
            .update_manuscript(&request)
            .await
            .map_err(map_gateway_error)?;

        self.reconcile(&submission, snapshot).await
    }

    /// Pull the manuscript's current state from Chronos and store it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::NotFound`] for an unknown
    /// submission and mapped port errors otherwise.
    pub async fn sync_manuscript(&self, id: &SubmissionId) -> Result<Submission, Error> {
        let submission = self.require_submission(id).await?;
        let snapshot = self
            .gateway
            .fetch_manuscript(&submission.publication_id)
            .await
            .map_err(map_gateway_error)?;

        self.reconcile(&submission, snapshot).await
    }

    /// Replace the local journal catalogue with Chronos's.
    ///
    /// # Errors
    ///
    /// Returns mapped gateway or repository errors.
    pub async fn sync_journals(&self) -> Result<JournalSyncReport, Error> {
        let entries = self
            .gateway
            .fetch_journals()
            .await
            .map_err(map_gateway_error)?;
        let fetched = entries.len();
        let journals: Vec<Journal> = entries.into_iter().map(journal_from_entry).collect();
        let upserted = self
            .journals
            .upsert_journals(&journals)
            .await
            .map_err(map_journal_repository_error)?;

        info!(fetched, upserted, "synchronised chronos journal catalogue");
        Ok(JournalSyncReport { fetched, upserted })
    }

    /// Journals published by `publisher`.
    ///
    /// # Errors
    ///
    /// Chronos offers no such lookup, so this currently always returns
    /// [`crate::domain::ErrorCode::NotImplemented`].
    pub async fn journals_by_publisher(&self, publisher: &str) -> Result<Vec<Journal>, Error> {
        let entries = self
            .gateway
            .journals_by_publisher(publisher)
            .await
            .map_err(map_gateway_error)?;
        Ok(entries.into_iter().map(journal_from_entry).collect())
    }

    /// Journals matching `issn`.
    ///
    /// # Errors
    ///
    /// Chronos offers no such lookup, so this currently always returns
    /// [`crate::domain::ErrorCode::NotImplemented`].
    pub async fn journals_by_issn(&self, issn: &str) -> Result<Vec<Journal>, Error> {
        let entries = self
            .gateway
            .journals_by_issn(issn)
            .await
            .map_err(map_gateway_error)?;
        Ok(entries.into_iter().map(journal_from_entry).collect())
    }

    /// Locally stored journals.
    ///
    /// # Errors
    ///
    /// Returns mapped repository errors.
    pub async fn list_journals(&self) -> Result<Vec<Journal>, Error> {
        self.journals
            .list()
            .await
            .map_err(map_journal_repository_error)
    }

    /// Submissions of a preprint, oldest first.
    ///
    /// # Errors
    ///
    /// Returns mapped repository errors.
    pub async fn list_submissions(
        &self,
        preprint_id: &PreprintId,
    ) -> Result<Vec<Submission>, Error> {
        self.submissions
            .list_for_preprint(preprint_id)
            .await
            .map_err(map_submission_repository_error)
    }

    /// Queue a refresh of the preprint's stale submissions.
    ///
    /// Returns the number of submissions queued; nothing is dispatched when
    /// none is stale.
    ///
    /// # Errors
    ///
    /// Returns mapped repository or queue errors.
    pub async fn refresh_stale_submissions(
        &self,
        preprint_id: &PreprintId,
    ) -> Result<usize, Error> {
        let cutoff = self.stale_cutoff();
        let stale: Vec<SubmissionId> = self
            .list_submissions(preprint_id)
            .await?
            .into_iter()
            .filter(|s| s.is_stale(cutoff))
            .map(|s| s.id)
            .collect();
        self.dispatch_refresh(stale).await
    }

    /// Claim and queue up to `limit` stale submissions, least recently
    /// refreshed first.
    ///
    /// Claimed submissions are skipped by later sweeps until `stale_after`
    /// has passed again, whether or not their refresh succeeds.
    ///
    /// # Errors
    ///
    /// Returns mapped repository or queue errors.
    pub async fn enqueue_stale(&self, limit: usize) -> Result<usize, Error> {
        let stale: Vec<SubmissionId> = self
            .submissions
            .claim_stale(self.stale_cutoff(), limit, self.clock.utc())
            .await
            .map_err(map_submission_repository_error)?
            .into_iter()
            .map(|s| s.id)
            .collect();
        self.dispatch_refresh(stale).await
    }

    async fn dispatch_refresh(&self, submission_ids: Vec<SubmissionId>) -> Result<usize, Error> {
        if submission_ids.is_empty() {
            return Ok(0);
        }
        let queued = submission_ids.len();
        self.refresh_queue
            .enqueue(RefreshSubmissionsJob { submission_ids })
            .await
            .map_err(map_queue_error)?;
        debug!(queued, "queued stale chronos submissions for refresh");
        Ok(queued)
    }

    fn stale_cutoff(&self) -> DateTime<Utc> {
        let now = self.clock.utc();
        let age = TimeDelta::from_std(self.config.stale_after).unwrap_or(TimeDelta::MAX);
        now.checked_sub_signed(age).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    async fn reconcile(
        &self,
        submission: &Submission,
        snapshot: ManuscriptSnapshot,
    ) -> Result<Submission, Error> {
        let reconciliation = reconciliation_from_snapshot(snapshot, self.clock.utc());
        let stored = self
            .submissions
            .reconcile(&submission.id, &reconciliation)
            .await
            .map_err(map_submission_repository_error)?;

        info!(
            submission_id = %stored.id,
            previous_status = submission.status.code(),
            status = stored.status.code(),
            "reconciled chronos manuscript"
        );
        Ok(stored)
    }

    async fn require_journal(&self, journal_id: &JournalId) -> Result<Journal, Error> {
        self.journals
            .find_by_id(journal_id)
            .await
            .map_err(map_journal_repository_error)?
            .ok_or_else(|| {
                Error::not_found(format!("journal {journal_id} is not in the catalogue"))
                    .with_details(json!({
                        "code": "journal_not_found",
                        "journalId": journal_id,
                    }))
            })
    }

    async fn require_submission(&self, id: &SubmissionId) -> Result<Submission, Error> {
        self.submissions
            .find_by_id(id)
            .await
            .map_err(map_submission_repository_error)?
            .ok_or_else(|| Error::not_found(format!("submission {id} not found")))
    }

    async fn require_preprint(&self, id: &PreprintId) -> Result<Preprint, Error> {
        self.preprints
            .find_preprint(id)
            .await
            .map_err(map_preprint_source_error)?
            .ok_or_else(|| Error::not_found(format!("preprint {id} not found")))
    }

    async fn known_identities(
        &self,
        preprint: &Preprint,
        submitter: Option<&LocalUser>,
    ) -> Result<HashMap<UserId, ChronosUserId>, Error> {
        let wanted: Vec<UserId> = preprint
            .contributors
            .iter()
            .map(|c| &c.user)
            .chain(submitter)
            .filter(|user| user.chronos_user_id.is_none())
            .map(|user| user.id)
            .collect();
        if wanted.is_empty() {
            return Ok(HashMap::new());
        }
        self.identities
            .find_chronos_ids(&wanted)
            .await
            .map_err(map_identity_error)
    }
}

fn user_with_identity(user: &LocalUser, known: &HashMap<UserId, ChronosUserId>) -> LocalUser {
    let mut user = user.clone();
    if user.chronos_user_id.is_none() {
        user.chronos_user_id = known.get(&user.id).cloned();
    }
    user
}

fn preprint_with_identities(
    preprint: &Preprint,
    known: &HashMap<UserId, ChronosUserId>,
) -> Preprint {
    let mut preprint = preprint.clone();
    for contributor in &mut preprint.contributors {
        contributor.user = user_with_identity(&contributor.user, known);
    }
    preprint
}
