//! In-memory adapters mirroring the PostgreSQL behaviour.
//!
//! The submission store applies the same uniqueness rules as the partial
//! unique indexes in the migrations, so races and duplicates can be tested
//! without a database.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ids::{ChronosUserId, JournalId, PreprintId, SubmissionId, UserId};
use crate::domain::journal::Journal;
use crate::domain::ports::{
    JobDispatchError, JournalRepository, JournalRepositoryError, PreprintSource,
    PreprintSourceError, RefreshSubmissionsJob, SubmissionRefreshQueue, SubmissionRepository,
    SubmissionRepositoryError, UserIdentityRepository, UserIdentityRepositoryError,
};
use crate::domain::preprint::Preprint;
use crate::domain::submission::{
    ExternalIdentity, ManuscriptReconciliation, NewSubmission, Submission,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("in-memory store poisoned"),
    }
}

/// Journal catalogue keyed by Chronos journal id.
#[derive(Default)]
pub struct InMemoryJournalRepository {
    journals: Mutex<BTreeMap<JournalId, Journal>>,
}

impl InMemoryJournalRepository {
    /// Number of stored journals.
    pub fn len(&self) -> usize {
        lock(&self.journals).len()
    }

    /// True when no journal is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl JournalRepository for InMemoryJournalRepository {
    async fn upsert_journals(&self, journals: &[Journal]) -> Result<usize, JournalRepositoryError> {
        let mut stored = lock(&self.journals);
        for journal in journals {
            stored.insert(journal.journal_id.clone(), journal.clone());
        }
        Ok(journals.len())
    }

    async fn find_by_id(
        &self,
        journal_id: &JournalId,
    ) -> Result<Option<Journal>, JournalRepositoryError> {
        Ok(lock(&self.journals).get(journal_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Journal>, JournalRepositoryError> {
        let mut journals: Vec<Journal> = lock(&self.journals).values().cloned().collect();
        journals.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(journals)
    }
}

/// Submission store with mirrored Chronos user ids.
#[derive(Default)]
pub struct InMemorySubmissionRepository {
    submissions: Mutex<Vec<Submission>>,
    identities: Mutex<HashMap<UserId, ChronosUserId>>,
    refresh_claims: Mutex<HashMap<SubmissionId, DateTime<Utc>>>,
}

impl InMemorySubmissionRepository {
    /// Seed a submission without uniqueness checks.
    pub fn insert(&self, submission: Submission) {
        lock(&self.submissions).push(submission);
    }

    /// Seed a mirrored identity.
    pub fn insert_identity(&self, user_id: UserId, chronos_user_id: ChronosUserId) {
        lock(&self.identities).insert(user_id, chronos_user_id);
    }

    /// Every stored submission.
    pub fn all(&self) -> Vec<Submission> {
        lock(&self.submissions).clone()
    }

    /// Mirrored Chronos id for `user_id`.
    pub fn chronos_id_for(&self, user_id: &UserId) -> Option<ChronosUserId> {
        lock(&self.identities).get(user_id).cloned()
    }

    /// Latest of the last reconciliation and the last refresh claim.
    fn last_refresh(&self, submission: &Submission) -> DateTime<Utc> {
        lock(&self.refresh_claims)
            .get(&submission.id)
            .map_or(submission.modified_at, |claimed| {
                (*claimed).max(submission.modified_at)
            })
    }

    fn violation(existing: &[Submission], candidate: &NewSubmission) -> Option<String> {
        let same_preprint = existing
            .iter()
            .filter(|s| s.preprint_id == candidate.preprint_id);
        for submission in same_preprint {
            if submission.journal_id == candidate.journal_id && !submission.status.is_terminal() {
                return Some(format!(
                    "preprint {} already has a submission to {}",
                    candidate.preprint_id, candidate.journal_id
                ));
            }
            if candidate.status.is_active() && submission.status.is_active() {
                return Some(format!(
                    "preprint {} already has an active submission",
                    candidate.preprint_id
                ));
            }
        }
        None
    }
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn find_by_id(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<Submission>, SubmissionRepositoryError> {
        Ok(lock(&self.submissions).iter().find(|s| s.id == *id).cloned())
    }

    async fn list_for_preprint(
        &self,
        preprint_id: &PreprintId,
    ) -> Result<Vec<Submission>, SubmissionRepositoryError> {
        let mut matching: Vec<Submission> = lock(&self.submissions)
            .iter()
            .filter(|s| s.preprint_id == *preprint_id)
            .cloned()
            .collect();
        matching.sort_by_key(|s| s.created_at);
        Ok(matching)
    }

    async fn claim_stale(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
        claimed_at: DateTime<Utc>,
    ) -> Result<Vec<Submission>, SubmissionRepositoryError> {
        let mut stale: Vec<(DateTime<Utc>, Submission)> = lock(&self.submissions)
            .iter()
            .map(|s| (self.last_refresh(s), s.clone()))
            .filter(|(last, _)| *last < cutoff)
            .collect();
        stale.sort_by_key(|(last, _)| *last);
        stale.truncate(limit);

        let mut claims = lock(&self.refresh_claims);
        Ok(stale
            .into_iter()
            .map(|(_, submission)| {
                claims.insert(submission.id, claimed_at);
                submission
            })
            .collect())
    }

    async fn record_submission(
        &self,
        submission: &NewSubmission,
        identities: &[ExternalIdentity],
    ) -> Result<(), SubmissionRepositoryError> {
        let mut submissions = lock(&self.submissions);
        if let Some(message) = Self::violation(&submissions, submission) {
            return Err(SubmissionRepositoryError::duplicate(message));
        }
        submissions.push(submission.clone().into_submission());

        let mut mirrored = lock(&self.identities);
        for identity in identities {
            mirrored.insert(identity.user_id, identity.chronos_user_id.clone());
        }
        Ok(())
    }

    async fn reconcile(
        &self,
        id: &SubmissionId,
        reconciliation: &ManuscriptReconciliation,
    ) -> Result<Submission, SubmissionRepositoryError> {
        let mut submissions = lock(&self.submissions);
        let stored = submissions
            .iter_mut()
            .find(|s| s.id == *id)
            .ok_or_else(|| SubmissionRepositoryError::missing(id.to_string()))?;
        reconciliation.apply_to(stored);
        Ok(stored.clone())
    }
}

#[async_trait]
impl UserIdentityRepository for InMemorySubmissionRepository {
    async fn find_chronos_ids(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, ChronosUserId>, UserIdentityRepositoryError> {
        let mirrored = lock(&self.identities);
        Ok(user_ids
            .iter()
            .filter_map(|id| mirrored.get(id).map(|chronos| (*id, chronos.clone())))
            .collect())
    }
}

/// Host-side preprint store.
#[derive(Default)]
pub struct InMemoryPreprintSource {
    preprints: Mutex<HashMap<PreprintId, Preprint>>,
}

impl InMemoryPreprintSource {
    /// Store a preprint.
    pub fn insert_preprint(&self, preprint: Preprint) {
        lock(&self.preprints).insert(preprint.id, preprint);
    }
}

#[async_trait]
impl PreprintSource for InMemoryPreprintSource {
    async fn find_preprint(
        &self,
        id: &PreprintId,
    ) -> Result<Option<Preprint>, PreprintSourceError> {
        Ok(lock(&self.preprints).get(id).cloned())
    }
}

/// Queue recording every dispatched job.
#[derive(Default)]
pub struct RecordingRefreshQueue {
    jobs: Mutex<Vec<RefreshSubmissionsJob>>,
}

impl RecordingRefreshQueue {
    /// Jobs dispatched so far.
    pub fn jobs(&self) -> Vec<RefreshSubmissionsJob> {
        lock(&self.jobs).clone()
    }
}

#[async_trait]
impl SubmissionRefreshQueue for RecordingRefreshQueue {
    async fn enqueue(&self, job: RefreshSubmissionsJob) -> Result<(), JobDispatchError> {
        lock(&self.jobs).push(job);
        Ok(())
    }
}
