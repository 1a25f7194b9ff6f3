//! PostgreSQL-backed submission records and mirrored Chronos identities.
//!
//! The partial unique indexes on `chronos_submissions` are the final word on
//! eligibility: a concurrent submission that slipped past the service's
//! pre-checks is rejected here and reported as a duplicate.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ids::{
    ChronosUserId, JournalId, PreprintId, PublicationId, SubmissionId, UserId,
};
use crate::domain::ports::{
    SubmissionRepository, SubmissionRepositoryError, UserIdentityRepository,
    UserIdentityRepositoryError,
};
use crate::domain::submission::{
    ExternalIdentity, ManuscriptReconciliation, NewSubmission, Submission, SubmissionStatus,
};

use super::diesel_helpers::{DieselFailure, classify_diesel_error, sql_limit};
use super::models::{
    NewSubmissionRow, NewUserIdentityRow, SubmissionReconcileUpdate, SubmissionRow,
    UserIdentityRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{chronos_submissions, chronos_user_identities};

/// Diesel-backed implementation of the submission and identity ports.
#[derive(Clone)]
pub struct DieselSubmissionRepository {
    pool: DbPool,
}

impl DieselSubmissionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> SubmissionRepositoryError {
    SubmissionRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error, operation: &str) -> SubmissionRepositoryError {
    match classify_diesel_error(error, operation) {
        DieselFailure::Connection(message) => SubmissionRepositoryError::connection(message),
        DieselFailure::UniqueViolation {
            constraint: Some(constraint),
            ..
        } => SubmissionRepositoryError::duplicate(constraint),
        DieselFailure::UniqueViolation { message, .. } => {
            SubmissionRepositoryError::duplicate(message)
        }
        DieselFailure::Query(message) => SubmissionRepositoryError::query(message),
    }
}

fn map_identity_diesel_error(
    error: diesel::result::Error,
    operation: &str,
) -> UserIdentityRepositoryError {
    match classify_diesel_error(error, operation) {
        DieselFailure::Connection(message) => UserIdentityRepositoryError::connection(message),
        DieselFailure::UniqueViolation { message, .. } | DieselFailure::Query(message) => {
            UserIdentityRepositoryError::query(message)
        }
    }
}

fn row_to_submission(row: SubmissionRow) -> Result<Submission, SubmissionRepositoryError> {
    let journal_id = JournalId::new(row.journal_id)
        .map_err(|err| SubmissionRepositoryError::query(format!("stored journal id: {err}")))?;
    let publication_id = PublicationId::new(row.publication_id).map_err(|err| {
        SubmissionRepositoryError::query(format!("stored publication id: {err}"))
    })?;
    Ok(Submission {
        id: SubmissionId::from(row.id),
        journal_id,
        preprint_id: PreprintId::from(row.preprint_id),
        submitter_id: UserId::from(row.submitter_id),
        publication_id,
        status: SubmissionStatus::from_code(row.status),
        submission_url: row.submission_url,
        raw_response: row.raw_response,
        created_at: row.created_at,
        modified_at: row.modified_at,
    })
}

fn rows_to_submissions(
    rows: Vec<SubmissionRow>,
) -> Result<Vec<Submission>, SubmissionRepositoryError> {
    rows.into_iter().map(row_to_submission).collect()
}

/// One row per user; the first id offered for a user wins.
fn identity_rows(
    identities: &[ExternalIdentity],
    recorded_at: DateTime<Utc>,
) -> Vec<NewUserIdentityRow<'_>> {
    let mut seen = HashSet::new();
    identities
        .iter()
        .filter(|identity| seen.insert(identity.user_id))
        .map(|identity| NewUserIdentityRow {
            user_id: *identity.user_id.as_uuid(),
            chronos_user_id: identity.chronos_user_id.as_str(),
            updated_at: recorded_at,
        })
        .collect()
}

fn new_submission_row(submission: &NewSubmission) -> NewSubmissionRow<'_> {
    NewSubmissionRow {
        id: *submission.id.as_uuid(),
        journal_id: submission.journal_id.as_str(),
        preprint_id: *submission.preprint_id.as_uuid(),
        submitter_id: *submission.submitter_id.as_uuid(),
        publication_id: submission.publication_id.as_str(),
        status: submission.status.code(),
        submission_url: submission.submission_url.as_deref(),
        raw_response: &submission.raw_response,
        created_at: submission.recorded_at,
        modified_at: submission.recorded_at,
        last_refresh_at: submission.recorded_at,
    }
}

#[async_trait]
impl SubmissionRepository for DieselSubmissionRepository {
    async fn find_by_id(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<Submission>, SubmissionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<SubmissionRow> = chronos_submissions::table
            .filter(chronos_submissions::id.eq(id.as_uuid()))
            .select(SubmissionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "find submission"))?;
        row.map(row_to_submission).transpose()
    }

    async fn list_for_preprint(
        &self,
        preprint_id: &PreprintId,
    ) -> Result<Vec<Submission>, SubmissionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<SubmissionRow> = chronos_submissions::table
            .filter(chronos_submissions::preprint_id.eq(preprint_id.as_uuid()))
            .select(SubmissionRow::as_select())
            .order_by((chronos_submissions::created_at.asc(), chronos_submissions::id.asc()))
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "list submissions for preprint"))?;
        rows_to_submissions(rows)
    }

    async fn claim_stale(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
        claimed_at: DateTime<Utc>,
    ) -> Result<Vec<Submission>, SubmissionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<SubmissionRow> = conn
            .transaction(|conn| {
                async move {
                    // Concurrent sweeps skip rows another sweep is claiming.
                    let rows: Vec<SubmissionRow> = chronos_submissions::table
                        .filter(chronos_submissions::last_refresh_at.lt(cutoff))
                        .select(SubmissionRow::as_select())
                        .order_by((
                            chronos_submissions::last_refresh_at.asc(),
                            chronos_submissions::id.asc(),
                        ))
                        .limit(sql_limit(limit))
                        .for_update()
                        .skip_locked()
                        .load(conn)
                        .await?;
                    if rows.is_empty() {
                        return Ok(rows);
                    }

                    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
                    diesel::update(
                        chronos_submissions::table.filter(chronos_submissions::id.eq_any(ids)),
                    )
                    .set(chronos_submissions::last_refresh_at.eq(claimed_at))
                    .execute(conn)
                    .await?;
                    Ok(rows)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| map_diesel_error(err, "claim stale submissions"))?;
        rows_to_submissions(rows)
    }

    async fn record_submission(
        &self,
        submission: &NewSubmission,
        identities: &[ExternalIdentity],
    ) -> Result<(), SubmissionRepositoryError> {
        let submission_row = new_submission_row(submission);
        let mirrored = identity_rows(identities, submission.recorded_at);

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                diesel::insert_into(chronos_submissions::table)
                    .values(&submission_row)
                    .execute(conn)
                    .await?;

                if !mirrored.is_empty() {
                    diesel::insert_into(chronos_user_identities::table)
                        .values(&mirrored)
                        .on_conflict(chronos_user_identities::user_id)
                        .do_update()
                        .set((
                            chronos_user_identities::chronos_user_id
                                .eq(excluded(chronos_user_identities::chronos_user_id)),
                            chronos_user_identities::updated_at
                                .eq(excluded(chronos_user_identities::updated_at)),
                        ))
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_diesel_error(err, "record submission"))
    }

    async fn reconcile(
        &self,
        id: &SubmissionId,
        reconciliation: &ManuscriptReconciliation,
    ) -> Result<Submission, SubmissionRepositoryError> {
        let changeset = SubmissionReconcileUpdate {
            status: reconciliation.status.code(),
            submission_url: reconciliation.submission_url.as_deref(),
            raw_response: &reconciliation.raw_response,
            modified_at: reconciliation.reconciled_at,
            last_refresh_at: reconciliation.reconciled_at,
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<SubmissionRow> =
            diesel::update(chronos_submissions::table.find(id.as_uuid()))
                .set(&changeset)
                .returning(SubmissionRow::as_returning())
                .get_result(&mut conn)
                .await
                .optional()
                .map_err(|err| map_diesel_error(err, "reconcile submission"))?;

        match row {
            Some(row) => row_to_submission(row),
            None => Err(SubmissionRepositoryError::missing(id.to_string())),
        }
    }
}

#[async_trait]
impl UserIdentityRepository for DieselSubmissionRepository {
    async fn find_chronos_ids(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, ChronosUserId>, UserIdentityRepositoryError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let keys: Vec<Uuid> = user_ids.iter().map(|id| *id.as_uuid()).collect();

        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| UserIdentityRepositoryError::connection(err.into_message()))?;
        let rows: Vec<UserIdentityRow> = chronos_user_identities::table
            .filter(chronos_user_identities::user_id.eq_any(keys))
            .select(UserIdentityRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_identity_diesel_error(err, "find chronos ids"))?;

        rows.into_iter()
            .map(|row| {
                let chronos = ChronosUserId::new(row.chronos_user_id).map_err(|err| {
                    UserIdentityRepositoryError::query(format!("stored chronos user id: {err}"))
                })?;
                Ok((UserId::from(row.user_id), chronos))
            })
            .collect()
    }
}
