//! `DieselSubmissionRepository` against embedded PostgreSQL.
//!
//! Covers what only the database enforces: the partial unique indexes
//! behind submission eligibility, transactional identity mirroring, URL
//! retention on reconcile and refresh claims. Set `SKIP_TEST_CLUSTER=1`
//! where no cluster can start.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use serde_json::json;
use tokio::runtime::Runtime;

use chronos_sync::domain::ports::{
    JournalRepository, SubmissionRepository, SubmissionRepositoryError, UserIdentityRepository,
};
use chronos_sync::domain::{
    ChronosUserId, ExternalIdentity, JournalId, ManuscriptReconciliation, NewSubmission,
    PreprintId, PublicationId, Submission, SubmissionId, SubmissionStatus, UserId,
};
use chronos_sync::outbound::persistence::{
    DbPool, DieselJournalRepository, DieselSubmissionRepository, PoolConfig,
};
use chronos_sync::test_support::fixtures::sample_journal;

mod support;

use support::handle_cluster_setup_failure;
use support::pg_embed::{provision_database, shared_cluster};

struct Harness {
    runtime: Runtime,
    submissions: DieselSubmissionRepository,
    _database: TemporaryDatabase,
}

fn setup() -> Result<Harness, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let database = provision_database(cluster)?;
    let config = PoolConfig::new(database.url()).with_max_size(2);
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;

    let journals = DieselJournalRepository::new(pool.clone());
    runtime
        .block_on(journals.upsert_journals(&[
            sample_journal("J1", "Alpha Reviews"),
            sample_journal("J2", "Beta Letters"),
        ]))
        .map_err(|err| err.to_string())?;

    Ok(Harness {
        runtime,
        submissions: DieselSubmissionRepository::new(pool),
        _database: database,
    })
}

#[fixture]
fn harness() -> Option<Harness> {
    match setup() {
        Ok(harness) => Some(harness),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn at(offset_secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
        + TimeDelta::seconds(offset_secs)
}

fn submission(
    preprint_id: PreprintId,
    journal: &str,
    status: SubmissionStatus,
    recorded_at: DateTime<Utc>,
) -> NewSubmission {
    let id = SubmissionId::random();
    NewSubmission {
        id,
        journal_id: JournalId::new(journal).expect("journal id"),
        preprint_id,
        submitter_id: UserId::random(),
        publication_id: PublicationId::new(format!("PUB-{id}")).expect("publication id"),
        status,
        submission_url: Some(format!("https://chronos.example/s/{id}")),
        raw_response: json!({ "STATUS_CODE": status.code() }),
        recorded_at,
    }
}

fn reconciliation(
    status: SubmissionStatus,
    url: Option<&str>,
    reconciled_at: DateTime<Utc>,
) -> ManuscriptReconciliation {
    ManuscriptReconciliation {
        status,
        submission_url: url.map(str::to_owned),
        raw_response: json!({ "STATUS_CODE": status.code() }),
        reconciled_at,
    }
}

#[rstest]
fn second_submission_to_the_same_journal_is_a_duplicate(harness: Option<Harness>) {
    let Some(harness) = harness else {
        return;
    };
    let preprint = PreprintId::random();
    let repo = &harness.submissions;

    harness.runtime.block_on(async {
        repo.record_submission(&submission(preprint, "J1", SubmissionStatus::Draft, at(0)), &[])
            .await
            .expect("first draft");
        let error = repo
            .record_submission(&submission(preprint, "J1", SubmissionStatus::Draft, at(1)), &[])
            .await
            .expect_err("same journal twice");

        assert!(
            matches!(error, SubmissionRepositoryError::Duplicate { .. }),
            "expected duplicate, got {error:?}"
        );
        assert_eq!(repo.list_for_preprint(&preprint).await.expect("list").len(), 1);
    });
}

#[rstest]
fn only_one_active_submission_per_preprint(harness: Option<Harness>) {
    let Some(harness) = harness else {
        return;
    };
    let preprint = PreprintId::random();
    let repo = &harness.submissions;

    harness.runtime.block_on(async {
        repo.record_submission(
            &submission(preprint, "J1", SubmissionStatus::Submitted, at(0)),
            &[],
        )
        .await
        .expect("active submission");

        let error = repo
            .record_submission(
                &submission(preprint, "J2", SubmissionStatus::Accepted, at(1)),
                &[],
            )
            .await
            .expect_err("second active submission");
        assert!(matches!(error, SubmissionRepositoryError::Duplicate { .. }));

        repo.record_submission(&submission(preprint, "J2", SubmissionStatus::Draft, at(2)), &[])
            .await
            .expect("drafts elsewhere stay allowed");
    });
}

#[rstest]
fn cancelled_submission_frees_the_journal(harness: Option<Harness>) {
    let Some(harness) = harness else {
        return;
    };
    let preprint = PreprintId::random();
    let repo = &harness.submissions;

    harness.runtime.block_on(async {
        let first = submission(preprint, "J1", SubmissionStatus::Submitted, at(0));
        repo.record_submission(&first, &[]).await.expect("first");
        repo.reconcile(&first.id, &reconciliation(SubmissionStatus::Cancelled, None, at(60)))
            .await
            .expect("cancel");

        let again = submission(preprint, "J1", SubmissionStatus::Submitted, at(120));
        repo.record_submission(&again, &[])
            .await
            .expect("journal slot is free again");

        let statuses: Vec<SubmissionStatus> = repo
            .list_for_preprint(&preprint)
            .await
            .expect("list")
            .into_iter()
            .map(|s| s.status)
            .collect();
        assert_eq!(
            statuses,
            [SubmissionStatus::Cancelled, SubmissionStatus::Submitted]
        );
    });
}

#[rstest]
fn reconcile_without_url_keeps_the_stored_one(harness: Option<Harness>) {
    let Some(harness) = harness else {
        return;
    };
    let repo = &harness.submissions;

    harness.runtime.block_on(async {
        let record = submission(PreprintId::random(), "J1", SubmissionStatus::Draft, at(0));
        let original_url = record.submission_url.clone();
        repo.record_submission(&record, &[]).await.expect("record");

        let kept = repo
            .reconcile(&record.id, &reconciliation(SubmissionStatus::Submitted, None, at(30)))
            .await
            .expect("reconcile without url");
        assert_eq!(kept.status, SubmissionStatus::Submitted);
        assert_eq!(kept.submission_url, original_url);
        assert_eq!(kept.modified_at, at(30));
        assert_eq!(kept.created_at, at(0));

        let replaced = repo
            .reconcile(
                &record.id,
                &reconciliation(
                    SubmissionStatus::Accepted,
                    Some("https://chronos.example/s/moved"),
                    at(60),
                ),
            )
            .await
            .expect("reconcile with url");
        assert_eq!(
            replaced.submission_url.as_deref(),
            Some("https://chronos.example/s/moved")
        );
        assert_eq!(
            repo.find_by_id(&record.id).await.expect("find"),
            Some(replaced)
        );
    });
}

#[rstest]
fn reconciling_an_unknown_submission_reports_it_missing(harness: Option<Harness>) {
    let Some(harness) = harness else {
        return;
    };
    let id = SubmissionId::random();

    let error = harness
        .runtime
        .block_on(
            harness
                .submissions
                .reconcile(&id, &reconciliation(SubmissionStatus::Draft, None, at(0))),
        )
        .expect_err("unknown submission");

    assert_eq!(error, SubmissionRepositoryError::missing(id.to_string()));
}

#[rstest]
fn identities_are_mirrored_only_with_a_stored_submission(harness: Option<Harness>) {
    let Some(harness) = harness else {
        return;
    };
    let repo = &harness.submissions;
    let ada = UserId::random();
    let grace = UserId::random();
    let identity = |user_id: UserId, chronos: &str| ExternalIdentity {
        user_id,
        chronos_user_id: ChronosUserId::new(chronos).expect("chronos id"),
    };

    harness.runtime.block_on(async {
        let preprint = PreprintId::random();
        repo.record_submission(
            &submission(preprint, "J1", SubmissionStatus::Draft, at(0)),
            &[identity(ada, "CU-ADA")],
        )
        .await
        .expect("record");

        // The duplicate insert rolls back the identity written alongside it.
        repo.record_submission(
            &submission(preprint, "J1", SubmissionStatus::Draft, at(1)),
            &[identity(grace, "CU-GRACE"), identity(ada, "CU-ADA-2")],
        )
        .await
        .expect_err("duplicate");

        let known = repo.find_chronos_ids(&[ada, grace]).await.expect("lookup");
        assert_eq!(known.len(), 1);
        assert_eq!(known.get(&ada).map(ChronosUserId::as_str), Some("CU-ADA"));

        repo.record_submission(
            &submission(preprint, "J2", SubmissionStatus::Draft, at(2)),
            &[identity(ada, "CU-ADA-2")],
        )
        .await
        .expect("second journal");
        let refreshed = repo.find_chronos_ids(&[ada]).await.expect("lookup");
        assert_eq!(refreshed.get(&ada).map(ChronosUserId::as_str), Some("CU-ADA-2"));
    });
}

#[rstest]
fn refresh_claims_rotate_through_stale_submissions(harness: Option<Harness>) {
    let Some(harness) = harness else {
        return;
    };
    let repo = &harness.submissions;

    harness.runtime.block_on(async {
        let older = submission(PreprintId::random(), "J1", SubmissionStatus::Submitted, at(0));
        let newer = submission(PreprintId::random(), "J1", SubmissionStatus::Submitted, at(1));
        repo.record_submission(&older, &[]).await.expect("older");
        repo.record_submission(&newer, &[]).await.expect("newer");

        let now = at(900);
        let cutoff = at(600);
        let ids = |claimed: Vec<Submission>| -> Vec<SubmissionId> {
            claimed.into_iter().map(|s| s.id).collect()
        };

        let first = repo.claim_stale(cutoff, 1, now).await.expect("first claim");
        let second = repo.claim_stale(cutoff, 1, now).await.expect("second claim");
        let third = repo.claim_stale(cutoff, 1, now).await.expect("third claim");

        assert_eq!(ids(first), vec![older.id]);
        assert_eq!(ids(second), vec![newer.id]);
        assert!(third.is_empty());

        // Once the claims themselves are stale, both rows come back.
        let mut later = ids(
            repo.claim_stale(at(1_600), 10, at(1_900))
                .await
                .expect("later claim"),
        );
        let mut expected = vec![older.id, newer.id];
        later.sort_by_key(|id| *id.as_uuid());
        expected.sort_by_key(|id| *id.as_uuid());
        assert_eq!(later, expected);
    });
}
