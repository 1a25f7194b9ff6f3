//! End-to-end submission scenario against in-memory adapters.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};
use serde_json::json;
use url::Url;

use chronos_sync::domain::ports::{JournalEntry, ManuscriptSnapshot, SubmissionReceipt};
use chronos_sync::domain::submission_service::ACTIVE_SUBMISSION_EXISTS;
use chronos_sync::domain::{
    ChronosSubmissionConfig, ChronosSubmissionPorts, ChronosSubmissionService, ChronosUserId,
    ErrorCode, JournalId, ManuscriptSerializer, PublicationId, SubmissionRefreshWorker,
    SubmissionStatus,
};
use chronos_sync::outbound::file_urls::GuidDownloadUrlResolver;
use chronos_sync::test_support::clock::MutableClock;
use chronos_sync::test_support::fixtures::{sample_preprint, sample_user};
use chronos_sync::test_support::gateway::ScriptedChronosGateway;
use chronos_sync::test_support::in_memory::{
    InMemoryJournalRepository, InMemoryPreprintSource, InMemorySubmissionRepository,
    RecordingRefreshQueue,
};

fn started_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .expect("start instant")
}

fn chronos(id: &str) -> ChronosUserId {
    ChronosUserId::new(id).expect("chronos id")
}

fn entry(id: &str, title: &str) -> JournalEntry {
    JournalEntry {
        journal_id: JournalId::new(id).expect("journal id"),
        title: title.to_owned(),
        publisher_name: "Open Press".to_owned(),
        raw: json!({ "JOURNAL_ID": id, "TITLE": title }),
    }
}

struct World {
    gateway: Arc<ScriptedChronosGateway>,
    journals: Arc<InMemoryJournalRepository>,
    submissions: Arc<InMemorySubmissionRepository>,
    preprints: Arc<InMemoryPreprintSource>,
    queue: Arc<RecordingRefreshQueue>,
    clock: Arc<MutableClock>,
    service: Arc<ChronosSubmissionService>,
}

impl World {
    fn clock_now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }
}

#[fixture]
fn world() -> World {
    let gateway = Arc::new(ScriptedChronosGateway::default());
    let journals = Arc::new(InMemoryJournalRepository::default());
    let submissions = Arc::new(InMemorySubmissionRepository::default());
    let preprints = Arc::new(InMemoryPreprintSource::default());
    let queue = Arc::new(RecordingRefreshQueue::default());
    let clock = Arc::new(MutableClock::new(started_at()));
    let resolver = GuidDownloadUrlResolver::new(
        Url::parse("https://files.example.org/").expect("download domain"),
    );

    let service = Arc::new(ChronosSubmissionService::new(
        ChronosSubmissionPorts {
            gateway: gateway.clone(),
            journals: journals.clone(),
            submissions: submissions.clone(),
            identities: submissions.clone(),
            preprints: preprints.clone(),
            refresh_queue: queue.clone(),
        },
        ManuscriptSerializer::new(Arc::new(resolver)),
        clock.clone(),
        ChronosSubmissionConfig::default(),
    ));

    World {
        gateway,
        journals,
        submissions,
        preprints,
        queue,
        clock,
        service,
    }
}

#[rstest]
#[tokio::test]
async fn journal_sync_is_idempotent(world: World) {
    for _ in 0..2 {
        world.gateway.push_journals(Ok(vec![
            entry("J2", "Zeta Letters"),
            entry("J1", "Alpha Reviews"),
        ]));
        let report = world.service.sync_journals().await.expect("sync");
        assert_eq!(report.fetched, 2);
    }

    let listed = world.service.list_journals().await.expect("list");

    assert_eq!(world.journals.len(), 2);
    let titles: Vec<&str> = listed.iter().map(|j| j.title.as_str()).collect();
    assert_eq!(titles, ["Alpha Reviews", "Zeta Letters"]);
}

#[rstest]
#[tokio::test]
async fn submission_lifecycle(world: World) {
    world.gateway.push_journals(Ok(vec![
        entry("J1", "Alpha Reviews"),
        entry("J2", "Zeta Letters"),
        entry("J3", "Omega Notes"),
    ]));
    world.service.sync_journals().await.expect("catalogue");

    let ada = sample_user("Ada");
    let grace = sample_user("Grace");
    let preprint = sample_preprint(&[ada.clone(), grace.clone()]);
    world.preprints.insert_preprint(preprint.clone());

    // First submission: Chronos assigns ids to the submitter and both authors.
    world.gateway.push_receipt(Ok(SubmissionReceipt {
        publication_id: PublicationId::new("PUB-1").expect("publication id"),
        status: SubmissionStatus::Draft,
        submission_url: Some("https://chronos.example/s/PUB-1".to_owned()),
        submitter_chronos_id: Some(chronos("CU-ADA")),
        author_chronos_ids: vec![Some(chronos("CU-ADA")), Some(chronos("CU-GRACE"))],
        raw: json!({ "PUBLICATION_ID": "PUB-1" }),
    }));
    let first = world
        .service
        .submit_manuscript(&JournalId::new("J1").expect("journal"), &preprint, &ada)
        .await
        .expect("first submission");

    assert_eq!(first.status, SubmissionStatus::Draft);
    assert_eq!(world.submissions.chronos_id_for(&ada.id), Some(chronos("CU-ADA")));
    assert_eq!(
        world.submissions.chronos_id_for(&grace.id),
        Some(chronos("CU-GRACE"))
    );
    let sent = world.gateway.submitted();
    assert_eq!(sent[0].manuscript.authors.len(), 2);
    assert_eq!(
        sent[0].manuscript.manuscript_files[0].file_download_url,
        format!(
            "https://files.example.org/{}/download",
            preprint.primary_file.as_ref().expect("primary file").id
        )
    );

    // A draft does not block another journal; learned ids are now sent.
    world.gateway.push_receipt(Ok(SubmissionReceipt {
        publication_id: PublicationId::new("PUB-2").expect("publication id"),
        status: SubmissionStatus::Draft,
        submission_url: None,
        submitter_chronos_id: None,
        author_chronos_ids: Vec::new(),
        raw: json!({ "PUBLICATION_ID": "PUB-2" }),
    }));
    world
        .service
        .submit_manuscript(&JournalId::new("J2").expect("journal"), &preprint, &ada)
        .await
        .expect("second submission");
    let resent = &world.gateway.submitted()[1];
    assert_eq!(resent.user.chronos_user_id.as_deref(), Some("CU-ADA"));
    assert_eq!(
        resent.manuscript.authors[1].user.chronos_user_id.as_deref(),
        Some("CU-GRACE")
    );

    // Chronos moves the first submission on; an empty URL keeps ours.
    world.clock.advance(Duration::from_secs(30));
    world.gateway.push_manuscript(Ok(ManuscriptSnapshot {
        status: SubmissionStatus::Submitted,
        submission_url: None,
        raw: json!({ "STATUS_CODE": 2 }),
    }));
    let synced = world
        .service
        .sync_manuscript(&first.id)
        .await
        .expect("sync");
    assert_eq!(synced.status, SubmissionStatus::Submitted);
    assert_eq!(
        synced.submission_url.as_deref(),
        Some("https://chronos.example/s/PUB-1")
    );
    assert_eq!(synced.modified_at, world.clock_now());

    // An active submission now blocks every other journal.
    let blocked = world
        .service
        .submit_manuscript(&JournalId::new("J3").expect("journal"), &preprint, &ada)
        .await
        .expect_err("active submission blocks");
    assert_eq!(blocked.code(), ErrorCode::Conflict);
    assert_eq!(
        blocked.details().and_then(|d| d.get("code")),
        Some(&json!(ACTIVE_SUBMISSION_EXISTS))
    );
    assert_eq!(world.gateway.submitted().len(), 2);

    // Update re-sends the manuscript for the existing publication.
    world.gateway.push_update(Ok(ManuscriptSnapshot {
        status: SubmissionStatus::Accepted,
        submission_url: Some("https://chronos.example/s/PUB-1/v2".to_owned()),
        raw: json!({ "STATUS_CODE": 3 }),
    }));
    let updated = world
        .service
        .update_manuscript(&first.id)
        .await
        .expect("update");
    assert_eq!(updated.status, SubmissionStatus::Accepted);
    assert_eq!(
        world.gateway.updated()[0].publication_id.as_str(),
        "PUB-1"
    );

    // Once stale, both submissions are queued and the worker refreshes them.
    world.clock.advance(Duration::from_secs(600));
    let queued = world
        .service
        .refresh_stale_submissions(&preprint.id)
        .await
        .expect("refresh");
    assert_eq!(queued, 2);

    for status in [SubmissionStatus::Published, SubmissionStatus::Draft] {
        world.gateway.push_manuscript(Ok(ManuscriptSnapshot {
            status,
            submission_url: None,
            raw: json!({ "STATUS_CODE": status.code() }),
        }));
    }
    let worker = SubmissionRefreshWorker::new(world.service.clone());
    let job = world.queue.jobs().remove(0);
    let outcome = worker.process(job).await;

    assert_eq!(outcome.synced, 2);
    assert_eq!(outcome.failed, 0);
    let stored = world
        .service
        .list_submissions(&preprint.id)
        .await
        .expect("list");
    assert!(stored.iter().all(|s| s.modified_at == world.clock_now()));
}
