//! `DieselJournalRepository` against embedded PostgreSQL.
//!
//! Set `SKIP_TEST_CLUSTER=1` where no cluster can start.

use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

use chronos_sync::domain::{Journal, JournalId};
use chronos_sync::domain::ports::JournalRepository;
use chronos_sync::outbound::persistence::{DbPool, DieselJournalRepository, PoolConfig};
use chronos_sync::test_support::fixtures::sample_journal;

mod support;

use support::handle_cluster_setup_failure;
use support::pg_embed::{provision_database, shared_cluster};

struct Harness {
    runtime: Runtime,
    journals: DieselJournalRepository,
    _database: TemporaryDatabase,
}

fn setup() -> Result<Harness, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let database = provision_database(cluster)?;
    let pool = runtime
        .block_on(DbPool::new(PoolConfig::new(database.url()).with_max_size(2)))
        .map_err(|err| err.to_string())?;

    Ok(Harness {
        runtime,
        journals: DieselJournalRepository::new(pool),
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

fn titles(journals: &[Journal]) -> Vec<&str> {
    journals.iter().map(|j| j.title.as_str()).collect()
}

#[rstest]
fn repeated_sync_keeps_one_row_per_journal(harness: Option<Harness>) {
    let Some(harness) = harness else {
        return;
    };
    let repo = &harness.journals;
    let catalogue = [
        sample_journal("J2", "Zeta Letters"),
        sample_journal("J1", "Alpha Reviews"),
    ];

    harness.runtime.block_on(async {
        assert_eq!(repo.upsert_journals(&catalogue).await.expect("first sync"), 2);
        assert_eq!(repo.upsert_journals(&catalogue).await.expect("second sync"), 2);

        let listed = repo.list().await.expect("list");
        assert_eq!(titles(&listed), ["Alpha Reviews", "Zeta Letters"]);
    });
}

#[rstest]
fn sync_overwrites_changed_entries(harness: Option<Harness>) {
    let Some(harness) = harness else {
        return;
    };
    let repo = &harness.journals;
    let id = JournalId::new("J1").expect("journal id");

    harness.runtime.block_on(async {
        repo.upsert_journals(&[sample_journal("J1", "Old Title")])
            .await
            .expect("first sync");
        let mut renamed = sample_journal("J1", "New Title");
        renamed.publisher_name = "Renamed Press".to_owned();
        repo.upsert_journals(&[renamed.clone()])
            .await
            .expect("second sync");

        assert_eq!(repo.find_by_id(&id).await.expect("find"), Some(renamed));
    });
}

#[rstest]
fn repeated_ids_in_one_batch_keep_the_last_copy(harness: Option<Harness>) {
    let Some(harness) = harness else {
        return;
    };
    let repo = &harness.journals;

    harness.runtime.block_on(async {
        let written = repo
            .upsert_journals(&[
                sample_journal("J1", "First Copy"),
                sample_journal("J1", "Last Copy"),
            ])
            .await
            .expect("sync");

        assert_eq!(written, 1);
        assert_eq!(titles(&repo.list().await.expect("list")), ["Last Copy"]);
    });
}

#[rstest]
fn empty_catalogue_writes_nothing(harness: Option<Harness>) {
    let Some(harness) = harness else {
        return;
    };
    let repo = &harness.journals;

    harness.runtime.block_on(async {
        assert_eq!(repo.upsert_journals(&[]).await.expect("sync"), 0);
        assert!(repo.list().await.expect("list").is_empty());
        assert_eq!(
            repo.find_by_id(&JournalId::new("J404").expect("journal id"))
                .await
                .expect("find"),
            None
        );
    });
}
