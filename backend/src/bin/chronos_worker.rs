//! Background worker keeping local Chronos mirrors current.
//!
//! On start the worker applies migrations and refreshes the journal
//! catalogue. It then sweeps stale submissions on a fixed interval, queueing
//! them for a consumer task that re-reads each one from Chronos. Ctrl-C
//! stops both loops.

use std::sync::Arc;

use async_trait::async_trait;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use chronos_sync::config::ChronosSettings;
use chronos_sync::domain::ports::{PreprintSource, PreprintSourceError, RefreshSubmissionsJob};
use chronos_sync::domain::{
    ChronosSubmissionPorts, ChronosSubmissionService, Preprint, PreprintId,
    SubmissionRefreshWorker,
};
use chronos_sync::outbound::chronos::ChronosHttpClient;
use chronos_sync::outbound::persistence::{
    DbPool, DieselJournalRepository, DieselSubmissionRepository, PoolConfig, run_migrations,
};
use chronos_sync::outbound::queue::{DEFAULT_QUEUE_CAPACITY, TokioRefreshQueue};

/// Host records are not reachable from the worker; refreshes only need
/// Chronos and the local mirror.
struct DetachedPreprintSource;

#[async_trait]
impl PreprintSource for DetachedPreprintSource {
    async fn find_preprint(
        &self,
        _id: &PreprintId,
    ) -> Result<Option<Preprint>, PreprintSourceError> {
        Err(PreprintSourceError::unavailable(
            "the refresh worker has no host preprint store",
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ChronosSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load Chronos settings: {err}"))?;
    let database_url = settings.database_url()?.to_owned();

    run_migrations(&database_url)
        .await
        .wrap_err("failed to migrate the Chronos tables")?;
    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .wrap_err("failed to connect to PostgreSQL")?;

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let gateway = ChronosHttpClient::new(settings.client_config()?, clock.clone())
        .wrap_err("failed to build the Chronos client")?;
    let submissions = Arc::new(DieselSubmissionRepository::new(pool.clone()));
    let (queue, receiver) = TokioRefreshQueue::bounded(DEFAULT_QUEUE_CAPACITY);

    let service = Arc::new(ChronosSubmissionService::new(
        ChronosSubmissionPorts {
            gateway: Arc::new(gateway),
            journals: Arc::new(DieselJournalRepository::new(pool)),
            submissions: submissions.clone(),
            identities: submissions,
            preprints: Arc::new(DetachedPreprintSource),
            refresh_queue: Arc::new(queue),
        },
        settings.serializer()?,
        clock,
        settings.service_config(),
    ));

    match service.sync_journals().await {
        Ok(report) => info!(
            fetched = report.fetched,
            upserted = report.upserted,
            "initial journal sync finished"
        ),
        Err(err) => warn!(code = ?err.code(), "initial journal sync failed: {err}"),
    }

    let consumer = spawn_consumer(SubmissionRefreshWorker::new(service.clone()), receiver);
    let mut ticker = tokio::time::interval(settings.refresh_interval());
    let batch_size = settings.refresh_batch_size();

    loop {
        tokio::select! {
            _ = ticker.tick() => sweep(&service, batch_size).await,
            signal = tokio::signal::ctrl_c() => {
                signal.wrap_err("failed to listen for ctrl-c")?;
                info!("shutdown requested");
                break;
            }
        }
    }

    // Refreshes are idempotent, so an interrupted job is picked up next run.
    consumer.abort();
    match consumer.await {
        Err(err) if err.is_panic() => Err(eyre!("refresh consumer panicked: {err}")),
        _ => Ok(()),
    }
}

async fn sweep(service: &ChronosSubmissionService, batch_size: usize) {
    match service.enqueue_stale(batch_size).await {
        Ok(0) => {}
        Ok(queued) => info!(queued, "queued stale chronos submissions"),
        Err(err) => error!(code = ?err.code(), "stale submission sweep failed: {err}"),
    }
}

fn spawn_consumer(
    worker: SubmissionRefreshWorker,
    mut receiver: Receiver<RefreshSubmissionsJob>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(job) = receiver.recv().await {
            worker.process(job).await;
        }
    })
}
