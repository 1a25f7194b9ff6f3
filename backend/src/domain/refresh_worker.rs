//! Consumer side of the submission refresh queue.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::ports::RefreshSubmissionsJob;
use crate::domain::submission_service::ChronosSubmissionService;

/// Counts from processing one refresh job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshOutcome {
    /// Submissions reconciled with Chronos.
    pub synced: usize,
    /// Submissions whose refresh failed.
    pub failed: usize,
}

/// Re-reads queued submissions from Chronos.
#[derive(Clone)]
pub struct SubmissionRefreshWorker {
    service: Arc<ChronosSubmissionService>,
}

impl SubmissionRefreshWorker {
    /// Worker delegating to `service`.
    pub fn new(service: Arc<ChronosSubmissionService>) -> Self {
        Self { service }
    }

    /// Sync every submission in `job`, in order.
    ///
    /// A failing submission is logged and counted; the remaining ids are
    /// still processed.
    pub async fn process(&self, job: RefreshSubmissionsJob) -> RefreshOutcome {
        let mut outcome = RefreshOutcome::default();
        for submission_id in job.submission_ids {
            match self.service.sync_manuscript(&submission_id).await {
                Ok(_) => outcome.synced += 1,
                Err(error) => {
                    outcome.failed += 1;
                    warn!(
                        %submission_id,
                        code = ?error.code(),
                        "chronos submission refresh failed: {error}"
                    );
                }
            }
        }
        info!(
            synced = outcome.synced,
            failed = outcome.failed,
            "processed chronos refresh job"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::domain::ids::{JournalId, PreprintId, PublicationId, SubmissionId, UserId};
    use crate::domain::manuscript::ManuscriptSerializer;
    use crate::domain::ports::{ChronosGatewayError, ManuscriptSnapshot, MockFileUrlResolver};
    use crate::domain::submission::{Submission, SubmissionStatus};
    use crate::domain::submission_service::{ChronosSubmissionConfig, ChronosSubmissionPorts};
    use crate::test_support::clock::MutableClock;
    use crate::test_support::gateway::ScriptedChronosGateway;
    use crate::test_support::in_memory::{
        InMemoryJournalRepository, InMemoryPreprintSource, InMemorySubmissionRepository,
        RecordingRefreshQueue,
    };

    fn stored(publication_id: &str) -> Submission {
        let at = Utc
            .with_ymd_and_hms(2026, 2, 1, 9, 0, 0)
            .single()
            .expect("instant");
        Submission {
            id: SubmissionId::random(),
            journal_id: JournalId::new("J1").expect("journal id"),
            preprint_id: PreprintId::random(),
            submitter_id: UserId::random(),
            publication_id: PublicationId::new(publication_id).expect("publication id"),
            status: SubmissionStatus::Submitted,
            submission_url: None,
            raw_response: json!({}),
            created_at: at,
            modified_at: at,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn failures_do_not_stop_the_batch() {
        let gateway = Arc::new(ScriptedChronosGateway::default());
        let submissions = Arc::new(InMemorySubmissionRepository::default());
        let first = stored("PUB-1");
        let second = stored("PUB-2");
        submissions.insert(first.clone());
        submissions.insert(second.clone());
        gateway.push_manuscript(Err(ChronosGatewayError::timeout("30s")));
        gateway.push_manuscript(Ok(ManuscriptSnapshot {
            status: SubmissionStatus::Accepted,
            submission_url: None,
            raw: json!({ "STATUS_CODE": 3 }),
        }));
        let service = ChronosSubmissionService::new(
            ChronosSubmissionPorts {
                gateway: gateway.clone(),
                journals: Arc::new(InMemoryJournalRepository::default()),
                submissions: submissions.clone(),
                identities: submissions.clone(),
                preprints: Arc::new(InMemoryPreprintSource::default()),
                refresh_queue: Arc::new(RecordingRefreshQueue::default()),
            },
            ManuscriptSerializer::new(Arc::new(MockFileUrlResolver::new())),
            Arc::new(MutableClock::new(Utc::now())),
            ChronosSubmissionConfig::default(),
        );
        let worker = SubmissionRefreshWorker::new(Arc::new(service));

        let outcome = worker
            .process(RefreshSubmissionsJob {
                submission_ids: vec![first.id, SubmissionId::random(), second.id],
            })
            .await;

        assert_eq!(outcome, RefreshOutcome { synced: 1, failed: 2 });
        let statuses: Vec<SubmissionStatus> =
            submissions.all().into_iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            [SubmissionStatus::Submitted, SubmissionStatus::Accepted]
        );
        assert_eq!(gateway.fetched().len(), 2);
    }
}
