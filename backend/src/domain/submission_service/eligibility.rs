//! Fast-fail submission rules checked before any remote call.
//!
//! The persistence layer enforces the same uniqueness rules with partial
//! unique indexes; these checks only avoid a pointless round trip to Chronos.

use serde_json::json;

use crate::domain::Error;
use crate::domain::ids::JournalId;
use crate::domain::preprint::Preprint;
use crate::domain::submission::Submission;

/// Machine code for a second submission to the same journal.
pub const DUPLICATE_JOURNAL_SUBMISSION: &str = "duplicate_journal_submission";
/// Machine code for a preprint already under consideration elsewhere.
pub const ACTIVE_SUBMISSION_EXISTS: &str = "active_submission_exists";
/// Machine code for a preprint moderators have not accepted.
pub const PREPRINT_NOT_ACCEPTED: &str = "preprint_not_accepted";

/// Apply the rules in order and report the first violation.
pub(super) fn check_eligibility(
    journal_id: &JournalId,
    preprint: &Preprint,
    existing: &[Submission],
) -> Result<(), Error> {
    if existing
        .iter()
        .any(|s| s.journal_id == *journal_id && !s.status.is_terminal())
    {
        return Err(ineligible(
            DUPLICATE_JOURNAL_SUBMISSION,
            format!("preprint {} was already submitted to {journal_id}", preprint.id),
            journal_id,
            preprint,
        ));
    }

    if let Some(active) = existing.iter().find(|s| s.status.is_active()) {
        return Err(ineligible(
            ACTIVE_SUBMISSION_EXISTS,
            format!(
                "preprint {} is already under consideration by {}",
                preprint.id, active.journal_id
            ),
            journal_id,
            preprint,
        ));
    }

    if !preprint.is_accepted() {
        return Err(ineligible(
            PREPRINT_NOT_ACCEPTED,
            format!(
                "preprint {} is {} and cannot be submitted",
                preprint.id,
                preprint.moderation_state.as_str()
            ),
            journal_id,
            preprint,
        ));
    }

    Ok(())
}

fn ineligible(code: &str, message: String, journal_id: &JournalId, preprint: &Preprint) -> Error {
    Error::conflict(message).with_details(json!({
        "code": code,
        "preprintId": preprint.id,
        "journalId": journal_id,
    }))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ids::{PublicationId, SubmissionId, UserId};
    use crate::domain::preprint::ModerationState;
    use crate::domain::submission::SubmissionStatus;
    use crate::test_support::fixtures::{sample_preprint, sample_user};

    fn journal(id: &str) -> JournalId {
        JournalId::new(id).expect("journal id")
    }

    fn existing(preprint: &Preprint, journal_id: &str, status: SubmissionStatus) -> Submission {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("instant");
        Submission {
            id: SubmissionId::random(),
            journal_id: journal(journal_id),
            preprint_id: preprint.id,
            submitter_id: UserId::random(),
            publication_id: PublicationId::new("PUB-1").expect("publication id"),
            status,
            submission_url: None,
            raw_response: json!({}),
            created_at: at,
            modified_at: at,
        }
    }

    fn rejection_code(result: Result<(), Error>) -> String {
        let err = result.expect_err("ineligible");
        assert_eq!(err.code(), ErrorCode::Conflict);
        err.details()
            .and_then(|d| d.get("code"))
            .and_then(|c| c.as_str())
            .expect("details code")
            .to_owned()
    }

    #[rstest]
    fn accepted_preprint_without_history_is_eligible() {
        let preprint = sample_preprint(&[sample_user("Ada")]);
        assert!(check_eligibility(&journal("J1"), &preprint, &[]).is_ok());
    }

    #[rstest]
    #[case(SubmissionStatus::Draft)]
    #[case(SubmissionStatus::Submitted)]
    #[case(SubmissionStatus::Unknown(7))]
    fn same_journal_is_rejected(#[case] status: SubmissionStatus) {
        let preprint = sample_preprint(&[sample_user("Ada")]);
        let history = [existing(&preprint, "J1", status)];

        let code = rejection_code(check_eligibility(&journal("J1"), &preprint, &history));
        assert_eq!(code, DUPLICATE_JOURNAL_SUBMISSION);
    }

    #[rstest]
    fn cancelled_submission_frees_the_journal() {
        let preprint = sample_preprint(&[sample_user("Ada")]);
        let history = [existing(&preprint, "J1", SubmissionStatus::Cancelled)];

        assert!(check_eligibility(&journal("J1"), &preprint, &history).is_ok());
    }

    #[rstest]
    #[case(SubmissionStatus::Submitted)]
    #[case(SubmissionStatus::Accepted)]
    #[case(SubmissionStatus::Published)]
    fn active_submission_elsewhere_is_rejected(#[case] status: SubmissionStatus) {
        let preprint = sample_preprint(&[sample_user("Ada")]);
        let history = [existing(&preprint, "J2", status)];

        let code = rejection_code(check_eligibility(&journal("J1"), &preprint, &history));
        assert_eq!(code, ACTIVE_SUBMISSION_EXISTS);
    }

    #[rstest]
    fn draft_elsewhere_does_not_block() {
        let preprint = sample_preprint(&[sample_user("Ada")]);
        let history = [existing(&preprint, "J2", SubmissionStatus::Draft)];

        assert!(check_eligibility(&journal("J1"), &preprint, &history).is_ok());
    }

    #[rstest]
    #[case(ModerationState::Initial)]
    #[case(ModerationState::Pending)]
    #[case(ModerationState::Rejected)]
    #[case(ModerationState::Withdrawn)]
    fn unaccepted_preprint_is_rejected(#[case] state: ModerationState) {
        let mut preprint = sample_preprint(&[sample_user("Ada")]);
        preprint.moderation_state = state;

        let code = rejection_code(check_eligibility(&journal("J1"), &preprint, &[]));
        assert_eq!(code, PREPRINT_NOT_ACCEPTED);
    }

    #[rstest]
    fn duplicate_journal_wins_over_later_rules() {
        let mut preprint = sample_preprint(&[sample_user("Ada")]);
        preprint.moderation_state = ModerationState::Pending;
        let history = [existing(&preprint, "J1", SubmissionStatus::Accepted)];

        let code = rejection_code(check_eligibility(&journal("J1"), &preprint, &history));
        assert_eq!(code, DUPLICATE_JOURNAL_SUBMISSION);
    }
}
