//! Internal Diesel row structs for the Chronos tables.
//!
//! These types never leave the persistence layer; repositories convert them
//! into domain records.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use super::schema::{chronos_journals, chronos_submissions, chronos_user_identities};

/// Row struct for reading from the chronos_journals table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = chronos_journals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct JournalRow {
    pub journal_id: String,
    pub title: String,
    pub publisher_name: String,
    pub raw_response: Value,
}

/// Insertable struct for upserting catalogue entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = chronos_journals)]
pub(crate) struct NewJournalRow<'a> {
    pub journal_id: &'a str,
    pub title: &'a str,
    pub publisher_name: &'a str,
    pub raw_response: &'a Value,
}

/// Row struct for reading from the chronos_submissions table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = chronos_submissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SubmissionRow {
    pub id: Uuid,
    pub journal_id: String,
    pub preprint_id: Uuid,
    pub submitter_id: Uuid,
    pub publication_id: String,
    pub status: i32,
    pub submission_url: Option<String>,
    pub raw_response: Value,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Insertable struct for new submissions.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = chronos_submissions)]
pub(crate) struct NewSubmissionRow<'a> {
    pub id: Uuid,
    pub journal_id: &'a str,
    pub preprint_id: Uuid,
    pub submitter_id: Uuid,
    pub publication_id: &'a str,
    pub status: i32,
    pub submission_url: Option<&'a str>,
    pub raw_response: &'a Value,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub last_refresh_at: DateTime<Utc>,
}

/// Changeset written after reading a manuscript back from Chronos.
///
/// A `None` URL is skipped by Diesel, leaving the stored value in place.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = chronos_submissions)]
pub(crate) struct SubmissionReconcileUpdate<'a> {
    pub status: i32,
    pub submission_url: Option<&'a str>,
    pub raw_response: &'a Value,
    pub modified_at: DateTime<Utc>,
    pub last_refresh_at: DateTime<Utc>,
}

/// Insertable struct for mirrored identities.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = chronos_user_identities)]
pub(crate) struct NewUserIdentityRow<'a> {
    pub user_id: Uuid,
    pub chronos_user_id: &'a str,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for reading mirrored identities.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = chronos_user_identities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserIdentityRow {
    pub user_id: Uuid,
    pub chronos_user_id: String,
}
