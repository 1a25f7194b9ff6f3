//! Diesel table definitions for the Chronos tables.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate
//! with `diesel print-schema` or update by hand when a migration changes.

diesel::table! {
    /// Journal catalogue mirrored from Chronos.
    chronos_journals (journal_id) {
        /// Chronos journal key.
        journal_id -> Text,
        /// Journal title.
        title -> Text,
        /// Publisher name, empty when Chronos omits it.
        publisher_name -> Text,
        /// Catalogue entry as received.
        raw_response -> Jsonb,
        /// First sync that saw the journal.
        created_at -> Timestamptz,
        /// Last sync that wrote the journal.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Manuscripts submitted to Chronos journals.
    ///
    /// Partial unique indexes allow one non-cancelled row per
    /// (preprint, journal) and one active row per preprint.
    chronos_submissions (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Target journal.
        journal_id -> Text,
        /// Host preprint id.
        preprint_id -> Uuid,
        /// Host user who submitted.
        submitter_id -> Uuid,
        /// Chronos publication id.
        publication_id -> Text,
        /// Chronos status code.
        status -> Int4,
        /// Chronos submission page.
        submission_url -> Nullable<Text>,
        /// Latest manuscript payload.
        raw_response -> Jsonb,
        /// Insert timestamp.
        created_at -> Timestamptz,
        /// Last reconciliation timestamp.
        modified_at -> Timestamptz,
        /// Last reconciliation or refresh claim.
        last_refresh_at -> Timestamptz,
    }
}

diesel::table! {
    /// Chronos user ids learned for host users.
    chronos_user_identities (user_id) {
        /// Host user id.
        user_id -> Uuid,
        /// Chronos user id.
        chronos_user_id -> Text,
        /// Last time the id was written.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(chronos_submissions -> chronos_journals (journal_id));

diesel::allow_tables_to_appear_in_same_query!(
    chronos_journals,
    chronos_submissions,
    chronos_user_identities,
);
