//! Chronos journal catalogue entries.

use serde_json::Value;

use super::ids::JournalId;

/// A publication venue reachable through Chronos.
///
/// Journals change only through a full catalogue sync; `raw_response` keeps
/// the upstream payload verbatim for fields this crate does not model.
#[derive(Debug, Clone, PartialEq)]
pub struct Journal {
    /// Chronos journal key.
    pub journal_id: JournalId,
    /// Journal title.
    pub title: String,
    /// Publisher name.
    pub publisher_name: String,
    /// Upstream catalogue entry.
    pub raw_response: Value,
}

/// Summary of one catalogue sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JournalSyncReport {
    /// Entries received from Chronos.
    pub fetched: usize,
    /// Rows inserted or updated locally.
    pub upserted: usize,
}
