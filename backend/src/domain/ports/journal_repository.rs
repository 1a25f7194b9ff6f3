//! Driven port for the local journal catalogue.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::ids::JournalId;
use crate::domain::journal::Journal;

define_port_error! {
    /// Persistence errors raised by journal repository adapters.
    pub enum JournalRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "journal repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "journal repository query failed: {message}",
    }
}

/// Port for reading and upserting journals keyed by their Chronos id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JournalRepository: Send + Sync {
    /// Insert or update every journal, keyed by `journal_id`.
    ///
    /// Returns the number of rows written. Re-running with the same input
    /// leaves exactly one row per journal.
    async fn upsert_journals(&self, journals: &[Journal]) -> Result<usize, JournalRepositoryError>;

    /// Look up one journal.
    async fn find_by_id(&self, journal_id: &JournalId)
    -> Result<Option<Journal>, JournalRepositoryError>;

    /// List the catalogue ordered by title.
    async fn list(&self) -> Result<Vec<Journal>, JournalRepositoryError>;
}
