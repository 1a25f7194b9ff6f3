//! PostgreSQL-backed journal catalogue.

use std::collections::BTreeMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ids::JournalId;
use crate::domain::journal::Journal;
use crate::domain::ports::{JournalRepository, JournalRepositoryError};

use super::diesel_helpers::{DieselFailure, classify_diesel_error};
use super::models::{JournalRow, NewJournalRow};
use super::pool::{DbPool, PoolError};
use super::schema::chronos_journals;

/// Rows per `INSERT`, well below PostgreSQL's bind parameter limit.
const UPSERT_CHUNK: usize = 1_000;

/// Diesel-backed implementation of the `JournalRepository` port.
#[derive(Clone)]
pub struct DieselJournalRepository {
    pool: DbPool,
}

impl DieselJournalRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> JournalRepositoryError {
    JournalRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error, operation: &str) -> JournalRepositoryError {
    match classify_diesel_error(error, operation) {
        DieselFailure::Connection(message) => JournalRepositoryError::connection(message),
        DieselFailure::UniqueViolation { message, .. } | DieselFailure::Query(message) => {
            JournalRepositoryError::query(message)
        }
    }
}

fn row_to_journal(row: JournalRow) -> Result<Journal, JournalRepositoryError> {
    let journal_id = JournalId::new(row.journal_id)
        .map_err(|err| JournalRepositoryError::query(format!("stored journal id: {err}")))?;
    Ok(Journal {
        journal_id,
        title: row.title,
        publisher_name: row.publisher_name,
        raw_response: row.raw_response,
    })
}

#[async_trait]
impl JournalRepository for DieselJournalRepository {
    async fn upsert_journals(&self, journals: &[Journal]) -> Result<usize, JournalRepositoryError> {
        // Chronos occasionally repeats an entry; the last copy wins.
        let unique: BTreeMap<&str, &Journal> = journals
            .iter()
            .map(|journal| (journal.journal_id.as_str(), journal))
            .collect();
        if unique.is_empty() {
            return Ok(0);
        }
        let rows: Vec<NewJournalRow<'_>> = unique
            .values()
            .map(|journal| NewJournalRow {
                journal_id: journal.journal_id.as_str(),
                title: journal.title.as_str(),
                publisher_name: journal.publisher_name.as_str(),
                raw_response: &journal.raw_response,
            })
            .collect();

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let mut written = 0;
                for chunk in rows.chunks(UPSERT_CHUNK) {
                    written += diesel::insert_into(chronos_journals::table)
                        .values(chunk)
                        .on_conflict(chronos_journals::journal_id)
                        .do_update()
                        .set((
                            chronos_journals::title.eq(excluded(chronos_journals::title)),
                            chronos_journals::publisher_name
                                .eq(excluded(chronos_journals::publisher_name)),
                            chronos_journals::raw_response
                                .eq(excluded(chronos_journals::raw_response)),
                            chronos_journals::updated_at.eq(diesel::dsl::now),
                        ))
                        .execute(conn)
                        .await?;
                }
                Ok(written)
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_diesel_error(err, "upsert journals"))
    }

    async fn find_by_id(
        &self,
        journal_id: &JournalId,
    ) -> Result<Option<Journal>, JournalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<JournalRow> = chronos_journals::table
            .filter(chronos_journals::journal_id.eq(journal_id.as_str()))
            .select(JournalRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "find journal"))?;
        row.map(row_to_journal).transpose()
    }

    async fn list(&self) -> Result<Vec<Journal>, JournalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<JournalRow> = chronos_journals::table
            .select(JournalRow::as_select())
            .order_by((chronos_journals::title.asc(), chronos_journals::journal_id.asc()))
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "list journals"))?;
        rows.into_iter().map(row_to_journal).collect()
    }
}
