//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories implement the Chronos domain ports over `diesel-async`
//! connections pooled with `bb8`. Row structs (`models.rs`) and table
//! definitions (`schema.rs`) stay internal; only domain types cross the
//! boundary, and every database failure is mapped onto a port error.
//!
//! # Example
//!
//! ```ignore
//! use chronos_sync::outbound::persistence::{DbPool, DieselJournalRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/chronos")).await?;
//! let journals = DieselJournalRepository::new(pool);
//! ```

pub(crate) mod diesel_helpers;
mod diesel_journal_repository;
mod diesel_submission_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_journal_repository::DieselJournalRepository;
pub use diesel_submission_repository::DieselSubmissionRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
