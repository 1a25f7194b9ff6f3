//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **chronos**: partner API client over `reqwest`
//! - **file_urls**: public download links for host files
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **queue**: in-process refresh queue on a bounded Tokio channel
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod chronos;
pub mod file_urls;
pub mod persistence;
pub mod queue;
