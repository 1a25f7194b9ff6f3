//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod chronos_gateway;
mod file_url_resolver;
mod journal_repository;
mod preprint_source;
mod refresh_queue;
mod submission_repository;
mod user_identity_repository;

#[cfg(test)]
pub use chronos_gateway::MockChronosGateway;
pub use chronos_gateway::{
    ChronosGateway, ChronosGatewayError, JournalEntry, ManuscriptSnapshot, SubmissionReceipt,
};
#[cfg(test)]
pub use file_url_resolver::MockFileUrlResolver;
pub use file_url_resolver::{FileUrlError, FileUrlResolver};
#[cfg(test)]
pub use journal_repository::MockJournalRepository;
pub use journal_repository::{JournalRepository, JournalRepositoryError};
#[cfg(test)]
pub use preprint_source::MockPreprintSource;
pub use preprint_source::{PreprintSource, PreprintSourceError};
#[cfg(test)]
pub use refresh_queue::MockSubmissionRefreshQueue;
pub use refresh_queue::{JobDispatchError, RefreshSubmissionsJob, SubmissionRefreshQueue};
#[cfg(test)]
pub use submission_repository::MockSubmissionRepository;
pub use submission_repository::{SubmissionRepository, SubmissionRepositoryError};
#[cfg(test)]
pub use user_identity_repository::MockUserIdentityRepository;
pub use user_identity_repository::{UserIdentityRepository, UserIdentityRepositoryError};
