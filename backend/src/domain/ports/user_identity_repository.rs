//! Driven port for cached Chronos user ids.

use std::collections::HashMap;

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::ids::{ChronosUserId, UserId};

define_port_error! {
    /// Errors raised while reading mirrored identities.
    pub enum UserIdentityRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "user identity repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "user identity repository query failed: {message}",
    }
}

/// Port for looking up the Chronos ids already learned for local users.
///
/// Writes happen inside [`super::SubmissionRepository::record_submission`]
/// so they share the submission's transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserIdentityRepository: Send + Sync {
    /// Return the known Chronos id for each of `user_ids` that has one.
    async fn find_chronos_ids(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, ChronosUserId>, UserIdentityRepositoryError>;
}
