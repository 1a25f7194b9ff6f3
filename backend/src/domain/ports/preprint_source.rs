//! Driven port onto the host platform's preprint records.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::ids::PreprintId;
use crate::domain::preprint::Preprint;

define_port_error! {
    /// Errors raised while reading host records.
    pub enum PreprintSourceError {
        /// The host store could not be reached.
        Unavailable { message: String } =>
            "preprint source unavailable: {message}",
        /// A stored record could not be mapped into the read model.
        Invalid { message: String } =>
            "preprint record invalid: {message}",
    }
}

/// Port implemented by the host application.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreprintSource: Send + Sync {
    /// Load a preprint with its contributors and primary file.
    async fn find_preprint(&self, id: &PreprintId)
    -> Result<Option<Preprint>, PreprintSourceError>;
}
