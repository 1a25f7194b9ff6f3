//! Driven port producing public download links for preprint files.

use url::Url;

use super::define_port_error;
use crate::domain::preprint::{FileNode, Preprint};

define_port_error! {
    /// Errors raised while resolving a download link.
    pub enum FileUrlError {
        /// No public link can be produced for the file.
        Unresolvable { message: String } =>
            "file download url unresolvable: {message}",
    }
}

/// Resolves a URL Chronos can fetch the file from without credentials.
#[cfg_attr(test, mockall::automock)]
pub trait FileUrlResolver: Send + Sync {
    /// Public download URL for `file`, a file of `preprint`.
    fn download_url(&self, preprint: &Preprint, file: &FileNode) -> Result<Url, FileUrlError>;
}
