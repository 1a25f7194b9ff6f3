//! Download links built from storage node ids.

use url::Url;

use crate::domain::ports::{FileUrlError, FileUrlResolver};
use crate::domain::preprint::{FileNode, Preprint};

/// Resolves `{domain}/{file_id}/download` on the host's file server.
#[derive(Debug, Clone)]
pub struct GuidDownloadUrlResolver {
    domain: Url,
}

impl GuidDownloadUrlResolver {
    /// Resolver rooted at `domain`.
    pub fn new(domain: Url) -> Self {
        Self { domain }
    }
}

impl FileUrlResolver for GuidDownloadUrlResolver {
    fn download_url(&self, _preprint: &Preprint, file: &FileNode) -> Result<Url, FileUrlError> {
        let mut url = self.domain.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                FileUrlError::unresolvable(format!(
                    "download domain {} cannot carry paths",
                    self.domain
                ))
            })?;
            segments.pop_if_empty();
            segments.push(&file.id.to_string());
            segments.push("download");
        }
        Ok(url)
    }
}
